//! # Bootstrap 模块
//!
//! 页面级入口：持有页面上全部 logo 实例的引擎。
//!
//! 一个实例初始化失败只记录警告并跳过，不影响其他实例。

use tracing::{info, warn};

use crate::animation::TweenEngine;
use crate::config::{InstanceConfig, PageConfig};
use crate::dom::Dom;
use crate::engine::CollisionEngine;
use crate::error::EngineError;
use crate::journal::Journal;
use crate::splitter::TextSplitter;

/// 初始化失败的实例
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceFailure {
    pub instance: String,
    pub error: EngineError,
}

/// 页面引导器
#[derive(Debug, Default)]
pub struct Bootstrap {
    engines: Vec<CollisionEngine>,
    failures: Vec<InstanceFailure>,
}

impl Bootstrap {
    /// 为每个实例创建引擎
    ///
    /// `splitter` 为每个实例创建各自的拆字模块。
    pub fn start(
        page: PageConfig,
        dom: &mut dyn Dom,
        scroll_y: f32,
        mut splitter: impl FnMut(&InstanceConfig) -> Box<dyn TextSplitter>,
    ) -> Self {
        let mut bootstrap = Self::default();

        for (n, mut config) in page.instances.into_iter().enumerate() {
            if config.id.trim().is_empty() {
                config.id = format!("logo-{}", n + 1);
            }
            let instance = config.id.clone();
            let text_splitter = splitter(&config);

            match CollisionEngine::init(
                config,
                &mut *dom,
                scroll_y,
                Box::new(TweenEngine::new()),
                text_splitter,
            ) {
                Ok(engine) => bootstrap.engines.push(engine),
                Err(error) => {
                    warn!(instance = %instance, error = %error, "实例初始化失败，已跳过");
                    bootstrap.failures.push(InstanceFailure { instance, error });
                }
            }
        }

        info!(
            engines = bootstrap.engines.len(),
            failures = bootstrap.failures.len(),
            "页面引导完成"
        );
        bootstrap
    }

    pub fn engines(&self) -> &[CollisionEngine] {
        &self.engines
    }

    /// 按实例标识查找
    pub fn engine(&self, id: &str) -> Option<&CollisionEngine> {
        self.engines.iter().find(|e| e.id() == id)
    }

    pub fn engine_mut(&mut self, id: &str) -> Option<&mut CollisionEngine> {
        self.engines.iter_mut().find(|e| e.id() == id)
    }

    pub fn failures(&self) -> &[InstanceFailure] {
        &self.failures
    }

    pub fn on_scroll(&mut self, dom: &mut dyn Dom, scroll_y: f32) {
        for engine in &mut self.engines {
            engine.on_scroll(dom, scroll_y);
        }
    }

    pub fn advance(&mut self, dom: &mut dyn Dom, dt_ms: f32) {
        for engine in &mut self.engines {
            engine.advance(dom, dt_ms);
        }
    }

    pub fn refresh(&mut self, dom: &mut dyn Dom) {
        for engine in &mut self.engines {
            engine.refresh(dom);
        }
    }

    /// 卸载全部实例，返回各实例的记录
    pub fn teardown(self, dom: &mut dyn Dom) -> Vec<(String, Journal)> {
        self.engines
            .into_iter()
            .map(|engine| {
                let id = engine.id().to_string();
                (id, engine.teardown(&mut *dom))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{MemoryDom, NodeSpec};
    use crate::splitter::CharSplitter;

    fn page() -> MemoryDom {
        let mut dom = MemoryDom::default();
        let body = dom.body();
        dom.append(body, NodeSpec::new("a").id("one").at(20.0, 40.0).fixed().html("One"));
        dom.append(body, NodeSpec::new("a").id("two").at(80.0, 40.0).fixed().html("Two"));
        dom.append(body, NodeSpec::new("section").at(0.0, 1200.0));
        dom
    }

    #[test]
    fn test_failing_instance_does_not_affect_others() {
        let mut dom = page();
        let config = PageConfig {
            instances: vec![
                InstanceConfig::new("#one"),
                InstanceConfig::new("#missing"),
                InstanceConfig::new("#two"),
            ],
        };

        let bootstrap = Bootstrap::start(config, &mut dom, 0.0, |_| Box::new(CharSplitter::new()));

        assert_eq!(bootstrap.engines().len(), 2);
        assert_eq!(bootstrap.failures().len(), 1);
        assert_eq!(bootstrap.failures()[0].instance, "logo-2");
        assert!(bootstrap.engine("logo-1").is_some());
        assert!(bootstrap.engine("logo-3").is_some());
    }

    #[test]
    fn test_instances_are_independent() {
        let mut dom = page();
        let config = PageConfig {
            instances: vec![InstanceConfig::new("#one"), InstanceConfig::new("#two")],
        };
        let mut bootstrap =
            Bootstrap::start(config, &mut dom, 0.0, |_| Box::new(CharSplitter::new()));

        // 两个 logo 各自派发暂停
        assert_eq!(dom.event_count(crate::config::DEFAULT_PAUSE_EVENT), 2);

        bootstrap.on_scroll(&mut dom, 5000.0);
        for _ in 0..60 {
            bootstrap.advance(&mut dom, 16.0);
        }
        assert_eq!(dom.event_count(crate::config::DEFAULT_RESUME_EVENT), 2);

        let journals = bootstrap.teardown(&mut dom);
        assert_eq!(journals.len(), 2);
        assert_eq!(dom.inner_html(crate::dom::ElementId(1)), "One");
    }
}
