//! # Region Locator
//!
//! 初始化时从 include / exclude / 映射选择器中定位需要跟踪的区域元素。
//!
//! ## 定位顺序
//!
//! 1. include 非空：只取 include 命中的元素
//! 2. include 为空：依次尝试 [`FALLBACK_SELECTORS`]；仍为空时退回 body 的直接子元素
//!    （跳过 [`STRUCTURAL_TAGS`]）
//! 3. 并入所有映射选择器命中的元素（不受 exclude 约束）
//!
//! 所有候选都必须可见（渲染高度大于 0），且与 logo 没有包含关系。
//! 结果按文档顺序去重，这个顺序就是触发器的 index。

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::config::InstanceConfig;
use crate::dom::{Dom, ElementId, Selector};

/// 自动探测时使用的内容容器选择器
pub const FALLBACK_SELECTORS: &[&str] = &[
    "section",
    "article",
    ".wp-block-cover",
    ".wp-block-group",
    ".elementor-section",
    ".e-con",
    "[data-logo-collision]",
];

/// body 兜底时跳过的结构性标签
pub const STRUCTURAL_TAGS: &[&str] = &["header", "nav", "footer", "script", "style"];

/// 区域定位器
pub struct RegionLocator {
    include: Vec<Selector>,
    exclude: Vec<Selector>,
    mappings: Vec<Selector>,
    logo: ElementId,
}

impl RegionLocator {
    /// 编译实例配置中的全部选择器（无效的记录警告后跳过）
    pub fn new(config: &InstanceConfig, logo: ElementId) -> Self {
        Self {
            include: compile(config.include_selectors.iter().map(String::as_str), "include"),
            exclude: compile(config.exclude_selectors.iter().map(String::as_str), "exclude"),
            mappings: compile(config.mapping_selectors(), "mapping"),
            logo,
        }
    }

    /// 定位区域，返回文档顺序的去重列表
    pub fn locate(&self, dom: &dyn Dom) -> Vec<ElementId> {
        let all = dom.all_elements();
        let mut found = BTreeSet::new();

        if self.include.is_empty() {
            let fallback = compile(FALLBACK_SELECTORS.iter().copied(), "fallback");
            found.extend(
                self.matching(dom, &all, &fallback)
                    .filter(|&el| !self.is_excluded(dom, el)),
            );

            if found.is_empty() {
                debug!("自动探测未命中，退回 body 子元素");
                found.extend(dom.body_children().into_iter().filter(|&el| {
                    !STRUCTURAL_TAGS.iter().any(|&tag| tag == dom.tag_name(el))
                        && self.is_candidate(dom, el)
                        && !self.is_excluded(dom, el)
                }));
            }
        } else {
            found.extend(
                self.matching(dom, &all, &self.include)
                    .filter(|&el| !self.is_excluded(dom, el)),
            );
        }

        found.extend(self.matching(dom, &all, &self.mappings));

        let mut regions: Vec<_> = found.into_iter().collect();
        regions.sort_by_key(|&el| dom.document_position(el));
        debug!(count = regions.len(), "区域定位完成");
        regions
    }

    /// 命中任一选择器的候选元素
    fn matching<'a>(
        &'a self,
        dom: &'a dyn Dom,
        all: &'a [ElementId],
        selectors: &'a [Selector],
    ) -> impl Iterator<Item = ElementId> + 'a {
        all.iter()
            .copied()
            .filter(move |&el| selectors.iter().any(|s| s.matches(dom, el)))
            .filter(move |&el| self.is_candidate(dom, el))
    }

    /// 可见，且不是 logo、不包含 logo、不在 logo 内部
    fn is_candidate(&self, dom: &dyn Dom, element: ElementId) -> bool {
        element != self.logo
            && !dom.is_ancestor(element, self.logo)
            && !dom.is_ancestor(self.logo, element)
            && dom.is_visible(element)
    }

    /// 自身或任一祖先命中 exclude
    fn is_excluded(&self, dom: &dyn Dom, element: ElementId) -> bool {
        let mut current = Some(element);
        while let Some(node) = current {
            if self.exclude.iter().any(|s| s.matches(dom, node)) {
                return true;
            }
            current = dom.parent(node);
        }
        false
    }
}

fn compile<'a>(selectors: impl Iterator<Item = &'a str>, role: &str) -> Vec<Selector> {
    selectors
        .filter_map(|text| match Selector::parse(text) {
            Ok(selector) => Some(selector),
            Err(e) => {
                warn!(role, selector = %text, error = %e, "跳过无效的选择器");
                None
            }
        })
        .collect()
}
