//! # 诊断模块
//!
//! 提供实例配置的静态检查，不依赖 IO 或引擎。
//!
//! ## 设计原则
//!
//! - 纯函数 API，可在无 IO 环境下运行
//! - 诊断分级：Error（实例无法启动）、Warn（部分配置会被跳过）、Info（信息提示）
//! - 复用选择器解析与效果注册表，不重复解析逻辑
//! - 给出页面时额外检查选择器的命中情况

use crate::animation::Ease;
use crate::config::{EffectSettings, InstanceConfig};
use crate::dom::{Dom, Selector};
use crate::effects::EffectKind;
use crate::locator::RegionLocator;

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（建议修复）
    Warn,
    /// 错误（必须修复）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 诊断级别
    pub level: DiagnosticLevel,
    /// 实例标识
    pub instance: String,
    /// 诊断消息
    pub message: String,
    /// 诊断详情（可选，如出错的选择器）
    pub detail: Option<String>,
}

impl Diagnostic {
    /// 创建错误诊断
    pub fn error(instance: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Error, instance, message)
    }

    /// 创建警告诊断
    pub fn warn(instance: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Warn, instance, message)
    }

    /// 创建信息诊断
    pub fn info(instance: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Info, instance, message)
    }

    fn new(
        level: DiagnosticLevel,
        instance: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            instance: instance.into(),
            message: message.into(),
            detail: None,
        }
    }

    /// 设置详情
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.instance, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n  | {}", detail)?;
        }
        Ok(())
    }
}

/// 诊断结果
#[derive(Debug, Clone, Default)]
pub struct DiagnosticResult {
    /// 诊断条目列表
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// 合并另一个结果
    pub fn merge(&mut self, other: DiagnosticResult) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn error_count(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }

    pub fn warn_count(&self) -> usize {
        self.count(DiagnosticLevel::Warn)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// 按级别过滤
    pub fn filter_by_level(&self, min_level: DiagnosticLevel) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level >= min_level)
            .collect()
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }
}

//=============================================================================
// 配置分析 API
//=============================================================================

/// 分析实例配置
///
/// 始终执行的检查：
/// - logo 选择器缺失或无效
/// - 包含 / 排除 / 映射 / 事件目标选择器无效
/// - 无效的效果编号（默认效果为错误，映射为警告）
/// - 覆盖开关与覆盖参数不一致
/// - 无法识别的缓动名称
///
/// 给出 `dom` 时还会检查：logo 与事件目标是否存在、映射是否命中任何区域。
pub fn analyze_config(config: &InstanceConfig, dom: Option<&dyn Dom>) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();
    let id = config.id.as_str();

    let logo_valid = if config.logo_selector.trim().is_empty() {
        result.push(Diagnostic::error(id, "未配置 logo_selector"));
        false
    } else {
        check_selector(&mut result, id, "logo", &config.logo_selector, DiagnosticLevel::Error)
    };

    for selector in &config.include_selectors {
        check_selector(&mut result, id, "包含", selector, DiagnosticLevel::Warn);
    }
    for selector in &config.exclude_selectors {
        check_selector(&mut result, id, "排除", selector, DiagnosticLevel::Warn);
    }
    if let Some(selector) = &config.event_target_selector {
        check_selector(&mut result, id, "事件目标", selector, DiagnosticLevel::Warn);
    }

    if EffectKind::from_number(config.default_effect).is_none() {
        result.push(Diagnostic::error(
            id,
            format!("默认效果编号无效: {}", config.default_effect),
        ));
    }
    check_ease(&mut result, id, "实例参数", &config.settings);

    for (index, mapping) in config.mappings.iter().enumerate() {
        let label = format!("映射 #{} ({})", index, mapping.selector);
        check_selector(&mut result, id, "映射", &mapping.selector, DiagnosticLevel::Warn);

        if EffectKind::from_number(mapping.effect).is_none() {
            result.push(
                Diagnostic::warn(id, format!("{label} 的效果编号无效: {}", mapping.effect))
                    .with_detail("命中该映射的区域会被跳过"),
            );
        }
        match (&mapping.settings, mapping.override_enabled) {
            (None, true) => result.push(
                Diagnostic::warn(id, format!("{label} 启用了覆盖但没有覆盖参数"))
                    .with_detail("将使用实例参数"),
            ),
            (Some(_), false) => result.push(Diagnostic::info(
                id,
                format!("{label} 配置了覆盖参数但未启用覆盖，参数不会生效"),
            )),
            (Some(settings), true) => check_ease(&mut result, id, &label, settings),
            (None, false) => {}
        }
    }

    if let Some(dom) = dom
        && logo_valid
    {
        result.merge(analyze_against_page(config, dom));
    }

    result
}

/// 对照页面检查选择器命中情况
fn analyze_against_page(config: &InstanceConfig, dom: &dyn Dom) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();
    let id = config.id.as_str();

    let Ok(Some(logo)) = dom.query(&config.logo_selector) else {
        result.push(
            Diagnostic::error(id, "页面上找不到 logo 元素")
                .with_detail(config.logo_selector.clone()),
        );
        return result;
    };

    if let Some(selector) = &config.event_target_selector
        && let Ok(None) = dom.query(selector)
    {
        result.push(
            Diagnostic::warn(id, "页面上找不到事件目标，将改用 logo")
                .with_detail(selector.clone()),
        );
    }

    let regions = RegionLocator::new(config, logo).locate(dom);
    if regions.is_empty() {
        result.push(Diagnostic::info(id, "没有找到任何区域，logo 将保持原样"));
    } else {
        result.push(Diagnostic::info(id, format!("找到 {} 个区域", regions.len())));
    }

    for (index, mapping) in config.mappings.iter().enumerate() {
        let Ok(matched) = dom.query_all(&mapping.selector) else {
            continue;
        };
        let hits_region = regions
            .iter()
            .any(|&region| matched.iter().any(|&m| m == region || dom.is_ancestor(m, region)));
        if !hits_region {
            result.push(Diagnostic::info(
                id,
                format!("映射 #{} ({}) 没有命中任何区域", index, mapping.selector),
            ));
        }
    }

    result
}

/// 检查选择器，返回是否有效
fn check_selector(
    result: &mut DiagnosticResult,
    instance: &str,
    kind: &str,
    selector: &str,
    level: DiagnosticLevel,
) -> bool {
    match Selector::parse(selector) {
        Ok(_) => true,
        Err(e) => {
            result.push(
                Diagnostic::new(level, instance, format!("{kind}选择器无效")).with_detail(e.to_string()),
            );
            false
        }
    }
}

fn check_ease(
    result: &mut DiagnosticResult,
    instance: &str,
    label: &str,
    settings: &EffectSettings,
) {
    if let Some(ease) = settings.ease.as_deref()
        && !ease.trim().is_empty()
        && Ease::parse(ease).is_none()
    {
        result.push(
            Diagnostic::warn(instance, format!("{label} 的缓动名称无法识别: {ease}"))
                .with_detail("将使用默认缓动"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegionMapping;
    use crate::dom::{MemoryDom, NodeSpec};

    fn config() -> InstanceConfig {
        let mut config = InstanceConfig::new("#logo");
        config.id = "main".to_string();
        config
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::warn("main", "包含选择器无效").with_detail("a[");
        assert_eq!(diag.to_string(), "[WARN] main: 包含选择器无效\n  | a[");
    }

    #[test]
    fn test_clean_config() {
        let result = analyze_config(&config(), None);
        assert!(result.is_empty());
    }

    #[test]
    fn test_static_checks() {
        let mut config = config();
        config.default_effect = 0;
        config.include_selectors = vec!["section".into(), "div >".into()];
        config.settings.ease = Some("wobbly".into());
        config.mappings = vec![
            RegionMapping::new(".hero", 12),
            RegionMapping {
                override_enabled: true,
                ..RegionMapping::new(".dark", 2)
            },
        ];

        let result = analyze_config(&config, None);

        assert_eq!(result.error_count(), 1);
        // 包含选择器、缓动、映射编号、覆盖参数缺失
        assert_eq!(result.warn_count(), 4);
    }

    #[test]
    fn test_page_checks() {
        let mut dom = MemoryDom::default();
        let body = dom.body();
        dom.append(body, NodeSpec::new("a").id("logo").at(20.0, 40.0).fixed());
        dom.append(body, NodeSpec::new("section").class("hero").at(0.0, 800.0));

        let mut config = config();
        config.event_target_selector = Some("#player".into());
        config.mappings = vec![RegionMapping::new(".hero", 1), RegionMapping::new(".pricing", 2)];

        let result = analyze_config(&config, Some(&dom as &dyn Dom));
        let messages: Vec<_> = result.diagnostics.iter().map(|d| d.message.as_str()).collect();

        assert_eq!(result.warn_count(), 1);
        assert!(messages.contains(&"找到 1 个区域"));
        assert!(messages.contains(&"映射 #1 (.pricing) 没有命中任何区域"));
    }

    #[test]
    fn test_missing_logo_on_page() {
        let dom = MemoryDom::default();
        let result = analyze_config(&config(), Some(&dom as &dyn Dom));
        assert!(result.has_errors());
    }
}
