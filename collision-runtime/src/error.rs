//! # Error 模块
//!
//! 定义 collision-runtime 中使用的错误类型。
//!
//! 这些错误都不会以 panic 的形式到达宿主：
//! 实例级错误由 [`Bootstrap`](crate::Bootstrap) 记录后跳过，
//! 选择器错误在定位阶段逐条跳过，拆字错误只写入日志和 journal。

use thiserror::Error;

/// CSS 选择器错误
#[derive(Error, Debug, Clone, PartialEq)]
#[error("无效的选择器 '{selector}': {message}")]
pub struct SelectorError {
    /// 原始选择器文本
    pub selector: String,
    /// 错误描述
    pub message: String,
}

impl SelectorError {
    pub fn new(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            message: message.into(),
        }
    }
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 未配置 logo 选择器
    #[error("实例 '{instance}' 未配置 logo_selector")]
    MissingLogoSelector { instance: String },

    /// 无效的效果编号
    #[error("无效的效果编号 {number}")]
    InvalidEffect { number: u32 },

    /// 配置解析失败
    #[error("配置解析失败: {0}")]
    Parse(String),
}

/// 引擎初始化错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// 页面上找不到 logo 元素
    #[error("实例 '{instance}' 找不到 logo 元素: {selector}")]
    LogoNotFound { instance: String, selector: String },

    /// logo 选择器本身无效
    #[error("实例 '{instance}' 的 logo 选择器无效: {source}")]
    InvalidLogoSelector {
        instance: String,
        #[source]
        source: SelectorError,
    },

    /// 配置错误
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// 拆字模块错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SplitError {
    /// 拆字模块不可用（加载失败）
    #[error("拆字模块不可用: {0}")]
    Unavailable(String),

    /// 未知的拆字请求
    #[error("未知的拆字请求 #{0}")]
    UnknownTicket(u64),
}

/// collision-runtime 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollisionError {
    #[error("选择器错误: {0}")]
    Selector(#[from] SelectorError),

    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("引擎错误: {0}")]
    Engine(#[from] EngineError),

    #[error("拆字错误: {0}")]
    Split(#[from] SplitError),
}

/// Result 类型别名
pub type CollisionResult<T> = Result<T, CollisionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SelectorError::new("div[", "未闭合的 '['");
        assert_eq!(err.to_string(), "无效的选择器 'div[': 未闭合的 '['");

        let err = EngineError::LogoNotFound {
            instance: "logo-1".to_string(),
            selector: ".site-logo".to_string(),
        };
        assert!(err.to_string().contains(".site-logo"));
    }

    #[test]
    fn test_error_conversion() {
        let err: CollisionError = ConfigError::InvalidEffect { number: 42 }.into();
        assert!(matches!(
            err,
            CollisionError::Config(ConfigError::InvalidEffect { number: 42 })
        ));

        let err: EngineError = ConfigError::MissingLogoSelector {
            instance: "a".to_string(),
        }
        .into();
        assert!(matches!(err, EngineError::Config(_)));
    }
}
