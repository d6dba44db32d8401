//! # Viewport 模块
//!
//! 视口分级与响应式配置值解析。

use serde::{Deserialize, Serialize};

/// 平板断点下限（含）
pub const TABLET_MIN_WIDTH: f32 = 768.0;
/// 平板断点上限（含）
pub const TABLET_MAX_WIDTH: f32 = 1024.0;

/// 视口类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewportClass {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

impl ViewportClass {
    /// 根据视口宽度判断类别
    pub fn from_width(width: f32) -> Self {
        if width < TABLET_MIN_WIDTH {
            Self::Mobile
        } else if width <= TABLET_MAX_WIDTH {
            Self::Tablet
        } else {
            Self::Desktop
        }
    }
}

/// 响应式配置值
///
/// 基础值加上可选的平板/手机覆盖。解析顺序：
///
/// ```text
/// Mobile  -> mobile ?? tablet ?? base
/// Tablet  -> tablet ?? base
/// Desktop -> base
/// ```
///
/// 反序列化时既接受 `{ "base": 10, "mobile": 0 }`，也接受裸值 `10`。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "ResponsiveRepr<T>")]
pub struct Responsive<T> {
    pub base: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tablet: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<T>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ResponsiveRepr<T> {
    Bare(T),
    Full {
        base: T,
        #[serde(default = "Option::default")]
        tablet: Option<T>,
        #[serde(default = "Option::default")]
        mobile: Option<T>,
    },
}

impl<T> From<ResponsiveRepr<T>> for Responsive<T> {
    fn from(repr: ResponsiveRepr<T>) -> Self {
        match repr {
            ResponsiveRepr::Bare(base) => Self {
                base,
                tablet: None,
                mobile: None,
            },
            ResponsiveRepr::Full {
                base,
                tablet,
                mobile,
            } => Self {
                base,
                tablet,
                mobile,
            },
        }
    }
}

impl<T> Responsive<T> {
    /// 只有基础值
    pub fn uniform(base: T) -> Self {
        Self {
            base,
            tablet: None,
            mobile: None,
        }
    }

    /// 设置平板覆盖
    pub fn with_tablet(mut self, value: T) -> Self {
        self.tablet = Some(value);
        self
    }

    /// 设置手机覆盖
    pub fn with_mobile(mut self, value: T) -> Self {
        self.mobile = Some(value);
        self
    }
}

impl<T: Clone> Responsive<T> {
    /// 解析当前视口下的有效值
    pub fn resolve(&self, class: ViewportClass) -> T {
        match class {
            ViewportClass::Desktop => self.base.clone(),
            ViewportClass::Tablet => self.tablet.clone().unwrap_or_else(|| self.base.clone()),
            ViewportClass::Mobile => self
                .mobile
                .clone()
                .or_else(|| self.tablet.clone())
                .unwrap_or_else(|| self.base.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_class_breakpoints() {
        assert_eq!(ViewportClass::from_width(375.0), ViewportClass::Mobile);
        assert_eq!(ViewportClass::from_width(767.9), ViewportClass::Mobile);
        assert_eq!(ViewportClass::from_width(768.0), ViewportClass::Tablet);
        assert_eq!(ViewportClass::from_width(1024.0), ViewportClass::Tablet);
        assert_eq!(ViewportClass::from_width(1025.0), ViewportClass::Desktop);
    }

    #[test]
    fn test_resolve_cascade() {
        let value = Responsive::uniform(30.0).with_tablet(20.0);
        assert_eq!(value.resolve(ViewportClass::Desktop), 30.0);
        assert_eq!(value.resolve(ViewportClass::Tablet), 20.0);
        // 手机未配置，继承平板
        assert_eq!(value.resolve(ViewportClass::Mobile), 20.0);

        let value = value.with_mobile(5.0);
        assert_eq!(value.resolve(ViewportClass::Mobile), 5.0);
    }

    #[test]
    fn test_deserialize_bare_and_full() {
        let bare: Responsive<f32> = serde_json::from_str("12").unwrap();
        assert_eq!(bare, Responsive::uniform(12.0));

        let full: Responsive<f32> =
            serde_json::from_str(r#"{"base": 12, "mobile": 4}"#).unwrap();
        assert_eq!(full.resolve(ViewportClass::Tablet), 12.0);
        assert_eq!(full.resolve(ViewportClass::Mobile), 4.0);
    }
}
