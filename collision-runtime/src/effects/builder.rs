//! # Effect Builder
//!
//! 由效果编号与可选覆盖参数构建效果描述符。

use serde::Serialize;
use tracing::warn;

use super::params::{NormalizedSettings, normalize};
use super::registry::EffectKind;
use crate::config::EffectSettings;

/// 效果描述符
///
/// 构建后不可变。入场 / 退场 / 过渡钩子见 [`hooks`](super::hooks)。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectDescriptor {
    kind: EffectKind,
    settings: NormalizedSettings,
}

impl EffectDescriptor {
    pub fn new(kind: EffectKind, settings: NormalizedSettings) -> Self {
        Self { kind, settings }
    }

    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    pub fn effect_number(&self) -> u32 {
        self.kind.number()
    }

    pub fn settings(&self) -> &NormalizedSettings {
        &self.settings
    }

    /// 起始阈值偏移（px）
    pub fn offset_start(&self) -> f32 {
        self.settings.timing.offset_start
    }

    /// 结束阈值偏移（px）
    pub fn offset_end(&self) -> f32 {
        self.settings.timing.offset_end
    }

    pub fn is_interactive(&self) -> bool {
        self.kind.is_interactive()
    }

    /// 是否提供 `on_transition`
    pub fn has_transition(&self) -> bool {
        self.kind.has_transition()
    }

    /// 与另一个描述符相比是否可以直接跳过（同编号且设置逐字节一致）
    pub fn is_identical_to(&self, other: &EffectDescriptor) -> bool {
        self.kind == other.kind && self.settings.same_as(&other.settings)
    }
}

/// 构建效果描述符
///
/// 无效编号返回 `None`，调用方应跳过对应区域。
pub fn build(
    number: u32,
    over: Option<&EffectSettings>,
    stored: &EffectSettings,
) -> Option<EffectDescriptor> {
    let Some(kind) = EffectKind::from_number(number) else {
        warn!(number, "无效的效果编号");
        return None;
    };
    Some(EffectDescriptor::new(kind, normalize(kind, over, stored)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectParams;

    #[test]
    fn test_build_known_and_unknown() {
        let stored = EffectSettings::default();

        let scale = build(1, None, &stored).unwrap();
        assert_eq!(scale.kind(), EffectKind::Scale);
        assert!(scale.is_interactive());
        assert!(scale.has_transition());
        assert_eq!(scale.settings().params, EffectParams::Scale { scale: 80.0 });

        assert!(build(0, None, &stored).is_none());
        assert!(build(42, None, &stored).is_none());
    }

    #[test]
    fn test_offsets_from_override() {
        let stored = EffectSettings {
            offset_start: Some(-40.0),
            ..Default::default()
        };
        let over = EffectSettings {
            offset_end: Some(25.0),
            ..Default::default()
        };
        let blur = build(2, Some(&over), &stored).unwrap();

        assert_eq!(blur.offset_start(), -40.0);
        assert_eq!(blur.offset_end(), 25.0);
    }

    #[test]
    fn test_identity() {
        let stored = EffectSettings::default();
        let a = build(1, None, &stored).unwrap();
        let b = build(1, None, &stored).unwrap();
        let over = EffectSettings {
            scale: Some(60.0),
            ..Default::default()
        };
        let c = build(1, Some(&over), &stored).unwrap();
        let d = build(5, None, &stored).unwrap();

        assert!(a.is_identical_to(&b));
        assert!(!a.is_identical_to(&c));
        assert!(!a.is_identical_to(&d));
    }
}
