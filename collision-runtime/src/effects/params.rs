//! # Effect Params
//!
//! 把效果设置归一化为带标签的参数变体。
//!
//! ## 逐参数优先级
//!
//! 每个参数独立解析：
//!
//! 1. 映射覆盖值（已定义即采用）
//! 2. 实例存储值（已定义且非空才采用）
//! 3. [`defaults`] 中的硬编码默认值
//!
//! 映射可以只覆盖某个效果的一个参数，其余参数继续沿用实例设置。

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::registry::{EffectKind, defaults};
use crate::animation::Ease;
use crate::config::EffectSettings;

/// 公共时间参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    /// 时长（秒）
    pub duration: f32,
    pub ease: Ease,
    /// 起始阈值偏移（px）
    pub offset_start: f32,
    /// 结束阈值偏移（px）
    pub offset_end: f32,
}

impl Timing {
    pub fn duration_ms(&self) -> f32 {
        self.duration * 1000.0
    }
}

/// 移开距离
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDistance {
    /// 恰好移出视口
    Auto,
    Px(f32),
    /// logo 宽度的百分比
    Percent(f32),
}

impl MoveDistance {
    /// 解析 `120px` / `-50%` 形式，其余一律为 `Auto`
    pub fn parse(text: &str) -> Self {
        let Some(caps) = MOVE_DISTANCE
            .as_ref()
            .and_then(|re| re.captures(text.trim()))
        else {
            return Self::Auto;
        };
        match (caps[1].parse::<f32>(), &caps[2]) {
            (Ok(n), "px") => Self::Px(n),
            (Ok(n), _) => Self::Percent(n),
            (Err(_), _) => Self::Auto,
        }
    }
}

static MOVE_DISTANCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(-?\d+(?:\.\d+)?)(px|%)$").ok());

/// 移开方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Left,
    Right,
}

impl Direction {
    pub fn parse(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "right" => Self::Right,
            _ => Self::Left,
        }
    }
}

/// 各效果自己的参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectParams {
    Scale {
        /// 缩放（%）
        scale: f32,
    },
    Blur {
        /// 模糊半径（px）
        blur: f32,
        /// 不透明度（%）
        opacity: f32,
    },
    TextSplit {
        /// 位移（px），奇偶字符方向相反
        distance: f32,
        stagger_ms: f32,
    },
    Shuffle {
        iterations: u32,
        stagger_ms: f32,
    },
    Rotation {
        degrees: f32,
    },
    SlideText {
        /// logo 高度的百分比
        distance: f32,
    },
    MoveAway {
        distance: MoveDistance,
        direction: Direction,
    },
}

/// 归一化后的完整设置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSettings {
    pub timing: Timing,
    pub params: EffectParams,
}

impl NormalizedSettings {
    /// 序列化指纹，用于"设置完全一致"的跳过判定
    pub fn fingerprint(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// 两份设置是否逐字节一致
    pub fn same_as(&self, other: &NormalizedSettings) -> bool {
        self.fingerprint() == other.fingerprint()
    }
}

/// 逐参数取值
struct Sources<'a> {
    over: Option<&'a EffectSettings>,
    stored: &'a EffectSettings,
}

impl<'a> Sources<'a> {
    /// 数值参数：覆盖 → 存储 → 默认，再限制到范围内
    fn number(
        &self,
        field: impl Fn(&EffectSettings) -> Option<f32>,
        default: f32,
        range: Option<(f32, f32)>,
    ) -> f32 {
        let finite = |v: Option<f32>| v.filter(|n| n.is_finite());
        let value = finite(self.over.and_then(&field))
            .or_else(|| finite(field(self.stored)))
            .unwrap_or(default);
        match range {
            Some((min, max)) => value.clamp(min, max),
            None => value,
        }
    }

    /// 文本参数：覆盖值只要存在即采用，存储值必须非空
    fn text(&self, field: impl Fn(&'a EffectSettings) -> Option<&'a String>) -> Option<&'a str> {
        self.over
            .and_then(&field)
            .map(String::as_str)
            .or_else(|| {
                field(self.stored)
                    .map(|s| s.as_str())
                    .filter(|s| !s.trim().is_empty())
            })
    }
}

/// 归一化效果设置
pub fn normalize(
    kind: EffectKind,
    over: Option<&EffectSettings>,
    stored: &EffectSettings,
) -> NormalizedSettings {
    let src = Sources { over, stored };

    let ease = match src.text(|s| s.ease.as_ref()) {
        Some(name) => Ease::parse(name).unwrap_or_else(|| {
            warn!(ease = %name, fallback = defaults::EASE, "未知的缓动名称");
            Ease::default()
        }),
        None => Ease::default(),
    };
    let timing = Timing {
        duration: src.number(|s| s.duration, defaults::DURATION, Some(defaults::DURATION_RANGE)),
        ease,
        offset_start: src.number(|s| s.offset_start, defaults::OFFSET, None),
        offset_end: src.number(|s| s.offset_end, defaults::OFFSET, None),
    };

    let params = match kind {
        EffectKind::Scale => EffectParams::Scale {
            scale: src.number(|s| s.scale, defaults::SCALE, Some(defaults::SCALE_RANGE)),
        },
        EffectKind::Blur => EffectParams::Blur {
            blur: src.number(|s| s.blur, defaults::BLUR, Some(defaults::BLUR_RANGE)),
            opacity: src.number(
                |s| s.blur_opacity,
                defaults::BLUR_OPACITY,
                Some(defaults::BLUR_OPACITY_RANGE),
            ),
        },
        EffectKind::TextSplit => EffectParams::TextSplit {
            distance: src.number(
                |s| s.split_distance,
                defaults::SPLIT_DISTANCE,
                Some(defaults::SPLIT_DISTANCE_RANGE),
            ),
            stagger_ms: src.number(
                |s| s.split_stagger,
                defaults::SPLIT_STAGGER,
                Some(defaults::STAGGER_RANGE),
            ),
        },
        EffectKind::Shuffle => EffectParams::Shuffle {
            iterations: src
                .number(
                    |s| s.shuffle_iterations,
                    defaults::SHUFFLE_ITERATIONS,
                    Some(defaults::SHUFFLE_ITERATIONS_RANGE),
                )
                .round() as u32,
            stagger_ms: src.number(
                |s| s.shuffle_stagger,
                defaults::SHUFFLE_STAGGER,
                Some(defaults::STAGGER_RANGE),
            ),
        },
        EffectKind::Rotation => EffectParams::Rotation {
            degrees: src.number(|s| s.rotation, defaults::ROTATION, Some(defaults::ROTATION_RANGE)),
        },
        EffectKind::SlideText => EffectParams::SlideText {
            distance: src.number(
                |s| s.slide_distance,
                defaults::SLIDE_DISTANCE,
                Some(defaults::SLIDE_DISTANCE_RANGE),
            ),
        },
        EffectKind::MoveAway => EffectParams::MoveAway {
            distance: src
                .text(|s| s.move_distance.as_ref())
                .map(MoveDistance::parse)
                .unwrap_or(MoveDistance::Auto),
            direction: src
                .text(|s| s.move_direction.as_ref())
                .map(Direction::parse)
                .unwrap_or_default(),
        },
    };

    NormalizedSettings { timing, params }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> EffectSettings {
        EffectSettings {
            duration: Some(0.8),
            scale: Some(70.0),
            rotation: Some(180.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_hard_defaults() {
        let settings = normalize(EffectKind::Blur, None, &EffectSettings::default());

        assert_eq!(settings.timing.duration, defaults::DURATION);
        assert_eq!(settings.timing.ease, Ease::default());
        assert_eq!(settings.params, EffectParams::Blur { blur: 6.0, opacity: 60.0 });
    }

    #[test]
    fn test_per_parameter_precedence() {
        let over = EffectSettings {
            scale: Some(50.0),
            ..Default::default()
        };
        let settings = normalize(EffectKind::Scale, Some(&over), &stored());

        // scale 来自覆盖，duration 来自实例存储
        assert_eq!(settings.params, EffectParams::Scale { scale: 50.0 });
        assert_eq!(settings.timing.duration, 0.8);
    }

    #[test]
    fn test_clamping() {
        let over = EffectSettings {
            scale: Some(1000.0),
            duration: Some(-1.0),
            shuffle_iterations: Some(0.4),
            ..Default::default()
        };

        let scale = normalize(EffectKind::Scale, Some(&over), &stored());
        assert_eq!(scale.params, EffectParams::Scale { scale: 300.0 });
        assert_eq!(scale.timing.duration, 0.0);

        let shuffle = normalize(EffectKind::Shuffle, Some(&over), &stored());
        assert_eq!(shuffle.params, EffectParams::Shuffle { iterations: 1, stagger_ms: 25.0 });
    }

    #[test]
    fn test_empty_stored_text_falls_through() {
        let stored = EffectSettings {
            ease: Some("  ".into()),
            move_direction: Some(String::new()),
            ..Default::default()
        };
        let settings = normalize(EffectKind::MoveAway, None, &stored);

        assert_eq!(settings.timing.ease, Ease::default());
        assert_eq!(
            settings.params,
            EffectParams::MoveAway {
                distance: MoveDistance::Auto,
                direction: Direction::Left
            }
        );
    }

    #[test]
    fn test_unknown_ease_falls_back() {
        let over = EffectSettings {
            ease: Some("wobble.out".into()),
            ..Default::default()
        };
        let settings = normalize(EffectKind::Rotation, Some(&over), &stored());

        assert_eq!(settings.timing.ease, Ease::default());
        assert_eq!(settings.params, EffectParams::Rotation { degrees: 180.0 });
    }

    #[test]
    fn test_move_distance_parse() {
        assert_eq!(MoveDistance::parse("120px"), MoveDistance::Px(120.0));
        assert_eq!(MoveDistance::parse("-50%"), MoveDistance::Percent(-50.0));
        assert_eq!(MoveDistance::parse("12.5px"), MoveDistance::Px(12.5));
        assert_eq!(MoveDistance::parse("auto"), MoveDistance::Auto);
        assert_eq!(MoveDistance::parse("1e3px"), MoveDistance::Auto);
        assert_eq!(MoveDistance::parse(".5px"), MoveDistance::Auto);
        assert_eq!(MoveDistance::parse("12.px"), MoveDistance::Auto);
        assert_eq!(MoveDistance::parse(" 40% "), MoveDistance::Percent(40.0));
        assert_eq!(MoveDistance::parse("40pxx"), MoveDistance::Auto);
        assert_eq!(MoveDistance::parse("120"), MoveDistance::Auto);
    }

    #[test]
    fn test_fingerprint_equality() {
        let a = normalize(EffectKind::Scale, None, &stored());
        let b = normalize(EffectKind::Scale, None, &stored());
        let over = EffectSettings {
            offset_start: Some(10.0),
            ..Default::default()
        };
        let c = normalize(EffectKind::Scale, Some(&over), &stored());

        assert!(a.same_as(&b));
        assert!(!a.same_as(&c));
    }
}
