//! # Easing 模块
//!
//! 缓动函数库，用于补间的时间插值。
//!
//! 配置里的缓动名称沿用常见的 `family.mode` 写法：
//! `power2.out`、`sine.inOut`、`back.out`、`none` 等。

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// 缓动方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EaseMode {
    In,
    #[default]
    Out,
    InOut,
}

/// 缓动函数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    /// 线性（匀速）
    Linear,
    /// 幂函数缓动，`power1` ~ `power4`（指数 2 ~ 5）
    Power { power: u8, mode: EaseMode },
    /// 正弦缓动
    Sine(EaseMode),
    /// 指数缓动
    Expo(EaseMode),
    /// 回弹缓出（略微越过终点）
    BackOut,
    /// 弹性缓出
    ElasticOut,
    /// 弹跳缓出
    BounceOut,
}

impl Default for Ease {
    fn default() -> Self {
        Self::Power {
            power: 2,
            mode: EaseMode::Out,
        }
    }
}

impl Ease {
    /// 解析缓动名称（大小写不敏感），不认识的名称返回 `None`
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        let (family, mode) = match name.split_once('.') {
            Some((family, mode)) => (family, Some(mode)),
            None => (name.as_str(), None),
        };
        let mode = match mode {
            None | Some("out") => EaseMode::Out,
            Some("in") => EaseMode::In,
            Some("inout") => EaseMode::InOut,
            Some(_) => return None,
        };

        match family {
            "none" | "linear" => Some(Self::Linear),
            "power1" | "power2" | "power3" | "power4" => {
                let power = family[5..].parse().ok()?;
                Some(Self::Power { power, mode })
            }
            "sine" => Some(Self::Sine(mode)),
            "expo" => Some(Self::Expo(mode)),
            "back" if mode == EaseMode::Out => Some(Self::BackOut),
            "elastic" if mode == EaseMode::Out => Some(Self::ElasticOut),
            "bounce" if mode == EaseMode::Out => Some(Self::BounceOut),
            _ => None,
        }
    }

    /// 计算缓动值
    ///
    /// # 参数
    /// - `t`: 时间进度 (0.0 - 1.0)
    ///
    /// # 返回
    /// - 缓动后的进度值（`BackOut` / `ElasticOut` 中途可能略超 1.0）
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match *self {
            Ease::Linear => t,
            Ease::Power { power, mode } => {
                let exponent = i32::from(power) + 1;
                with_mode(mode, t, |t| t.powi(exponent))
            }
            Ease::Sine(mode) => with_mode(mode, t, |t| 1.0 - (t * PI / 2.0).cos()),
            Ease::Expo(mode) => with_mode(mode, t, |t| {
                if t == 0.0 { 0.0 } else { 2.0_f32.powf(10.0 * t - 10.0) }
            }),
            Ease::BackOut => back_out(t),
            Ease::ElasticOut => elastic_out(t),
            Ease::BounceOut => bounce_out(t),
        }
    }
}

/// 由缓入曲线派生出缓出 / 缓入缓出
fn with_mode(mode: EaseMode, t: f32, ease_in: impl Fn(f32) -> f32) -> f32 {
    match mode {
        EaseMode::In => ease_in(t),
        EaseMode::Out => 1.0 - ease_in(1.0 - t),
        EaseMode::InOut => {
            if t < 0.5 {
                ease_in(t * 2.0) / 2.0
            } else {
                1.0 - ease_in((1.0 - t) * 2.0) / 2.0
            }
        }
    }
}

fn back_out(t: f32) -> f32 {
    let c1 = 1.70158;
    let c3 = c1 + 1.0;
    1.0 + c3 * (t - 1.0).powi(3) + c1 * (t - 1.0).powi(2)
}

fn elastic_out(t: f32) -> f32 {
    if t == 0.0 {
        0.0
    } else if t == 1.0 {
        1.0
    } else {
        let c4 = (2.0 * PI) / 3.0;
        2.0_f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
    }
}

fn bounce_out(t: f32) -> f32 {
    let n1 = 7.5625;
    let d1 = 2.75;

    if t < 1.0 / d1 {
        n1 * t * t
    } else if t < 2.0 / d1 {
        let t = t - 1.5 / d1;
        n1 * t * t + 0.75
    } else if t < 2.5 / d1 {
        let t = t - 2.25 / d1;
        n1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / d1;
        n1 * t * t + 0.984375
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!(Ease::parse("power2.out"), Some(Ease::default()));
        assert_eq!(Ease::parse("none"), Some(Ease::Linear));
        assert_eq!(
            Ease::parse("Power3.inOut"),
            Some(Ease::Power {
                power: 3,
                mode: EaseMode::InOut
            })
        );
        assert_eq!(Ease::parse("sine"), Some(Ease::Sine(EaseMode::Out)));
        assert_eq!(Ease::parse("bounce.out"), Some(Ease::BounceOut));
        assert_eq!(Ease::parse("bounce.in"), None);
        assert_eq!(Ease::parse("power7.out"), None);
        assert_eq!(Ease::parse("wobble"), None);
    }

    #[test]
    fn test_endpoints() {
        for name in [
            "none",
            "power1.in",
            "power2.out",
            "power4.inOut",
            "sine.in",
            "expo.out",
            "back.out",
            "elastic.out",
            "bounce.out",
        ] {
            let ease = Ease::parse(name).unwrap();
            assert!(ease.apply(0.0).abs() < 0.001, "{name} 起点");
            assert!((ease.apply(1.0) - 1.0).abs() < 0.001, "{name} 终点");
        }
    }

    #[test]
    fn test_in_out_midpoint() {
        let ease = Ease::parse("power2.inOut").unwrap();
        // 中点应该是 0.5
        assert!((ease.apply(0.5) - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_clamp() {
        let ease = Ease::Linear;
        // 超出范围应该被限制
        assert_eq!(ease.apply(-0.5), 0.0);
        assert_eq!(ease.apply(1.5), 1.0);
    }

    #[test]
    fn test_out_is_front_loaded() {
        let ease = Ease::default();
        assert!(ease.apply(0.25) > 0.25);
    }
}
