//! # Effect Registry
//!
//! 效果类型定义与默认参数。
//! 这是所有效果编号、默认值、取值范围的**唯一来源**。

use serde::{Deserialize, Serialize};

/// 效果类型
///
/// ## 编号
///
/// | 编号 | 类型 | 交互类 | 改写标记 |
/// |------|------|--------|----------|
/// | 1 | `Scale` | 是 | 否 |
/// | 2 | `Blur` | 否 | 否 |
/// | 3 | `TextSplit` | 是 | 是 |
/// | 4 | `Shuffle` | 是 | 是 |
/// | 5 | `Rotation` | 是 | 否 |
/// | 6 | `SlideText` | 否 | 否 |
/// | 7 | `MoveAway` | 否 | 否 |
///
/// 交互类效果参与暂停/恢复通知；改写标记的效果需要拆字，且没有平滑过渡。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// 缩放
    Scale,
    /// 模糊
    Blur,
    /// 拆字位移
    TextSplit,
    /// 字符乱序
    Shuffle,
    /// 旋转
    Rotation,
    /// 向上滑出
    SlideText,
    /// 水平移开
    MoveAway,
}

impl EffectKind {
    /// 全部效果（按编号顺序）
    pub const ALL: [EffectKind; 7] = [
        EffectKind::Scale,
        EffectKind::Blur,
        EffectKind::TextSplit,
        EffectKind::Shuffle,
        EffectKind::Rotation,
        EffectKind::SlideText,
        EffectKind::MoveAway,
    ];

    /// 由编号解析，未知编号返回 `None`
    pub fn from_number(number: u32) -> Option<Self> {
        let index = usize::try_from(number).ok()?.checked_sub(1)?;
        Self::ALL.get(index).copied()
    }

    /// 效果编号
    pub fn number(&self) -> u32 {
        match self {
            EffectKind::Scale => 1,
            EffectKind::Blur => 2,
            EffectKind::TextSplit => 3,
            EffectKind::Shuffle => 4,
            EffectKind::Rotation => 5,
            EffectKind::SlideText => 6,
            EffectKind::MoveAway => 7,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::Scale => "scale",
            EffectKind::Blur => "blur",
            EffectKind::TextSplit => "text-split",
            EffectKind::Shuffle => "shuffle",
            EffectKind::Rotation => "rotation",
            EffectKind::SlideText => "slide-text",
            EffectKind::MoveAway => "move-away",
        }
    }

    /// 是否为交互类效果（参与暂停/恢复通知）
    pub fn is_interactive(&self) -> bool {
        matches!(
            self,
            EffectKind::Scale | EffectKind::TextSplit | EffectKind::Shuffle | EffectKind::Rotation
        )
    }

    /// 是否改写 logo 标记（需要拆字）
    pub fn mutates_markup(&self) -> bool {
        matches!(self, EffectKind::TextSplit | EffectKind::Shuffle)
    }

    /// 是否提供平滑过渡
    pub fn has_transition(&self) -> bool {
        !self.mutates_markup()
    }
}

impl std::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 各参数的默认值与取值范围
///
/// 任何需要默认值的地方都应使用这些常量，而非硬编码数字。
pub mod defaults {
    /// 动画时长（秒）
    pub const DURATION: f32 = 0.6;
    pub const DURATION_RANGE: (f32, f32) = (0.0, 10.0);
    /// 缓动名称
    pub const EASE: &str = "power2.out";
    /// 起止阈值偏移（px）
    pub const OFFSET: f32 = 0.0;

    /// 缩放（%）
    pub const SCALE: f32 = 80.0;
    pub const SCALE_RANGE: (f32, f32) = (10.0, 300.0);
    /// 模糊半径（px）
    pub const BLUR: f32 = 6.0;
    pub const BLUR_RANGE: (f32, f32) = (0.0, 50.0);
    /// 模糊时的不透明度（%）
    pub const BLUR_OPACITY: f32 = 60.0;
    pub const BLUR_OPACITY_RANGE: (f32, f32) = (0.0, 100.0);
    /// 拆字位移（px）
    pub const SPLIT_DISTANCE: f32 = 20.0;
    pub const SPLIT_DISTANCE_RANGE: (f32, f32) = (-200.0, 200.0);
    /// 拆字错峰（ms）
    pub const SPLIT_STAGGER: f32 = 30.0;
    pub const STAGGER_RANGE: (f32, f32) = (0.0, 500.0);
    /// 乱序轮数
    pub const SHUFFLE_ITERATIONS: f32 = 8.0;
    pub const SHUFFLE_ITERATIONS_RANGE: (f32, f32) = (1.0, 50.0);
    /// 乱序错峰（ms）
    pub const SHUFFLE_STAGGER: f32 = 25.0;
    /// 旋转角度
    pub const ROTATION: f32 = 360.0;
    pub const ROTATION_RANGE: (f32, f32) = (-1080.0, 1080.0);
    /// 滑出距离（logo 高度的 %）
    pub const SLIDE_DISTANCE: f32 = 100.0;
    pub const SLIDE_DISTANCE_RANGE: (f32, f32) = (0.0, 200.0);

    /// 回退与重新入场之间的固定间隔（ms）
    pub const REENTER_DELAY_MS: f64 = 50.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_round_trip() {
        for kind in EffectKind::ALL {
            assert_eq!(EffectKind::from_number(kind.number()), Some(kind));
        }
        assert_eq!(EffectKind::from_number(0), None);
        assert_eq!(EffectKind::from_number(8), None);
    }

    #[test]
    fn test_classification() {
        let interactive: Vec<_> = EffectKind::ALL
            .iter()
            .filter(|k| k.is_interactive())
            .map(|k| k.number())
            .collect();
        assert_eq!(interactive, vec![1, 3, 4, 5]);

        assert!(EffectKind::TextSplit.mutates_markup());
        assert!(!EffectKind::Shuffle.has_transition());
        assert!(EffectKind::MoveAway.has_transition());
    }
}
