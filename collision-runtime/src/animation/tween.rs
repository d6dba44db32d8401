//! # Tween 模块
//!
//! 补间与时间轴定义。
//!
//! 补间只关注单个 [`Property`] 的 f32 值随时间的变化，不假设它最终如何呈现；
//! 呈现由 [`LogoTarget`](crate::target::LogoTarget) 负责。

use serde::{Deserialize, Serialize};

use super::Ease;

/// 动画句柄
///
/// 一次 [`Animator::play`](super::Animator::play) 对应一个句柄。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnimationHandle(pub u64);

impl std::fmt::Display for AnimationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "anim#{}", self.0)
    }
}

/// logo 上可动画的属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Property {
    /// 缩放倍数
    Scale,
    /// 模糊半径（px）
    Blur,
    /// 旋转角度
    Rotation,
    /// 不透明度（0 - 1）
    Opacity,
    /// 水平位移（px）
    TranslateX,
    /// 垂直位移（px）
    TranslateY,
    /// 第 i 个字符的垂直位移（px）
    CharOffsetY(usize),
    /// 第 i 个字符的不透明度
    CharOpacity(usize),
    /// 第 i 个字符的乱序进度（1.0 表示已还原为真实字符）
    CharShuffle(usize),
}

impl Property {
    /// 整体样式属性
    pub const STYLE: [Property; 6] = [
        Property::Scale,
        Property::Blur,
        Property::Rotation,
        Property::Opacity,
        Property::TranslateX,
        Property::TranslateY,
    ];

    /// 静止（原始）状态下的值
    pub fn rest_value(&self) -> f32 {
        match self {
            Property::Scale
            | Property::Opacity
            | Property::CharOpacity(_)
            | Property::CharShuffle(_) => 1.0,
            _ => 0.0,
        }
    }

    /// 是否为逐字符属性
    pub fn is_char(&self) -> bool {
        matches!(
            self,
            Property::CharOffsetY(_) | Property::CharOpacity(_) | Property::CharShuffle(_)
        )
    }
}

/// 补间描述
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    /// 属性
    pub property: Property,
    /// 起始值，`None` 表示从开始播放时的当前值出发
    pub from: Option<f32>,
    /// 目标值
    pub to: f32,
    /// 时长（ms）
    pub duration_ms: f32,
    /// 延迟（ms），相对于时间轴起点
    pub delay_ms: f32,
    /// 缓动函数
    pub ease: Ease,
}

impl Tween {
    /// 从当前值补间到 `value`
    pub fn to(property: Property, value: f32) -> Self {
        Self {
            property,
            from: None,
            to: value,
            duration_ms: 0.0,
            delay_ms: 0.0,
            ease: Ease::default(),
        }
    }

    /// 显式指定起始值
    pub fn from(mut self, value: f32) -> Self {
        self.from = Some(value);
        self
    }

    pub fn duration(mut self, duration_ms: f32) -> Self {
        self.duration_ms = duration_ms.max(0.0);
        self
    }

    pub fn delay(mut self, delay_ms: f32) -> Self {
        self.delay_ms = delay_ms.max(0.0);
        self
    }

    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    /// 结束时刻（ms）
    pub fn end_ms(&self) -> f32 {
        self.delay_ms + self.duration_ms
    }
}

/// 时间轴：一组并行（借助延迟错开）的补间
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    pub tweens: Vec<Tween>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加补间
    pub fn with(mut self, tween: Tween) -> Self {
        self.tweens.push(tween);
        self
    }

    pub fn push(&mut self, tween: Tween) {
        self.tweens.push(tween);
    }

    /// 总时长（ms）
    pub fn total_ms(&self) -> f32 {
        self.tweens.iter().map(Tween::end_ms).fold(0.0, f32::max)
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }
}

/// 补间状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TweenState {
    /// 等待开始（有延迟）
    #[default]
    Pending,
    /// 正在播放
    Playing,
    /// 已完成
    Completed,
}

impl TweenState {
    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// 运行中的补间
#[derive(Debug, Clone)]
pub(crate) struct Track {
    tween: Tween,
    /// 实际起始值（开始播放时确定）
    from: f32,
    state: TweenState,
    elapsed: f32,
}

impl Track {
    pub(crate) fn new(tween: Tween) -> Self {
        Self {
            from: tween.from.unwrap_or(0.0),
            tween,
            state: TweenState::Pending,
            elapsed: 0.0,
        }
    }

    pub(crate) fn property(&self) -> Property {
        self.tween.property
    }

    pub(crate) fn state(&self) -> TweenState {
        self.state
    }

    /// 推进时间
    ///
    /// `current` 为属性当前值，仅在从 Pending 进入 Playing 时用于确定起始值。
    /// 返回需要写入属性的新值（仍在延迟中时返回 `None`）。
    pub(crate) fn update(&mut self, dt_ms: f32, current: f32) -> Option<f32> {
        match self.state {
            TweenState::Pending => {
                self.elapsed += dt_ms;
                if self.elapsed < self.tween.delay_ms {
                    return None;
                }
                self.state = TweenState::Playing;
                self.from = self.tween.from.unwrap_or(current);
                self.elapsed -= self.tween.delay_ms;
                Some(self.sample())
            }
            TweenState::Playing => {
                self.elapsed += dt_ms;
                Some(self.sample())
            }
            TweenState::Completed => None,
        }
    }

    fn sample(&mut self) -> f32 {
        let raw = if self.tween.duration_ms <= 0.0 {
            1.0
        } else {
            self.elapsed / self.tween.duration_ms
        };

        if raw >= 1.0 {
            self.state = TweenState::Completed;
            self.tween.to
        } else {
            let progress = self.tween.ease.apply(raw);
            self.from + (self.tween.to - self.from) * progress
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_update() {
        let mut track = Track::new(
            Tween::to(Property::Scale, 0.5)
                .duration(100.0)
                .ease(Ease::Linear),
        );

        // 起始值取自当前值
        assert_eq!(track.update(50.0, 1.0), Some(0.75));
        assert_eq!(track.state(), TweenState::Playing);

        assert_eq!(track.update(60.0, 0.75), Some(0.5));
        assert!(track.state().is_finished());
        assert_eq!(track.update(10.0, 0.5), None);
    }

    #[test]
    fn test_track_delay() {
        let mut track = Track::new(
            Tween::to(Property::CharOffsetY(2), 20.0)
                .from(0.0)
                .duration(100.0)
                .delay(60.0)
                .ease(Ease::Linear),
        );

        // 延迟期间
        assert_eq!(track.update(30.0, 0.0), None);
        assert_eq!(track.state(), TweenState::Pending);

        // 延迟结束，超出部分计入播放时间
        assert_eq!(track.update(80.0, 0.0), Some(10.0));
    }

    #[test]
    fn test_zero_duration_completes_immediately() {
        let mut track = Track::new(Tween::to(Property::Blur, 6.0));
        assert_eq!(track.update(0.0, 0.0), Some(6.0));
        assert!(track.state().is_finished());
    }

    #[test]
    fn test_timeline_total() {
        let timeline = Timeline::new()
            .with(Tween::to(Property::Scale, 0.8).duration(600.0))
            .with(Tween::to(Property::CharOpacity(3), 0.0).duration(300.0).delay(400.0));

        assert_eq!(timeline.total_ms(), 700.0);
        assert!(Timeline::new().is_empty());
    }

    #[test]
    fn test_rest_values() {
        assert_eq!(Property::Scale.rest_value(), 1.0);
        assert_eq!(Property::Blur.rest_value(), 0.0);
        assert_eq!(Property::CharShuffle(0).rest_value(), 1.0);
        assert!(Property::CharOffsetY(1).is_char());
        assert!(!Property::Opacity.is_char());
    }
}
