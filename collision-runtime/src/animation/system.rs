//! # System 模块
//!
//! 补间引擎：管理属性当前值与运行中的时间轴。
//!
//! ```rust,ignore
//! let mut engine = TweenEngine::new();
//! let handle = engine.play(Timeline::new().with(Tween::to(Property::Scale, 0.8).duration(600.0)));
//! for event in engine.update(16.0) { /* AnimationEvent::Completed(handle) */ }
//! let scale = engine.value(Property::Scale);
//! ```

use std::collections::BTreeMap;

use super::tween::{AnimationHandle, Property, Timeline, Track};

/// 动画事件
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationEvent {
    /// 时间轴全部播放完成（被 kill 的时间轴不会产生此事件）
    Completed(AnimationHandle),
}

/// 动画引擎接口
///
/// 效果钩子与仲裁引擎只依赖这组窄接口。
pub trait Animator {
    /// 创建并开始一个时间轴
    fn play(&mut self, timeline: Timeline) -> AnimationHandle;

    /// 立即停止时间轴（属性停留在当前值），返回它此前是否仍在运行
    fn kill(&mut self, handle: AnimationHandle) -> bool;

    /// 不经动画直接设置属性值
    fn set(&mut self, property: Property, value: f32);

    /// 属性当前值（从未设置过时为静止值）
    fn value(&self, property: Property) -> f32;

    /// 停止全部时间轴并把所有属性恢复为静止值
    fn reset(&mut self);

    /// 时间轴是否仍在运行
    fn is_live(&self, handle: AnimationHandle) -> bool;

    /// 推进时间，返回本帧完成的时间轴
    fn update(&mut self, dt_ms: f32) -> Vec<AnimationEvent>;

    /// 被设置过的属性（按属性顺序）
    fn touched(&self) -> Vec<Property>;
}

/// 补间引擎
///
/// ## 设计理念
///
/// 引擎只负责：
/// 1. 管理时间轴：知道某个属性从 A 到 B 需要在 duration 内变化
/// 2. 维护属性当前值
/// 3. 不假设属性如何呈现：由 logo 目标自己决定如何使用这些值
#[derive(Default)]
pub struct TweenEngine {
    /// 属性当前值
    values: BTreeMap<Property, f32>,
    /// 运行中的时间轴
    timelines: BTreeMap<AnimationHandle, Vec<Track>>,
    /// 下一个句柄
    next_handle: u64,
}

impl std::fmt::Debug for TweenEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TweenEngine")
            .field("values", &self.values.len())
            .field("timelines", &self.timelines.len())
            .finish()
    }
}

impl TweenEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 运行中的时间轴数量
    pub fn live_count(&self) -> usize {
        self.timelines.len()
    }
}

impl Animator for TweenEngine {
    fn play(&mut self, timeline: Timeline) -> AnimationHandle {
        self.next_handle += 1;
        let handle = AnimationHandle(self.next_handle);

        // 显式起始值立即生效，避免第一帧闪回
        for tween in &timeline.tweens {
            if let Some(from) = tween.from
                && tween.delay_ms <= 0.0
            {
                self.values.insert(tween.property, from);
            }
        }

        let tracks = timeline.tweens.into_iter().map(Track::new).collect();
        self.timelines.insert(handle, tracks);
        handle
    }

    fn kill(&mut self, handle: AnimationHandle) -> bool {
        self.timelines.remove(&handle).is_some()
    }

    fn set(&mut self, property: Property, value: f32) {
        self.values.insert(property, value);
    }

    fn value(&self, property: Property) -> f32 {
        self.values
            .get(&property)
            .copied()
            .unwrap_or_else(|| property.rest_value())
    }

    fn reset(&mut self) {
        self.timelines.clear();
        self.values.clear();
    }

    fn is_live(&self, handle: AnimationHandle) -> bool {
        self.timelines.contains_key(&handle)
    }

    fn update(&mut self, dt_ms: f32) -> Vec<AnimationEvent> {
        let mut events = Vec::new();

        for (handle, tracks) in self.timelines.iter_mut() {
            for track in tracks.iter_mut() {
                let property = track.property();
                let current = self
                    .values
                    .get(&property)
                    .copied()
                    .unwrap_or_else(|| property.rest_value());
                if let Some(value) = track.update(dt_ms, current) {
                    self.values.insert(property, value);
                }
            }
            if tracks.iter().all(|t| t.state().is_finished()) {
                events.push(AnimationEvent::Completed(*handle));
            }
        }

        for event in &events {
            let AnimationEvent::Completed(handle) = event;
            self.timelines.remove(handle);
        }
        events
    }

    fn touched(&self) -> Vec<Property> {
        self.values.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{Ease, Tween};

    fn scale_to(value: f32, duration_ms: f32) -> Timeline {
        Timeline::new().with(
            Tween::to(Property::Scale, value)
                .duration(duration_ms)
                .ease(Ease::Linear),
        )
    }

    #[test]
    fn test_play_and_complete() {
        let mut engine = TweenEngine::new();
        let handle = engine.play(scale_to(0.5, 100.0));
        assert!(engine.is_live(handle));

        assert!(engine.update(50.0).is_empty());
        assert!((engine.value(Property::Scale) - 0.75).abs() < 1e-6);

        let events = engine.update(50.0);
        assert_eq!(events, vec![AnimationEvent::Completed(handle)]);
        assert!(!engine.is_live(handle));
        assert_eq!(engine.value(Property::Scale), 0.5);
    }

    #[test]
    fn test_kill_keeps_current_value() {
        let mut engine = TweenEngine::new();
        let handle = engine.play(scale_to(0.5, 100.0));
        engine.update(50.0);

        assert!(engine.kill(handle));
        assert!(!engine.kill(handle));
        // 被 kill 的时间轴不会再产生完成事件
        assert!(engine.update(100.0).is_empty());
        assert!((engine.value(Property::Scale) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_empty_timeline_completes_on_next_update() {
        let mut engine = TweenEngine::new();
        let handle = engine.play(Timeline::new());

        assert!(engine.is_live(handle));
        assert_eq!(engine.update(0.0), vec![AnimationEvent::Completed(handle)]);
    }

    #[test]
    fn test_explicit_from_applies_immediately() {
        let mut engine = TweenEngine::new();
        engine.play(
            Timeline::new().with(
                Tween::to(Property::CharShuffle(0), 1.0)
                    .from(0.0)
                    .duration(100.0),
            ),
        );

        assert_eq!(engine.value(Property::CharShuffle(0)), 0.0);
    }

    #[test]
    fn test_reset_restores_rest_values() {
        let mut engine = TweenEngine::new();
        engine.set(Property::Blur, 4.0);
        engine.play(scale_to(0.5, 100.0));
        assert_eq!(engine.touched(), vec![Property::Blur]);

        engine.reset();
        assert_eq!(engine.live_count(), 0);
        assert_eq!(engine.value(Property::Blur), 0.0);
        assert_eq!(engine.value(Property::Scale), 1.0);
    }
}
