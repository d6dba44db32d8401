//! # Effect Hooks
//!
//! 效果描述符的三个钩子：
//!
//! - `on_enter`：停止活动动画，还原原始状态，再从原始状态动画到效果的"作用态"。
//!   字符类效果需要先拆字，返回 [`EnterOutcome::AwaitingSplit`]，
//!   拆字就绪后由引擎调用 [`EffectDescriptor::finish_split`] 开始动画。
//! - `on_leave`：停止活动动画，从当前状态动画回原始状态，完成后还原标记与样式。
//! - `on_transition`：停止活动动画，从当前状态直接动画到新的作用态。
//!   改写标记的效果没有此钩子；logo 标记已被拆开时也不能过渡（均返回 `None`）。

use super::builder::EffectDescriptor;
use super::params::{Direction, EffectParams, MoveDistance};
use crate::animation::{AnimationHandle, Animator, Property, Timeline, Tween};
use crate::dom::Dom;
use crate::splitter::{SplitTicket, TextSplitter};
use crate::target::LogoTarget;

/// 判定属性已离开静止值的容差
const MOVED_EPSILON: f32 = 1e-4;

/// 钩子执行上下文
pub struct EffectContext<'a> {
    pub dom: &'a mut dyn Dom,
    pub animator: &'a mut dyn Animator,
    pub splitter: &'a mut dyn TextSplitter,
    pub target: &'a mut LogoTarget,
    /// 引擎时钟（ms）
    pub now_ms: f64,
}

/// 入场结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnterOutcome {
    /// 动画已开始
    Started(AnimationHandle),
    /// 等待拆字
    AwaitingSplit(SplitTicket),
}

impl EffectDescriptor {
    /// 入场
    pub fn on_enter(&self, ctx: &mut EffectContext<'_>) -> EnterOutcome {
        ctx.target.kill_live(&mut *ctx.animator);
        ctx.target.restore(&mut *ctx.dom, &mut *ctx.animator);

        if self.kind().mutates_markup() {
            let text = ctx.dom.text_content(ctx.target.element());
            return EnterOutcome::AwaitingSplit(ctx.splitter.request(&text, ctx.now_ms));
        }

        let mut timeline = Timeline::new();
        for (property, value) in self.engaged_state(ctx) {
            timeline.push(self.tween(property, value));
        }
        EnterOutcome::Started(start(ctx, timeline))
    }

    /// 拆字就绪后开始字符动画
    pub fn finish_split(&self, ctx: &mut EffectContext<'_>, chars: Vec<char>) -> AnimationHandle {
        ctx.target.kill_live(&mut *ctx.animator);

        let count = chars.len();
        let mut timeline = Timeline::new();
        let steps = match self.settings().params {
            EffectParams::TextSplit { distance, stagger_ms } => {
                for i in 0..count {
                    let offset = if i % 2 == 0 { -distance } else { distance };
                    timeline.push(
                        self.tween(Property::CharOffsetY(i), offset)
                            .delay(i as f32 * stagger_ms),
                    );
                }
                1
            }
            EffectParams::Shuffle {
                iterations,
                stagger_ms,
            } => {
                for i in 0..count {
                    timeline.push(
                        self.tween(Property::CharShuffle(i), 1.0)
                            .from(0.0)
                            .delay(i as f32 * stagger_ms),
                    );
                }
                iterations
            }
            _ => 1,
        };

        let handle = ctx.animator.play(timeline);
        ctx.target.set_live(handle);
        ctx.target.split(&mut *ctx.dom, &*ctx.animator, chars, steps);
        handle
    }

    /// 退场
    pub fn on_leave(&self, ctx: &mut EffectContext<'_>) -> AnimationHandle {
        ctx.target.kill_live(&mut *ctx.animator);

        let stagger = self.char_stagger();
        let mut timeline = Timeline::new();
        for property in moved_properties(&*ctx.animator) {
            let delay = char_index(property).map_or(0.0, |i| i as f32 * stagger);
            timeline.push(self.tween(property, property.rest_value()).delay(delay));
        }

        if let EffectParams::Shuffle { stagger_ms, .. } = self.settings().params
            && let Some(count) = ctx.target.char_count()
        {
            for i in 0..count {
                timeline.push(
                    self.tween(Property::CharShuffle(i), 1.0)
                        .from(0.0)
                        .delay(i as f32 * stagger_ms),
                );
            }
        }

        let handle = start(ctx, timeline);
        ctx.target.restore_on_complete(handle);
        handle
    }

    /// 平滑过渡到本效果的作用态
    pub fn on_transition(&self, ctx: &mut EffectContext<'_>) -> Option<AnimationHandle> {
        if !self.has_transition() || ctx.target.char_count().is_some() {
            return None;
        }
        ctx.target.kill_live(&mut *ctx.animator);

        let engaged = self.engaged_state(ctx);
        let mut timeline = Timeline::new();
        for property in moved_properties(&*ctx.animator) {
            if !engaged.iter().any(|(p, _)| *p == property) {
                timeline.push(self.tween(property, property.rest_value()));
            }
        }
        for (property, value) in engaged {
            timeline.push(self.tween(property, value));
        }
        Some(start(ctx, timeline))
    }

    /// 整体样式效果的作用态
    fn engaged_state(&self, ctx: &EffectContext<'_>) -> Vec<(Property, f32)> {
        let rect = ctx.target.rect(&*ctx.dom, 0.0);
        match self.settings().params {
            EffectParams::Scale { scale } => vec![(Property::Scale, scale / 100.0)],
            EffectParams::Blur { blur, opacity } => {
                vec![(Property::Blur, blur), (Property::Opacity, opacity / 100.0)]
            }
            EffectParams::Rotation { degrees } => vec![(Property::Rotation, degrees)],
            EffectParams::SlideText { distance } => vec![
                (Property::TranslateY, -rect.height * distance / 100.0),
                (Property::Opacity, 0.0),
            ],
            EffectParams::MoveAway {
                distance,
                direction,
            } => {
                let amount = match distance {
                    MoveDistance::Px(px) => px,
                    MoveDistance::Percent(pct) => rect.width * pct / 100.0,
                    MoveDistance::Auto => match direction {
                        Direction::Left => rect.left + rect.width,
                        Direction::Right => ctx.dom.viewport().width - rect.left,
                    },
                };
                let x = match direction {
                    Direction::Left => -amount,
                    Direction::Right => amount,
                };
                vec![(Property::TranslateX, x)]
            }
            EffectParams::TextSplit { .. } | EffectParams::Shuffle { .. } => Vec::new(),
        }
    }

    fn tween(&self, property: Property, value: f32) -> Tween {
        let timing = self.settings().timing;
        Tween::to(property, value)
            .duration(timing.duration_ms())
            .ease(timing.ease)
    }

    fn char_stagger(&self) -> f32 {
        match self.settings().params {
            EffectParams::TextSplit { stagger_ms, .. }
            | EffectParams::Shuffle { stagger_ms, .. } => stagger_ms,
            _ => 0.0,
        }
    }
}

/// 播放时间轴并登记为活动句柄
fn start(ctx: &mut EffectContext<'_>, timeline: Timeline) -> AnimationHandle {
    let handle = ctx.animator.play(timeline);
    ctx.target.set_live(handle);
    ctx.target.render(&mut *ctx.dom, &*ctx.animator);
    handle
}

/// 当前偏离静止值的属性
fn moved_properties(animator: &dyn Animator) -> Vec<Property> {
    animator
        .touched()
        .into_iter()
        .filter(|&p| (animator.value(p) - p.rest_value()).abs() > MOVED_EPSILON)
        .collect()
}

fn char_index(property: Property) -> Option<usize> {
    match property {
        Property::CharOffsetY(i) | Property::CharOpacity(i) | Property::CharShuffle(i) => Some(i),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationEvent, TweenEngine};
    use crate::config::EffectSettings;
    use crate::dom::{MemoryDom, NodeSpec};
    use crate::effects::build;
    use crate::splitter::{CharSplitter, SplitPoll};

    struct Rig {
        dom: MemoryDom,
        animator: TweenEngine,
        splitter: CharSplitter,
        target: LogoTarget,
    }

    impl Rig {
        fn new() -> Self {
            let mut dom = MemoryDom::default();
            let body = dom.body();
            let logo = dom.append(
                body,
                NodeSpec::new("a")
                    .class("logo")
                    .at(20.0, 40.0)
                    .span(24.0, 160.0)
                    .fixed()
                    .html("Acme")
                    .style("color: red;"),
            );
            let target = LogoTarget::capture(&dom, logo);
            Self {
                dom,
                animator: TweenEngine::new(),
                splitter: CharSplitter::new(),
                target,
            }
        }

        fn ctx(&mut self) -> EffectContext<'_> {
            EffectContext {
                dom: &mut self.dom,
                animator: &mut self.animator,
                splitter: &mut self.splitter,
                target: &mut self.target,
                now_ms: 0.0,
            }
        }

        /// 推进动画直到全部完成，处理完成事件
        fn settle(&mut self) {
            for _ in 0..200 {
                let events = self.animator.update(16.0);
                self.target.render(&mut self.dom, &self.animator);
                for AnimationEvent::Completed(handle) in events {
                    self.target.on_completed(&mut self.dom, &mut self.animator, handle);
                }
            }
        }

        fn style(&self) -> String {
            self.dom.inline_style(self.target.element())
        }
    }

    fn effect(number: u32, over: Option<EffectSettings>) -> EffectDescriptor {
        build(number, over.as_ref(), &EffectSettings::default()).unwrap()
    }

    #[test]
    fn test_scale_enter_and_leave() {
        let mut rig = Rig::new();
        let scale = effect(1, None);

        let outcome = scale.on_enter(&mut rig.ctx());
        assert!(matches!(outcome, EnterOutcome::Started(_)));
        rig.settle();
        assert_eq!(rig.style(), "color: red; transform: scale(0.8);");

        scale.on_leave(&mut rig.ctx());
        rig.settle();
        assert_eq!(rig.style(), "color: red;");
        assert_eq!(rig.target.live(), None);
    }

    #[test]
    fn test_transition_between_settings() {
        let mut rig = Rig::new();
        let first = effect(5, None);
        let second = effect(
            5,
            Some(EffectSettings {
                rotation: Some(90.0),
                ..Default::default()
            }),
        );

        first.on_enter(&mut rig.ctx());
        rig.settle();
        assert_eq!(rig.style(), "color: red; transform: rotate(360deg);");

        assert!(second.on_transition(&mut rig.ctx()).is_some());
        rig.settle();
        assert_eq!(rig.style(), "color: red; transform: rotate(90deg);");
    }

    #[test]
    fn test_move_away_auto_distance() {
        let mut rig = Rig::new();
        let left = effect(7, None);
        left.on_enter(&mut rig.ctx());
        rig.settle();
        // left + width = 24 + 160
        assert_eq!(rig.style(), "color: red; transform: translate(-184px, 0px);");

        let right = effect(
            7,
            Some(EffectSettings {
                move_direction: Some("right".into()),
                ..Default::default()
            }),
        );
        right.on_transition(&mut rig.ctx());
        rig.settle();
        // viewport 1280 - left 24
        assert_eq!(rig.style(), "color: red; transform: translate(1256px, 0px);");
    }

    #[test]
    fn test_split_effect_awaits_splitter() {
        let mut rig = Rig::new();
        let split = effect(3, None);

        let EnterOutcome::AwaitingSplit(ticket) = split.on_enter(&mut rig.ctx()) else {
            panic!("拆字效果应等待拆字");
        };
        assert!(split.on_transition(&mut rig.ctx()).is_none());

        let SplitPoll::Ready(chars) = rig.splitter.poll(ticket, 0.0) else {
            panic!("同步拆字应立即就绪");
        };
        split.finish_split(&mut rig.ctx(), chars);
        rig.settle();
        assert_eq!(rig.target.char_count(), Some(4));
        assert!(rig.dom.inner_html(rig.target.element()).contains("translateY(-20px)"));

        split.on_leave(&mut rig.ctx());
        rig.settle();
        assert_eq!(rig.dom.inner_html(rig.target.element()), "Acme");
        assert_eq!(rig.style(), "color: red;");
    }

    #[test]
    fn test_no_transition_over_split_markup() {
        let mut rig = Rig::new();
        let split = effect(3, None);
        let scale = effect(1, None);

        let EnterOutcome::AwaitingSplit(ticket) = split.on_enter(&mut rig.ctx()) else {
            panic!("拆字效果应等待拆字");
        };
        let SplitPoll::Ready(chars) = rig.splitter.poll(ticket, 0.0) else {
            panic!("同步拆字应立即就绪");
        };
        split.finish_split(&mut rig.ctx(), chars);
        rig.settle();

        assert!(scale.on_transition(&mut rig.ctx()).is_none());
        assert_eq!(rig.target.char_count(), Some(4));
    }

    #[test]
    fn test_leave_without_changes_still_restores() {
        let mut rig = Rig::new();
        let shuffle = effect(4, None);

        // 拆字从未完成就退场
        shuffle.on_enter(&mut rig.ctx());
        let handle = shuffle.on_leave(&mut rig.ctx());
        assert!(rig.animator.is_live(handle));

        rig.settle();
        assert_eq!(rig.dom.inner_html(rig.target.element()), "Acme");
    }
}
