//! # Engine 模块
//!
//! 碰撞仲裁引擎：每个 logo 实例一个。
//!
//! ## 驱动模型
//!
//! ```text
//! Host                               CollisionEngine
//!   │── on_scroll(dom, y) ──────────────►│ 观察器产生边沿 → 仲裁
//!   │── advance(dom, dt_ms) ────────────►│ 动画推进 / 延迟入场 / 拆字轮询
//!   │── refresh(dom) ───────────────────►│ 视口变化后重算阈值
//!   │◄── logo 标记与样式、暂停/恢复事件 ──│ 通过 Dom 写回
//! ```
//!
//! ## 仲裁规则
//!
//! 任意时刻至多一个触发器拥有 logo 的控制权（权威触发器），且它总在活动集合中。
//!
//! | 边沿 | 条件 | 动作 |
//! |------|------|------|
//! | 进入 | 无权威 | 成为权威，交互效果先派发暂停，再 `on_enter` |
//! | 进入 | 另一个权威 | 交接：跳过 / 平滑过渡 / 退场后延迟入场 |
//! | 进入 | 自身已是权威 | 无动作 |
//! | 离开 | 非权威 | 仅移出活动集合 |
//! | 离开 | 权威，集合变空 | `on_leave`，退场完成后恢复 |
//! | 离开 | 权威，剩余全是非交互效果 | `on_leave`，退场完成后恢复，不接管 |
//! | 离开 | 权威，剩余含交互效果 | 向下离开选最小下标，向上离开选最大下标，再交接 |
//!
//! 同一次滚动产生的边沿先处理全部进入、再处理全部离开
//! （向下滚动按下标升序，向上滚动按降序），相邻区域因此直接交接。
//!
//! ## 视觉纪元
//!
//! 每次调用钩子都会推进视觉纪元，并作废尚未执行的延迟入场与未完成的拆字请求。

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::animation::{AnimationEvent, AnimationHandle, Animator};
use crate::config::InstanceConfig;
use crate::dom::{Dom, ElementId};
use crate::effects::{EffectContext, EffectDescriptor, EnterOutcome, build, defaults};
use crate::error::EngineError;
use crate::journal::{Journal, JournalEvent};
use crate::locator::RegionLocator;
use crate::observer::{Edge, RegionObserver, TriggerId};
use crate::resolver::EffectResolver;
use crate::splitter::{SplitPoll, SplitTicket, TextSplitter};
use crate::target::LogoTarget;
use crate::viewport::ViewportClass;

/// 触发器：区域与其效果描述符
#[derive(Debug, Clone)]
pub struct Trigger {
    id: TriggerId,
    region: ElementId,
    effect: EffectDescriptor,
}

impl Trigger {
    pub fn id(&self) -> TriggerId {
        self.id
    }

    /// 区域元素
    pub fn region(&self) -> ElementId {
        self.region
    }

    pub fn effect(&self) -> &EffectDescriptor {
        &self.effect
    }
}

/// 退场后延迟执行的入场
#[derive(Debug, Clone, Copy)]
struct DeferredEnter {
    due_ms: f64,
    epoch: u64,
}

/// 等待拆字的入场
#[derive(Debug, Clone, Copy)]
struct PendingSplit {
    ticket: SplitTicket,
    trigger: TriggerId,
    epoch: u64,
}

/// 碰撞仲裁引擎
pub struct CollisionEngine {
    /// 实例标识
    id: String,
    config: InstanceConfig,
    /// 暂停/恢复事件的派发目标
    event_target: ElementId,
    /// 触发器（下标即 [`TriggerId`]，文档顺序）
    triggers: Vec<Trigger>,
    observers: Vec<RegionObserver>,
    /// 活动集合
    active: BTreeSet<TriggerId>,
    /// 权威触发器
    authoritative: Option<TriggerId>,

    target: LogoTarget,
    animator: Box<dyn Animator>,
    splitter: Box<dyn TextSplitter>,

    /// 是否有尚未恢复的暂停
    pause_outstanding: bool,
    /// 等待该句柄完成后派发的恢复
    deferred_resume: Option<AnimationHandle>,
    deferred_enter: Option<DeferredEnter>,
    pending_split: Option<PendingSplit>,
    visual_epoch: u64,

    /// 引擎时钟（ms）
    now_ms: f64,
    scroll_y: f32,
    viewport_class: ViewportClass,

    journal: Journal,
    pauses: usize,
    resumes: usize,
}

impl std::fmt::Debug for CollisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionEngine")
            .field("id", &self.id)
            .field("triggers", &self.triggers.len())
            .field("active", &self.active)
            .field("authoritative", &self.authoritative)
            .field("pause_outstanding", &self.pause_outstanding)
            .field("now_ms", &self.now_ms)
            .finish()
    }
}

impl CollisionEngine {
    /// 初始化引擎
    ///
    /// 找不到 logo 时返回错误；单个区域的选择器或效果编号无效只会跳过该区域。
    /// 当前滚动位置已处于触发带内的区域会立即收到"从上方进入"边沿。
    pub fn init(
        config: InstanceConfig,
        dom: &mut dyn Dom,
        scroll_y: f32,
        animator: Box<dyn Animator>,
        splitter: Box<dyn TextSplitter>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let logo = match dom.query(&config.logo_selector) {
            Ok(Some(el)) => el,
            Ok(None) => {
                return Err(EngineError::LogoNotFound {
                    instance: config.id.clone(),
                    selector: config.logo_selector.clone(),
                });
            }
            Err(source) => {
                return Err(EngineError::InvalidLogoSelector {
                    instance: config.id.clone(),
                    source,
                });
            }
        };
        let event_target = resolve_event_target(&config, &*dom, logo);

        let regions = RegionLocator::new(&config, logo).locate(&*dom);
        let resolver = EffectResolver::new(&config.mappings);
        let mut triggers = Vec::with_capacity(regions.len());
        for region in regions {
            let (number, over) = match resolver.resolve(&*dom, region) {
                Some(resolved) => (resolved.effect_number, resolved.override_settings()),
                None => (config.default_effect, None),
            };
            let Some(effect) = build(number, over, &config.settings) else {
                warn!(instance = %config.id, region = %region, number, "区域效果无效，跳过");
                continue;
            };
            triggers.push(Trigger {
                id: TriggerId(triggers.len()),
                region,
                effect,
            });
        }
        let observers = triggers.iter().map(|t| RegionObserver::new(t.id)).collect();

        info!(
            instance = %config.id,
            logo = %logo,
            triggers = triggers.len(),
            "碰撞引擎已初始化"
        );

        let mut engine = Self {
            id: config.id.clone(),
            event_target,
            triggers,
            observers,
            active: BTreeSet::new(),
            authoritative: None,
            target: LogoTarget::capture(&*dom, logo),
            animator,
            splitter,
            pause_outstanding: false,
            deferred_resume: None,
            deferred_enter: None,
            pending_split: None,
            visual_epoch: 0,
            now_ms: 0.0,
            scroll_y,
            viewport_class: ViewportClass::from_width(dom.viewport().width),
            journal: Journal::new(),
            pauses: 0,
            resumes: 0,
            config,
        };
        engine.sync(dom);
        Ok(engine)
    }

    // ========== 宿主驱动 ==========

    /// 滚动到新位置
    pub fn on_scroll(&mut self, dom: &mut dyn Dom, scroll_y: f32) {
        let descending = scroll_y < self.scroll_y;
        self.scroll_y = scroll_y;
        self.sweep(dom, descending);
    }

    /// 推进时钟
    pub fn advance(&mut self, dom: &mut dyn Dom, dt_ms: f32) {
        let dt_ms = dt_ms.max(0.0);
        self.now_ms += f64::from(dt_ms);

        let events = self.animator.update(dt_ms);
        self.target.render(dom, &*self.animator);
        for AnimationEvent::Completed(handle) in events {
            if self.target.on_completed(dom, self.animator.as_mut(), handle) {
                debug!(instance = %self.id, %handle, "退场完成，logo 已还原");
                self.journal.push(self.now_ms, JournalEvent::Restored);
            }
            if self.deferred_resume == Some(handle) {
                self.deferred_resume = None;
                self.resume(dom);
            }
        }

        if let Some(deferred) = self.deferred_enter
            && self.now_ms >= deferred.due_ms
        {
            self.deferred_enter = None;
            if deferred.epoch == self.visual_epoch
                && let Some(id) = self.authoritative
            {
                self.run_enter(dom, id);
            }
        }

        self.poll_split(dom);
    }

    /// 视口或布局变化后重算阈值
    ///
    /// 不重建触发器，也不重置动画状态；位置因此越过阈值的区域照常产生边沿。
    pub fn refresh(&mut self, dom: &mut dyn Dom) {
        let class = ViewportClass::from_width(dom.viewport().width);
        if class != self.viewport_class {
            debug!(instance = %self.id, from = ?self.viewport_class, to = ?class, "视口类别变化");
            self.viewport_class = class;
        }
        self.sweep(dom, false);
    }

    /// 卸载：停止动画、还原 logo、补齐未恢复的暂停
    pub fn teardown(mut self, dom: &mut dyn Dom) -> Journal {
        self.begin_hook(dom);
        self.target.kill_live(self.animator.as_mut());
        self.target.restore(dom, self.animator.as_mut());
        self.resume(dom);
        self.authoritative = None;
        self.active.clear();
        self.journal.push(self.now_ms, JournalEvent::Restored);
        info!(instance = %self.id, "碰撞引擎已卸载");
        self.journal
    }

    /// 直接注入一个边沿事件
    ///
    /// 正常情况下边沿由 [`on_scroll`](Self::on_scroll) 产生。
    pub fn handle_edge(&mut self, dom: &mut dyn Dom, id: TriggerId, edge: Edge) {
        if id.0 >= self.triggers.len() {
            warn!(instance = %self.id, trigger = %id, "未知的触发器");
            return;
        }
        debug!(instance = %self.id, trigger = %id, %edge, "边沿");

        if edge.is_enter() {
            self.active.insert(id);
            self.on_enter_edge(dom, id);
        } else {
            self.active.remove(&id);
            self.on_leave_edge(dom, id, edge);
        }
    }

    // ========== 查询 ==========

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &InstanceConfig {
        &self.config
    }

    /// logo 元素
    pub fn logo(&self) -> ElementId {
        self.target.element()
    }

    pub fn event_target(&self) -> ElementId {
        self.event_target
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    pub fn trigger(&self, id: TriggerId) -> Option<&Trigger> {
        self.triggers.get(id.0)
    }

    pub fn authoritative(&self) -> Option<TriggerId> {
        self.authoritative
    }

    /// 活动集合（升序）
    pub fn active_triggers(&self) -> impl Iterator<Item = TriggerId> + '_ {
        self.active.iter().copied()
    }

    pub fn is_pause_outstanding(&self) -> bool {
        self.pause_outstanding
    }

    /// 已派发的暂停次数
    pub fn pause_count(&self) -> usize {
        self.pauses
    }

    /// 已派发的恢复次数
    pub fn resume_count(&self) -> usize {
        self.resumes
    }

    /// 是否有入场在等待拆字
    pub fn is_awaiting_split(&self) -> bool {
        self.pending_split.is_some()
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    pub fn viewport_class(&self) -> ViewportClass {
        self.viewport_class
    }

    /// logo 的标记与内联样式是否与初始化时的快照一致
    pub fn is_pristine(&self, dom: &dyn Dom) -> bool {
        let logo = self.target.element();
        dom.inner_html(logo) == self.target.pristine_html()
            && dom.inline_style(logo) == self.target.pristine_style()
    }

    /// 触发器当前的起止阈值（按当前几何即时计算）
    pub fn threshold_band(&self, dom: &dyn Dom, id: TriggerId) -> Option<(f32, f32)> {
        self.triggers.get(id.0).map(|t| self.band(dom, t))
    }

    // ========== 边沿处理 ==========

    fn on_enter_edge(&mut self, dom: &mut dyn Dom, id: TriggerId) {
        match self.authoritative {
            None => {
                self.flush_deferred_resume(dom);
                self.authoritative = Some(id);
                if self.triggers[id.0].effect.is_interactive() {
                    self.pause(dom);
                }
                self.run_enter(dom, id);
            }
            Some(current) if current == id => {
                debug!(instance = %self.id, trigger = %id, "已是权威触发器");
            }
            Some(current) => self.hand_off(dom, current, id),
        }
    }

    fn on_leave_edge(&mut self, dom: &mut dyn Dom, id: TriggerId, edge: Edge) {
        if self.authoritative != Some(id) {
            return;
        }

        let any_interactive = self
            .active
            .iter()
            .any(|t| self.triggers[t.0].effect.is_interactive());
        if !any_interactive {
            // 剩余的都是非交互效果时不接管
            self.release(dom, id);
            return;
        }

        let candidate = match edge {
            Edge::LeaveAbove => self.active.iter().next_back(),
            _ => self.active.iter().next(),
        };
        if let Some(&incoming) = candidate {
            debug!(instance = %self.id, from = %id, to = %incoming, %edge, "选出接管者");
            self.hand_off(dom, id, incoming);
        }
    }

    /// 权威从 `outgoing` 交给 `incoming`
    fn hand_off(&mut self, dom: &mut dyn Dom, outgoing: TriggerId, incoming: TriggerId) {
        let from = &self.triggers[outgoing.0].effect;
        let to = &self.triggers[incoming.0].effect;

        if to.is_identical_to(from) {
            debug!(instance = %self.id, from = %outgoing, to = %incoming, "设置一致，跳过");
            self.authoritative = Some(incoming);
            self.journal.push(
                self.now_ms,
                JournalEvent::Skip {
                    from: outgoing,
                    to: incoming,
                },
            );
            return;
        }

        let from_interactive = from.is_interactive();
        let to_interactive = to.is_interactive();

        // 延迟入场尚未执行时，logo 仍处于上一个效果的退场中
        if to.kind() == from.kind() && to.has_transition() && self.deferred_enter.is_none() {
            self.begin_hook(dom);
            let effect = &self.triggers[incoming.0].effect;
            let mut ctx = EffectContext {
                dom: &mut *dom,
                animator: self.animator.as_mut(),
                splitter: self.splitter.as_mut(),
                target: &mut self.target,
                now_ms: self.now_ms,
            };
            if effect.on_transition(&mut ctx).is_some() {
                self.authoritative = Some(incoming);
                self.journal.push(
                    self.now_ms,
                    JournalEvent::Transition {
                        from: outgoing,
                        to: incoming,
                        effect: effect.kind(),
                    },
                );
                return;
            }
        }

        self.call_leave(dom, outgoing);
        self.authoritative = Some(incoming);
        if from_interactive && !to_interactive {
            self.resume(dom);
        }
        if to_interactive && !from_interactive {
            self.pause(dom);
        }
        let due_ms = self.now_ms + defaults::REENTER_DELAY_MS;
        debug!(instance = %self.id, trigger = %incoming, due_ms, "延迟入场");
        self.deferred_enter = Some(DeferredEnter {
            due_ms,
            epoch: self.visual_epoch,
        });
    }

    /// 权威离开且无人接管
    fn release(&mut self, dom: &mut dyn Dom, id: TriggerId) {
        let handle = self.call_leave(dom, id);
        self.authoritative = None;
        if !self.pause_outstanding {
            return;
        }
        if self.animator.is_live(handle) {
            self.deferred_resume = Some(handle);
        } else {
            self.resume(dom);
        }
    }

    // ========== 钩子调用 ==========

    /// 任何钩子调用之前：旧句柄上的恢复立即派发，作废延迟入场与拆字请求
    fn begin_hook(&mut self, dom: &mut dyn Dom) {
        self.flush_deferred_resume(dom);
        self.visual_epoch += 1;
        self.deferred_enter = None;
        if let Some(pending) = self.pending_split.take() {
            debug!(instance = %self.id, trigger = %pending.trigger, "放弃拆字请求");
            self.splitter.cancel(pending.ticket);
        }
    }

    fn run_enter(&mut self, dom: &mut dyn Dom, id: TriggerId) {
        self.begin_hook(dom);
        let effect = &self.triggers[id.0].effect;
        let mut ctx = EffectContext {
            dom: &mut *dom,
            animator: self.animator.as_mut(),
            splitter: self.splitter.as_mut(),
            target: &mut self.target,
            now_ms: self.now_ms,
        };
        let outcome = effect.on_enter(&mut ctx);
        self.journal.push(
            self.now_ms,
            JournalEvent::Enter {
                trigger: id,
                effect: effect.kind(),
            },
        );

        if let EnterOutcome::AwaitingSplit(ticket) = outcome {
            self.pending_split = Some(PendingSplit {
                ticket,
                trigger: id,
                epoch: self.visual_epoch,
            });
            self.poll_split(dom);
        }
    }

    fn call_leave(&mut self, dom: &mut dyn Dom, id: TriggerId) -> AnimationHandle {
        self.begin_hook(dom);
        let effect = &self.triggers[id.0].effect;
        let mut ctx = EffectContext {
            dom: &mut *dom,
            animator: self.animator.as_mut(),
            splitter: self.splitter.as_mut(),
            target: &mut self.target,
            now_ms: self.now_ms,
        };
        let handle = effect.on_leave(&mut ctx);
        self.journal.push(
            self.now_ms,
            JournalEvent::Leave {
                trigger: id,
                effect: effect.kind(),
            },
        );
        handle
    }

    fn poll_split(&mut self, dom: &mut dyn Dom) {
        let Some(pending) = self.pending_split else {
            return;
        };
        if pending.epoch != self.visual_epoch {
            self.pending_split = None;
            self.splitter.cancel(pending.ticket);
            return;
        }

        match self.splitter.poll(pending.ticket, self.now_ms) {
            SplitPoll::Pending => {}
            SplitPoll::Ready(chars) => {
                self.pending_split = None;
                let effect = &self.triggers[pending.trigger.0].effect;
                let mut ctx = EffectContext {
                    dom: &mut *dom,
                    animator: self.animator.as_mut(),
                    splitter: self.splitter.as_mut(),
                    target: &mut self.target,
                    now_ms: self.now_ms,
                };
                let handle = effect.finish_split(&mut ctx, chars);
                debug!(instance = %self.id, trigger = %pending.trigger, %handle, "拆字完成");
            }
            SplitPoll::Failed(err) => {
                self.pending_split = None;
                warn!(instance = %self.id, trigger = %pending.trigger, error = %err, "拆字失败，入场放弃");
                self.journal.push(
                    self.now_ms,
                    JournalEvent::SplitFailed {
                        trigger: pending.trigger,
                        reason: err.to_string(),
                    },
                );
            }
        }
    }

    // ========== 暂停 / 恢复 ==========

    fn pause(&mut self, dom: &mut dyn Dom) {
        if self.pause_outstanding {
            return;
        }
        dom.dispatch_event(self.event_target, &self.config.pause_event);
        self.pause_outstanding = true;
        self.pauses += 1;
        self.journal.push(self.now_ms, JournalEvent::Pause);
    }

    fn resume(&mut self, dom: &mut dyn Dom) {
        self.deferred_resume = None;
        if !self.pause_outstanding {
            return;
        }
        dom.dispatch_event(self.event_target, &self.config.resume_event);
        self.pause_outstanding = false;
        self.resumes += 1;
        self.journal.push(self.now_ms, JournalEvent::Resume);
    }

    /// 挂在句柄上的恢复立即派发（该句柄即将被新的钩子停止）
    fn flush_deferred_resume(&mut self, dom: &mut dyn Dom) {
        if let Some(handle) = self.deferred_resume.take() {
            debug!(instance = %self.id, %handle, "句柄被取代，恢复提前派发");
            self.resume(dom);
        }
    }

    // ========== 几何 ==========

    /// `start = 区域顶 - logo 底 + offset_start + 全局偏移`，
    /// `end = 区域底 - logo 顶 + offset_end + 全局偏移`
    fn band(&self, dom: &dyn Dom, trigger: &Trigger) -> (f32, f32) {
        let region = dom.bounding_rect(trigger.region, 0.0);
        let logo = self.target.rect(dom, self.scroll_y);
        let global = self.config.global_offset.resolve(self.viewport_class);
        let start = region.top - logo.bottom() + trigger.effect.offset_start() + global;
        let end = region.bottom() - logo.top + trigger.effect.offset_end() + global;
        (start, end)
    }

    /// 初始同步：已在触发带内的区域按升序进入
    fn sync(&mut self, dom: &mut dyn Dom) {
        let bands: Vec<_> = self.triggers.iter().map(|t| self.band(&*dom, t)).collect();
        let scroll = self.scroll_y;
        let entered: Vec<_> = self
            .observers
            .iter_mut()
            .zip(bands)
            .filter_map(|(observer, (start, end))| {
                observer.sync(scroll, start, end).map(|edge| (observer.trigger(), edge))
            })
            .collect();
        for (id, edge) in entered {
            self.handle_edge(dom, id, edge);
        }
    }

    /// 按当前滚动位置更新所有观察器并派发边沿
    fn sweep(&mut self, dom: &mut dyn Dom, descending: bool) {
        let bands: Vec<_> = self.triggers.iter().map(|t| self.band(&*dom, t)).collect();
        let scroll = self.scroll_y;

        let mut entering = Vec::new();
        let mut leaving = Vec::new();
        for (observer, (start, end)) in self.observers.iter_mut().zip(bands) {
            for edge in observer.update(scroll, start, end) {
                if edge.is_enter() {
                    entering.push((observer.trigger(), edge));
                } else {
                    leaving.push((observer.trigger(), edge));
                }
            }
        }
        if descending {
            entering.reverse();
            leaving.reverse();
        }

        for (id, edge) in entering.into_iter().chain(leaving) {
            self.handle_edge(dom, id, edge);
        }
    }
}

/// 事件目标：配置的选择器，找不到时退回 logo
fn resolve_event_target(config: &InstanceConfig, dom: &dyn Dom, logo: ElementId) -> ElementId {
    let Some(selector) = config.event_target_selector.as_deref() else {
        return logo;
    };
    match dom.query(selector) {
        Ok(Some(el)) => el,
        Ok(None) => {
            warn!(instance = %config.id, selector, "找不到事件目标，改用 logo");
            logo
        }
        Err(e) => {
            warn!(instance = %config.id, error = %e, "事件目标选择器无效，改用 logo");
            logo
        }
    }
}
