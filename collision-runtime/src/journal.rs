//! # Journal 模块
//!
//! 引擎决策记录：每次钩子调用、跳过、暂停/恢复通知与拆字失败。
//!
//! ## 设计原则
//!
//! - 只记录对 logo 或外部监听者可见的动作，边沿事件本身走 `tracing`
//! - 所有数据可序列化，宿主可以直接输出为 JSON
//! - 容量有上限，超出后丢弃最早的记录

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::effects::EffectKind;
use crate::observer::TriggerId;

/// 默认容量
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// 记录的事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JournalEvent {
    /// 调用了 `on_enter`
    Enter { trigger: TriggerId, effect: EffectKind },
    /// 调用了 `on_leave`
    Leave { trigger: TriggerId, effect: EffectKind },
    /// 调用了 `on_transition`
    Transition {
        from: TriggerId,
        to: TriggerId,
        effect: EffectKind,
    },
    /// 设置完全一致，只转移了权威
    Skip { from: TriggerId, to: TriggerId },
    /// 派发暂停通知
    Pause,
    /// 派发恢复通知
    Resume,
    /// 退场动画完成，logo 已还原
    Restored,
    /// 拆字失败
    SplitFailed { trigger: TriggerId, reason: String },
}

impl JournalEvent {
    /// 是否为钩子调用
    pub fn is_hook(&self) -> bool {
        matches!(
            self,
            JournalEvent::Enter { .. }
                | JournalEvent::Leave { .. }
                | JournalEvent::Transition { .. }
        )
    }
}

impl std::fmt::Display for JournalEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JournalEvent::Enter { trigger, effect } => write!(f, "enter {trigger} ({effect})"),
            JournalEvent::Leave { trigger, effect } => write!(f, "leave {trigger} ({effect})"),
            JournalEvent::Transition { from, to, effect } => {
                write!(f, "transition {from} -> {to} ({effect})")
            }
            JournalEvent::Skip { from, to } => write!(f, "skip {from} -> {to}"),
            JournalEvent::Pause => write!(f, "pause"),
            JournalEvent::Resume => write!(f, "resume"),
            JournalEvent::Restored => write!(f, "restored"),
            JournalEvent::SplitFailed { trigger, reason } => {
                write!(f, "split-failed {trigger}: {reason}")
            }
        }
    }
}

/// 带时间戳的记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// 引擎时钟（ms）
    pub at_ms: f64,
    pub event: JournalEvent,
}

impl std::fmt::Display for JournalEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms {}", self.at_ms.round() as i64, self.event)
    }
}

/// 记录容器
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journal {
    /// 记录列表（按时间顺序）
    entries: VecDeque<JournalEntry>,
    /// 最大记录数（防止内存无限增长）
    max_entries: usize,
}

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}

impl Journal {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }

    /// 指定最大记录数
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// 追加记录
    pub fn push(&mut self, at_ms: f64, event: JournalEvent) {
        if self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(JournalEntry { at_ms, event });
    }

    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &JournalEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 满足条件的记录数
    pub fn count(&self, predicate: impl Fn(&JournalEvent) -> bool) -> usize {
        self.entries.iter().filter(|e| predicate(&e.event)).count()
    }

    /// 最近一条记录
    pub fn last(&self) -> Option<&JournalEntry> {
        self.entries.back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// 每行一条记录的文本
    pub fn transcript(&self) -> String {
        self.entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
