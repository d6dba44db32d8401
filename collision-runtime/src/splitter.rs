//! # Splitter 模块
//!
//! 拆字协作方。两个字符类效果（拆字、乱序）在入场前需要把 logo 文本拆成逐字符节点，
//! 这一步是异步的：请求后通过 [`TextSplitter::poll`] 轮询结果。
//!
//! | 实现 | 行为 |
//! |------|------|
//! | [`CharSplitter`] | 首次轮询即就绪 |
//! | [`DeferredSplitter`] | 模块首次被请求后需要加载一段时间 |
//! | [`UnavailableSplitter`] | 模块加载失败，始终返回错误 |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SplitError;

/// 拆字请求票据
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SplitTicket(pub u64);

/// 轮询结果
#[derive(Debug, Clone, PartialEq)]
pub enum SplitPoll {
    /// 尚未完成
    Pending,
    /// 拆分完成
    Ready(Vec<char>),
    /// 拆分失败
    Failed(SplitError),
}

/// 拆字接口
pub trait TextSplitter {
    /// 发起拆字请求
    fn request(&mut self, text: &str, now_ms: f64) -> SplitTicket;

    /// 轮询请求结果；`Ready` / `Failed` 之后票据失效
    fn poll(&mut self, ticket: SplitTicket, now_ms: f64) -> SplitPoll;

    /// 放弃请求
    fn cancel(&mut self, ticket: SplitTicket);
}

/// 票据簿：记录未完成的请求文本
#[derive(Debug, Default)]
struct Requests {
    pending: BTreeMap<SplitTicket, String>,
    next: u64,
}

impl Requests {
    fn insert(&mut self, text: &str) -> SplitTicket {
        self.next += 1;
        let ticket = SplitTicket(self.next);
        self.pending.insert(ticket, text.to_string());
        ticket
    }

    fn take(&mut self, ticket: SplitTicket) -> SplitPoll {
        match self.pending.remove(&ticket) {
            Some(text) => SplitPoll::Ready(text.chars().collect()),
            None => SplitPoll::Failed(SplitError::UnknownTicket(ticket.0)),
        }
    }
}

/// 同步拆字：首次轮询即就绪
#[derive(Debug, Default)]
pub struct CharSplitter {
    requests: Requests,
}

impl CharSplitter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TextSplitter for CharSplitter {
    fn request(&mut self, text: &str, _now_ms: f64) -> SplitTicket {
        self.requests.insert(text)
    }

    fn poll(&mut self, ticket: SplitTicket, _now_ms: f64) -> SplitPoll {
        self.requests.take(ticket)
    }

    fn cancel(&mut self, ticket: SplitTicket) {
        self.requests.pending.remove(&ticket);
    }
}

/// 延迟加载的拆字模块
///
/// 第一次请求时开始加载，`load_ms` 之后所有请求都可以就绪。
#[derive(Debug)]
pub struct DeferredSplitter {
    load_ms: f64,
    loading_since: Option<f64>,
    requests: Requests,
}

impl DeferredSplitter {
    pub fn new(load_ms: f64) -> Self {
        Self {
            load_ms,
            loading_since: None,
            requests: Requests::default(),
        }
    }

    /// 模块是否已加载
    pub fn is_loaded(&self, now_ms: f64) -> bool {
        self.loading_since
            .is_some_and(|since| now_ms - since >= self.load_ms)
    }
}

impl TextSplitter for DeferredSplitter {
    fn request(&mut self, text: &str, now_ms: f64) -> SplitTicket {
        self.loading_since.get_or_insert(now_ms);
        self.requests.insert(text)
    }

    fn poll(&mut self, ticket: SplitTicket, now_ms: f64) -> SplitPoll {
        if !self.requests.pending.contains_key(&ticket) {
            return SplitPoll::Failed(SplitError::UnknownTicket(ticket.0));
        }
        if self.is_loaded(now_ms) {
            self.requests.take(ticket)
        } else {
            SplitPoll::Pending
        }
    }

    fn cancel(&mut self, ticket: SplitTicket) {
        self.requests.pending.remove(&ticket);
    }
}

/// 不可用的拆字模块
#[derive(Debug, Clone)]
pub struct UnavailableSplitter {
    reason: String,
    next: u64,
}

impl UnavailableSplitter {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            next: 0,
        }
    }
}

impl TextSplitter for UnavailableSplitter {
    fn request(&mut self, _text: &str, _now_ms: f64) -> SplitTicket {
        self.next += 1;
        SplitTicket(self.next)
    }

    fn poll(&mut self, _ticket: SplitTicket, _now_ms: f64) -> SplitPoll {
        SplitPoll::Failed(SplitError::Unavailable(self.reason.clone()))
    }

    fn cancel(&mut self, _ticket: SplitTicket) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_splitter() {
        let mut splitter = CharSplitter::new();
        let ticket = splitter.request("Acme", 0.0);

        assert_eq!(splitter.poll(ticket, 0.0), SplitPoll::Ready(vec!['A', 'c', 'm', 'e']));
        // 票据只能兑现一次
        assert_eq!(
            splitter.poll(ticket, 0.0),
            SplitPoll::Failed(SplitError::UnknownTicket(ticket.0))
        );
    }

    #[test]
    fn test_deferred_splitter_loads_once() {
        let mut splitter = DeferredSplitter::new(120.0);
        let first = splitter.request("ab", 1000.0);

        assert_eq!(splitter.poll(first, 1100.0), SplitPoll::Pending);
        assert_eq!(splitter.poll(first, 1120.0), SplitPoll::Ready(vec!['a', 'b']));

        // 已加载的模块立即就绪
        let second = splitter.request("c", 2000.0);
        assert_eq!(splitter.poll(second, 2000.0), SplitPoll::Ready(vec!['c']));
    }

    #[test]
    fn test_cancel() {
        let mut splitter = DeferredSplitter::new(0.0);
        let ticket = splitter.request("x", 0.0);
        splitter.cancel(ticket);

        assert!(matches!(splitter.poll(ticket, 10.0), SplitPoll::Failed(_)));
    }

    #[test]
    fn test_unavailable_splitter() {
        let mut splitter = UnavailableSplitter::new("加载超时");
        let ticket = splitter.request("Acme", 0.0);

        assert_eq!(
            splitter.poll(ticket, 500.0),
            SplitPoll::Failed(SplitError::Unavailable("加载超时".into()))
        );
    }
}
