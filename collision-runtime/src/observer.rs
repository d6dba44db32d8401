//! # Observer 模块
//!
//! 每个触发器一个位置观察器：比较滚动位置与区域的起止阈值，
//! 在区域跨越阈值时产生四种边沿事件。
//!
//! ```text
//!            start                 end
//!   Before ────┼────── Inside ──────┼───── After
//!
//!   Before → Inside   EnterFromAbove
//!   Inside → After    LeaveBelow
//!   After  → Inside   EnterFromBelow
//!   Inside → Before   LeaveAbove
//! ```
//!
//! 一次滚动越过整个区域时，依次产生进入与离开两个边沿。

use serde::{Deserialize, Serialize};

/// 触发器标识（文档顺序的 arena 下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriggerId(pub usize);

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 滚动位置相对区域的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Zone {
    /// 尚未到达区域
    #[default]
    Before,
    /// 位于区域的触发带内
    Inside,
    /// 已经越过区域
    After,
}

impl Zone {
    /// `start <= scroll <= end` 时为 Inside
    pub fn of(scroll: f32, start: f32, end: f32) -> Self {
        if scroll < start {
            Zone::Before
        } else if scroll > end {
            Zone::After
        } else {
            Zone::Inside
        }
    }
}

/// 边沿事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    /// 向下滚动进入
    EnterFromAbove,
    /// 向下滚动离开
    LeaveBelow,
    /// 向上滚动进入
    EnterFromBelow,
    /// 向上滚动离开
    LeaveAbove,
}

impl Edge {
    pub fn is_enter(&self) -> bool {
        matches!(self, Edge::EnterFromAbove | Edge::EnterFromBelow)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Edge::EnterFromAbove => "enter-from-above",
            Edge::LeaveBelow => "leave-below",
            Edge::EnterFromBelow => "enter-from-below",
            Edge::LeaveAbove => "leave-above",
        }
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 区域观察器
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionObserver {
    trigger: TriggerId,
    zone: Zone,
}

impl RegionObserver {
    pub fn new(trigger: TriggerId) -> Self {
        Self {
            trigger,
            zone: Zone::Before,
        }
    }

    pub fn trigger(&self) -> TriggerId {
        self.trigger
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// 首次同步：已处于触发带内的区域视为从上方进入，已越过的区域静默记录
    pub fn sync(&mut self, scroll: f32, start: f32, end: f32) -> Option<Edge> {
        self.zone = Zone::of(scroll, start, end);
        (self.zone == Zone::Inside).then_some(Edge::EnterFromAbove)
    }

    /// 按新的滚动位置更新，返回产生的边沿（按发生顺序）
    pub fn update(&mut self, scroll: f32, start: f32, end: f32) -> Vec<Edge> {
        let next = Zone::of(scroll, start, end);
        let edges = match (self.zone, next) {
            (Zone::Before, Zone::Inside) => vec![Edge::EnterFromAbove],
            (Zone::Before, Zone::After) => vec![Edge::EnterFromAbove, Edge::LeaveBelow],
            (Zone::Inside, Zone::After) => vec![Edge::LeaveBelow],
            (Zone::Inside, Zone::Before) => vec![Edge::LeaveAbove],
            (Zone::After, Zone::Inside) => vec![Edge::EnterFromBelow],
            (Zone::After, Zone::Before) => vec![Edge::EnterFromBelow, Edge::LeaveAbove],
            _ => Vec::new(),
        };
        self.zone = next;
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_boundaries_inclusive() {
        assert_eq!(Zone::of(99.0, 100.0, 200.0), Zone::Before);
        assert_eq!(Zone::of(100.0, 100.0, 200.0), Zone::Inside);
        assert_eq!(Zone::of(200.0, 100.0, 200.0), Zone::Inside);
        assert_eq!(Zone::of(201.0, 100.0, 200.0), Zone::After);
    }

    #[test]
    fn test_scroll_down_and_up() {
        let mut observer = RegionObserver::new(TriggerId(0));

        assert_eq!(observer.update(150.0, 100.0, 200.0), vec![Edge::EnterFromAbove]);
        assert!(observer.update(160.0, 100.0, 200.0).is_empty());
        assert_eq!(observer.update(250.0, 100.0, 200.0), vec![Edge::LeaveBelow]);
        assert_eq!(observer.update(180.0, 100.0, 200.0), vec![Edge::EnterFromBelow]);
        assert_eq!(observer.update(50.0, 100.0, 200.0), vec![Edge::LeaveAbove]);
    }

    #[test]
    fn test_jump_over_region() {
        let mut observer = RegionObserver::new(TriggerId(3));

        assert_eq!(
            observer.update(500.0, 100.0, 200.0),
            vec![Edge::EnterFromAbove, Edge::LeaveBelow]
        );
        assert_eq!(
            observer.update(0.0, 100.0, 200.0),
            vec![Edge::EnterFromBelow, Edge::LeaveAbove]
        );
    }

    #[test]
    fn test_initial_sync() {
        let mut inside = RegionObserver::new(TriggerId(0));
        assert_eq!(inside.sync(150.0, 100.0, 200.0), Some(Edge::EnterFromAbove));

        let mut after = RegionObserver::new(TriggerId(1));
        assert_eq!(after.sync(500.0, 100.0, 200.0), None);
        assert_eq!(after.zone(), Zone::After);
    }
}
