//! # Animation 模块
//!
//! logo 的补间动画系统。
//!
//! ## 核心设计理念
//!
//! 动画系统只负责 **时间轴管理**：
//! - 知道某个属性从 A 到 B 需要在 duration 内变化
//! - 维护当前值，通过 [`Property`] 查询
//! - **不假设呈现方式**，由 logo 目标把属性值写成内联样式或拆字标记
//!
//! ## 核心概念
//!
//! - [`Property`]: logo 上可动画的属性
//! - [`Tween`] / [`Timeline`]: 补间与时间轴描述
//! - [`Animator`]: 效果钩子依赖的窄接口
//! - [`TweenEngine`]: 默认实现
//! - [`Ease`]: 缓动函数

mod easing;
mod system;
mod tween;

pub use easing::{Ease, EaseMode};
pub use system::{AnimationEvent, Animator, TweenEngine};
pub use tween::{AnimationHandle, Property, Timeline, Tween, TweenState};
