//! # Collision Runtime
//!
//! logo 碰撞跟踪与效果仲裁的核心运行时库。
//!
//! ## 架构概述
//!
//! `collision-runtime` 是纯逻辑核心，不依赖任何 IO 或渲染引擎。
//! 页面通过 [`Dom`] trait 接入，宿主负责驱动滚动与时间：
//!
//! ```text
//! Host                              Runtime
//!   │                                  │
//!   │──── on_scroll / advance ───────►│ 边沿 → 仲裁 → 钩子
//!   │                                  │
//!   │◄─── logo 标记/样式、暂停/恢复 ──│ 经由 Dom 写回
//!   │                                  │
//! ```
//!
//! ## 核心类型
//!
//! - [`Bootstrap`]：页面级入口，持有全部实例
//! - [`CollisionEngine`]：单个 logo 实例的仲裁引擎
//! - [`InstanceConfig`]：实例配置
//! - [`EffectDescriptor`]：效果描述符（入场 / 退场 / 过渡钩子）
//! - [`Journal`]：引擎决策记录
//!
//! ## 使用示例
//!
//! ```ignore
//! use collision_runtime::{Bootstrap, CharSplitter, MemoryDom, PageConfig};
//!
//! let page = PageConfig::from_json(text)?;
//! let mut dom = MemoryDom::from_spec(&spec);
//! let mut bootstrap = Bootstrap::start(page, &mut dom, 0.0, |_| Box::new(CharSplitter::new()));
//!
//! loop {
//!     bootstrap.on_scroll(&mut dom, scroll_y);
//!     bootstrap.advance(&mut dom, 16.0);
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`config`] / [`viewport`]：实例配置与响应式取值
//! - [`dom`]：页面接口、选择器与内存页面
//! - [`locator`] / [`resolver`]：区域定位与效果解析
//! - [`effects`]：效果注册、参数归一化与钩子
//! - [`animation`]：补间引擎
//! - [`observer`] / [`target`] / [`splitter`]：位置观察、logo 状态表、拆字协作方
//! - [`engine`] / [`bootstrap`]：仲裁引擎与页面入口
//! - [`journal`] / [`diagnostic`]：决策记录与配置检查

pub mod animation;
pub mod bootstrap;
pub mod config;
pub mod diagnostic;
pub mod dom;
pub mod effects;
pub mod engine;
pub mod error;
pub mod journal;
pub mod locator;
pub mod observer;
pub mod resolver;
pub mod splitter;
pub mod target;
pub mod viewport;

// 重导出核心类型
pub use animation::{
    AnimationEvent, AnimationHandle, Animator, Ease, Property, Timeline, Tween, TweenEngine,
};
pub use bootstrap::{Bootstrap, InstanceFailure};
pub use config::{EffectSettings, InstanceConfig, PageConfig, RegionMapping};
pub use diagnostic::{Diagnostic, DiagnosticLevel, DiagnosticResult, analyze_config};
pub use dom::{Dom, ElementId, MemoryDom, NodeSpec, PageSpec, Rect, Selector, Viewport};
pub use effects::{EffectDescriptor, EffectKind, EffectParams, build};
pub use engine::{CollisionEngine, Trigger};
pub use error::{
    CollisionError, CollisionResult, ConfigError, EngineError, SelectorError, SplitError,
};
pub use journal::{Journal, JournalEntry, JournalEvent};
pub use locator::RegionLocator;
pub use observer::{Edge, RegionObserver, TriggerId, Zone};
pub use resolver::{EffectResolver, ResolvedRegion};
pub use splitter::{
    CharSplitter, DeferredSplitter, SplitPoll, SplitTicket, TextSplitter, UnavailableSplitter,
};
pub use target::LogoTarget;
pub use viewport::{Responsive, ViewportClass};
