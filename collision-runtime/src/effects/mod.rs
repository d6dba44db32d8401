//! # Effects 模块
//!
//! 效果的注册、参数归一化、描述符构建与钩子实现。
//!
//! ## 模块结构
//!
//! - `registry`: 效果类型定义与默认参数（唯一来源）
//! - `params`: 逐参数优先级解析，产出带标签的参数变体
//! - `builder`: 效果编号 + 覆盖参数 → [`EffectDescriptor`]
//! - `hooks`: `on_enter` / `on_leave` / `on_transition` / `finish_split`

mod builder;
mod hooks;
mod params;
mod registry;

pub use builder::{EffectDescriptor, build};
pub use hooks::{EffectContext, EnterOutcome};
pub use params::{Direction, EffectParams, MoveDistance, NormalizedSettings, Timing, normalize};
pub use registry::{EffectKind, defaults};
