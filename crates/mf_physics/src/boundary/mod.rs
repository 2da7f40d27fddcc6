// crates/mf_physics/src/boundary/mod.rs

//! 边界条件
//!
//! 边界类型与边界表定义在配置层，此处重导出并提供：
//!
//! - [`engine`]: 预测前 / 校正后的边界处理与出口通量平衡
//! - [`ghost`]: 带虚拟层的扩展场及其同步规则

pub mod engine;
pub mod ghost;

pub use engine::{BoundaryEngine, BoundaryFlux};
pub use ghost::{pressure_rules, GhostField, HaloRule};
pub use mf_config::{BoundaryCondition, BoundaryKind, BoundaryRecord, BoundaryTable, Face};
