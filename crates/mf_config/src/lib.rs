// crates/mf_config/src/lib.rs

//! MacFlow Config Layer (Layer 2)
//!
//! 配置层，负责输入 JSON 的解析与语义校验。
//!
//! # 模块概览
//!
//! - [`simulation_config`]: SimulationConfig 输入模型、默认值与校验
//! - [`boundary`]: 规范面、边界记录与类型化边界表
//! - [`error`]: 配置错误类型
//!
//! # 层级架构
//!
//! ```text
//! Layer 5: mf_cli        ─> 读取配置、驱动模拟
//! Layer 4: mf_io         ─> 状态视图与快照
//! Layer 3: mf_physics    ─> 由 SimulationConfig 构建求解器
//! Layer 2: mf_config     ─> SimulationConfig, BoundaryTable (本层)
//! Layer 1: mf_foundation
//! ```
//!
//! # 示例
//!
//! ```
//! use mf_config::{SimulationConfig, BoundaryRecord, Face};
//!
//! let config = SimulationConfig::cube(3)
//!     .with_boundary(BoundaryRecord::inflow(Face::XMin, [1.0, 0.0, 0.0]))
//!     .with_boundary(BoundaryRecord::pressure(Face::XMax, 0.0));
//! assert!(config.validate().is_ok());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod boundary;
pub mod error;
pub mod simulation_config;

/// 层级标识
pub const LAYER: u8 = 2;

// 重导出核心类型
pub use boundary::{
    BoundaryCondition, BoundaryKind, BoundaryRecord, BoundaryTable, BoundaryValues, Face,
};
pub use error::ConfigError;
pub use simulation_config::{
    AdvectionScheme, DomainConfig, ExternalForces, FluidProperties, GeometryConfig,
    InitialConditions, SimulationConfig, SimulationParameters, FLATTENING_ORDER,
};
