// crates/mf_physics/src/lib.rs

//! MacFlow 数值内核 (Layer 3)
//!
//! 交错 MAC 网格上的三维不可压 Navier–Stokes 投影法求解器：
//! - 网格与掩码 (grid, mask)
//! - MAC 场存储 (fields)
//! - 稀疏线性代数 (numerics) - CSR、Jacobi 预条件、PCG
//! - 离散算子 (operators) - D、G、L、A 与对流
//! - 边界条件引擎 (boundary)
//! - 求解器状态与不变量 (state)
//! - 时间推进引擎 (engine) - 预测、PPE、校正、诊断、编排
//!
//! # 特性开关
//!
//! - `parallel`: 基于 `rayon` 的行并行矩阵-向量乘法
//!
//! # 示例
//!
//! ```
//! use mf_config::{BoundaryRecord, Face, SimulationConfig};
//! use mf_physics::Simulation;
//!
//! let config = SimulationConfig::cube(3)
//!     .with_boundary(BoundaryRecord::inflow(Face::XMin, [1.0, 0.0, 0.0]))
//!     .with_boundary(BoundaryRecord::pressure(Face::XMax, 0.0))
//!     .with_time(0.01, 0.02);
//! let mut sim = Simulation::new(&config).unwrap();
//! let record = sim.step().unwrap();
//! assert!(record.divergence_norm < 1e-6);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod boundary;
pub mod engine;
pub mod fields;
pub mod grid;
pub mod mask;
pub mod numerics;
pub mod operators;
pub mod state;

/// 层级标识
pub const LAYER: u8 = 3;

// 重导出常用类型
pub use boundary::{BoundaryEngine, GhostField, HaloRule};
pub use engine::{Health, History, PpeReport, RunSummary, Simulation, StepRecord};
pub use fields::{allocate_fields, MacFields, VelocityField};
pub use grid::Grid;
pub use mask::{DerivedMasks, Mask};
pub use operators::{Advection, AdvectionScheme, FaceKind, FaceTable, Operators};
pub use state::{Constants, Lifecycle, SolverState};
