// crates/mf_physics/src/engine/mod.rs

//! 时间推进引擎
//!
//! - [`predictor`]: 对流 + 扩散 + 体积力的显式预测
//! - [`ppe`]: 压力泊松方程右端项与 PCG 求解
//! - [`corrector`]: 压力梯度校正
//! - [`diagnostics`]: 健康指标、逐步记录与历史
//! - [`simulation`]: 每步固定顺序的编排器与运行驱动

pub mod corrector;
pub mod diagnostics;
pub mod ppe;
pub mod predictor;
pub mod simulation;

pub use corrector::correct;
pub use diagnostics::{Health, History, StepRecord};
pub use ppe::{build_rhs, fluid_mean, PpeReport, PpeSolver};
pub use predictor::predict;
pub use simulation::{RunSummary, Simulation};
