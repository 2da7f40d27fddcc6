// crates/mf_io/src/lib.rs

//! MacFlow IO 模块 (Layer 4)
//!
//! 数值内核的外部协作者，只在步边界读取求解器状态。
//!
//! # 模块
//!
//! - [`state_view`]: JSON 安全的状态视图
//! - [`schema`]: 状态视图的结构校验
//! - [`writer`]: 快照与诊断历史输出
//! - [`error`]: IO 错误类型
//!
//! # 使用示例
//!
//! ```
//! use mf_config::SimulationConfig;
//! use mf_io::{validate_state_view, StateView};
//! use mf_physics::Simulation;
//!
//! let sim = Simulation::new(&SimulationConfig::cube(2)).unwrap();
//! let value = StateView::from_state(sim.state()).to_value().unwrap();
//! assert!(validate_state_view(&value).is_ok());
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod schema;
pub mod state_view;
pub mod writer;

/// 层级标识
pub const LAYER: u8 = 4;

pub use error::{IoError, IoResult};
pub use schema::{schema_report, validate_state_view};
pub use state_view::{FieldsView, GridView, OperatorsView, SparseDescriptor, StateView};
pub use writer::{read_snapshot, snapshot_file_name, write_history, HistoryWriter, SnapshotWriter};
