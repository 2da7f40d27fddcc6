// crates/mf_physics/src/numerics/linear_algebra/mod.rs

//! 稀疏线性代数模块
//!
//! 提供离散算子所需的 CSR 稀疏矩阵、预条件器和迭代求解器。
//! 全部使用 f64。

pub mod csr;
pub mod preconditioner;
pub mod solver;
pub mod vector_ops;

pub use csr::{CsrBuilder, CsrMatrix, RowView};
pub use preconditioner::{IdentityPreconditioner, JacobiPreconditioner, Preconditioner};
pub use solver::{
    CgWorkspace, IterativeSolver, PcgSolver, SolverConfig, SolverResult, SolverStatus,
};
pub use vector_ops::{axpy, dot, norm2, norm_inf, xpay};
