// crates/mf_physics/src/numerics/linear_algebra/preconditioner.rs

//! 预条件器模块
//!
//! 预条件器用于加速迭代求解器的收敛。核心思想是将原问题 Ax = b
//! 转换为条件数更好的问题 M⁻¹Ax = M⁻¹b。
//!
//! # 预条件器类型
//!
//! - [`IdentityPreconditioner`]: 恒等预条件器（无预条件）
//! - [`JacobiPreconditioner`]: Jacobi 预条件器（对角预条件）
//!
//! # 使用示例
//!
//! ```
//! use mf_physics::numerics::linear_algebra::{
//!     CsrMatrix, JacobiPreconditioner, Preconditioner,
//! };
//!
//! let matrix = CsrMatrix::diagonal(&[2.0, -4.0]);
//! let precond = JacobiPreconditioner::from_matrix(&matrix);
//!
//! let mut z = vec![0.0; 2];
//! precond.apply(&[1.0, 1.0], &mut z);
//! assert_eq!(z, vec![0.5, -0.25]);
//! ```

use super::csr::CsrMatrix;

/// 对角元绝对值低于该阈值时视为零，使用单位预条件
const ZERO_DIAGONAL_THRESHOLD: f64 = 1e-14;

/// 预条件器 trait
///
/// 核心操作是 `apply`: z = M⁻¹ * r
pub trait Preconditioner: Send + Sync {
    /// 应用预条件器: z = M⁻¹ * r
    fn apply(&self, r: &[f64], z: &mut [f64]);

    /// 获取预条件器名称
    fn name(&self) -> &'static str;

    /// 更新预条件器（矩阵值变化但结构不变时）
    fn update(&mut self, matrix: &CsrMatrix);
}

/// 恒等预条件器（无预条件）
#[derive(Debug, Clone, Default)]
pub struct IdentityPreconditioner;

impl Preconditioner for IdentityPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        z.copy_from_slice(r);
    }

    fn name(&self) -> &'static str {
        "Identity"
    }

    fn update(&mut self, _matrix: &CsrMatrix) {}
}

/// Jacobi 预条件器（对角预条件）
///
/// M = diag(A)，即 z_i = r_i / A_ii。
///
/// 保留对角元的符号：对负半定的压力拉普拉斯，M 与 A 同号，
/// PCG 迭代与对 (−A, −b, −M) 求解完全一致。
#[derive(Debug, Clone)]
pub struct JacobiPreconditioner {
    inv_diag: Vec<f64>,
}

impl JacobiPreconditioner {
    /// 从 CSR 矩阵创建 Jacobi 预条件器
    pub fn from_matrix(matrix: &CsrMatrix) -> Self {
        Self::from_diagonal(&matrix.extract_diagonal())
    }

    /// 从对角向量创建 Jacobi 预条件器
    pub fn from_diagonal(diag: &[f64]) -> Self {
        let inv_diag = diag
            .iter()
            .map(|&d| {
                if d.abs() > ZERO_DIAGONAL_THRESHOLD {
                    1.0 / d
                } else {
                    1.0
                }
            })
            .collect();
        Self { inv_diag }
    }

    /// 获取对角元素倒数引用
    pub fn inv_diagonal(&self) -> &[f64] {
        &self.inv_diag
    }
}

impl Preconditioner for JacobiPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        debug_assert_eq!(r.len(), z.len());
        debug_assert_eq!(r.len(), self.inv_diag.len());

        for ((zi, &ri), &inv_d) in z.iter_mut().zip(r).zip(&self.inv_diag) {
            *zi = ri * inv_d;
        }
    }

    fn name(&self) -> &'static str {
        "Jacobi"
    }

    fn update(&mut self, matrix: &CsrMatrix) {
        *self = Self::from_matrix(matrix);
    }
}
