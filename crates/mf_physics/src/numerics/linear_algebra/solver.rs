// crates/mf_physics/src/numerics/linear_algebra/solver.rs

//! 迭代线性求解器
//!
//! 求解稀疏线性系统 Ax = b 的预条件共轭梯度法（PCG）。
//!
//! # 收敛判据
//!
//! `‖b − A x_k‖₂ ≤ max(rtol·‖b‖₂, atol)`
//!
//! # 符号
//!
//! PCG 对 (A, b, M) 与 (−A, −b, −M) 产生完全相同的迭代序列，
//! 因此可以直接用于负半定的压力拉普拉斯（配合同号的 Jacobi 预条件）。
//!
//! # 使用示例
//!
//! ```
//! use mf_physics::numerics::linear_algebra::{
//!     CsrBuilder, IterativeSolver, JacobiPreconditioner, PcgSolver, SolverConfig,
//! };
//!
//! let mut builder = CsrBuilder::new_square(2);
//! builder.set(0, 0, 4.0);
//! builder.set(0, 1, 1.0);
//! builder.set(1, 0, 1.0);
//! builder.set(1, 1, 3.0);
//! let matrix = builder.build();
//!
//! let b = vec![1.0, 2.0];
//! let mut x = vec![0.0; 2];
//! let precond = JacobiPreconditioner::from_matrix(&matrix);
//! let mut solver = PcgSolver::new(SolverConfig::new(1e-10, 100));
//!
//! let result = solver.solve(&matrix, &b, &mut x, &precond);
//! assert!(result.is_converged());
//! ```

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::csr::CsrMatrix;
use super::preconditioner::Preconditioner;
use super::vector_ops::{axpy, dot, norm2, xpay};

/// p'Ap 低于该值视为停滞
const STAGNATION_THRESHOLD: f64 = 1e-30;

/// 求解器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// 相对收敛容差
    pub rtol: f64,
    /// 绝对收敛容差
    pub atol: f64,
    /// 最大迭代次数
    pub max_iter: usize,
    /// 是否打印迭代信息
    pub verbose: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-12,
            max_iter: 1000,
            verbose: false,
        }
    }
}

impl SolverConfig {
    /// 创建求解器配置
    pub fn new(rtol: f64, max_iter: usize) -> Self {
        Self {
            rtol,
            max_iter,
            ..Default::default()
        }
    }

    /// 设置绝对容差
    pub fn with_atol(mut self, atol: f64) -> Self {
        self.atol = atol;
        self
    }

    /// 对给定右端项的有效容差 `max(rtol·‖b‖, atol)`
    #[inline]
    pub fn effective_tolerance(&self, b_norm: f64) -> f64 {
        self.atol.max(self.rtol * b_norm)
    }
}

/// 求解器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverStatus {
    /// 收敛
    Converged,
    /// 达到最大迭代次数
    MaxIterationsReached,
    /// 发散（残差非有限）
    Diverged,
    /// 停滞
    Stagnated,
}

impl SolverStatus {
    /// 整数状态码：0 收敛，1 达到最大迭代，2 停滞，3 发散
    pub fn code(self) -> i32 {
        match self {
            Self::Converged => 0,
            Self::MaxIterationsReached => 1,
            Self::Stagnated => 2,
            Self::Diverged => 3,
        }
    }
}

/// 求解器结果
#[derive(Debug, Clone)]
pub struct SolverResult {
    /// 求解状态
    pub status: SolverStatus,
    /// 迭代次数
    pub iterations: usize,
    /// 最终残差范数（真实残差 ‖b − Ax‖₂）
    pub residual_norm: f64,
    /// 初始残差范数
    pub initial_residual_norm: f64,
    /// 使用的有效容差
    pub tolerance: f64,
}

impl SolverResult {
    /// 是否成功收敛
    pub fn is_converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }
}

/// CG 求解器工作区
///
/// 预分配的工作向量，跨时间步复用
#[derive(Debug, Clone, Default)]
pub struct CgWorkspace {
    /// 残差向量
    pub r: Vec<f64>,
    /// 搜索方向
    pub p: Vec<f64>,
    /// A*p
    pub ap: Vec<f64>,
    /// 预条件后的残差
    pub z: Vec<f64>,
}

impl CgWorkspace {
    /// 创建新的工作区
    pub fn new(n: usize) -> Self {
        Self {
            r: vec![0.0; n],
            p: vec![0.0; n],
            ap: vec![0.0; n],
            z: vec![0.0; n],
        }
    }

    /// 调整工作区大小并清零
    pub fn resize(&mut self, n: usize) {
        for v in [&mut self.r, &mut self.p, &mut self.ap, &mut self.z] {
            v.clear();
            v.resize(n, 0.0);
        }
    }
}

/// 迭代求解器 trait
pub trait IterativeSolver {
    /// 求解线性系统 Ax = b
    ///
    /// `x` 输入初始猜测，输出解。
    fn solve<P: Preconditioner>(
        &mut self,
        matrix: &CsrMatrix,
        b: &[f64],
        x: &mut [f64],
        precond: &P,
    ) -> SolverResult;
}

/// 预条件共轭梯度法求解器
#[derive(Debug)]
pub struct PcgSolver {
    config: SolverConfig,
    workspace: CgWorkspace,
}

impl PcgSolver {
    /// 创建 PCG 求解器
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            workspace: CgWorkspace::default(),
        }
    }

    /// 获取配置
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// 使用外部工作区求解
    pub fn solve_with_workspace<P: Preconditioner>(
        &self,
        matrix: &CsrMatrix,
        b: &[f64],
        x: &mut [f64],
        precond: &P,
        ws: &mut CgWorkspace,
    ) -> SolverResult {
        let n = b.len();
        assert_eq!(x.len(), n, "x 长度必须等于 b 长度");
        ws.resize(n);

        // r = b - A*x
        matrix.apply(x, &mut ws.r);
        for (ri, &bi) in ws.r.iter_mut().zip(b) {
            *ri = bi - *ri;
        }

        let initial_norm = norm2(&ws.r);
        let tolerance = self.config.effective_tolerance(norm2(b));

        let finish = |status: SolverStatus, iterations: usize, x: &[f64], ws: &mut CgWorkspace| {
            // 报告真实残差而非递推残差
            matrix.apply(x, &mut ws.ap);
            let mut sum = 0.0;
            for (&api, &bi) in ws.ap.iter().zip(b) {
                let d = bi - api;
                sum += d * d;
            }
            SolverResult {
                status,
                iterations,
                residual_norm: sum.sqrt(),
                initial_residual_norm: initial_norm,
                tolerance,
            }
        };

        if initial_norm <= tolerance {
            return finish(SolverStatus::Converged, 0, &*x, ws);
        }

        // z = M^{-1} * r, p = z
        precond.apply(&ws.r, &mut ws.z);
        ws.p.copy_from_slice(&ws.z);
        let mut rz = dot(&ws.r, &ws.z);

        for iter in 0..self.config.max_iter {
            matrix.apply(&ws.p, &mut ws.ap);

            let pap = dot(&ws.p, &ws.ap);
            if pap.abs() < STAGNATION_THRESHOLD {
                return finish(SolverStatus::Stagnated, iter, &*x, ws);
            }

            let alpha = rz / pap;
            axpy(alpha, &ws.p, x);
            axpy(-alpha, &ws.ap, &mut ws.r);

            let res_norm = norm2(&ws.r);
            if self.config.verbose {
                trace!("PCG iter {}: residual = {:.6e}", iter + 1, res_norm);
            }

            if !res_norm.is_finite() {
                return finish(SolverStatus::Diverged, iter + 1, &*x, ws);
            }
            if res_norm <= tolerance {
                return finish(SolverStatus::Converged, iter + 1, &*x, ws);
            }

            precond.apply(&ws.r, &mut ws.z);
            let rz_new = dot(&ws.r, &ws.z);
            let beta = rz_new / rz;
            rz = rz_new;

            // p = z + beta * p
            xpay(&ws.z, beta, &mut ws.p);
        }

        finish(SolverStatus::MaxIterationsReached, self.config.max_iter, &*x, ws)
    }
}

impl IterativeSolver for PcgSolver {
    fn solve<P: Preconditioner>(
        &mut self,
        matrix: &CsrMatrix,
        b: &[f64],
        x: &mut [f64],
        precond: &P,
    ) -> SolverResult {
        let mut ws = std::mem::take(&mut self.workspace);
        let result = self.solve_with_workspace(matrix, b, x, precond, &mut ws);
        self.workspace = ws;
        result
    }
}
