// crates/mf_physics/src/engine/ppe.rs

//! 压力泊松方程
//!
//! 右端项：
//!
//! ```text
//! b = (ρ/Δt)·D·U* - D·g_bc，固体单元为零
//! ```
//!
//! 以 Jacobi 预条件共轭梯度法直接在负半定的 A 上求解
//! （预条件保留对角符号），以上一步压力作为初值。
//!
//! # 奇异情形
//!
//! 没有压力给定面时 A 的零空间为常数：
//! 1. 求解前将 b 在流体单元上投影为零均值
//! 2. 求解后减去流体单元上的压力均值
//! 3. 固体单元压力重置为零
//!
//! 不收敛时记录告警并返回当前迭代解，不中断运行。

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::fields::VelocityField;
use crate::mask::Mask;
use crate::numerics::linear_algebra::{
    norm_inf, CsrMatrix, JacobiPreconditioner, PcgSolver, SolverConfig, SolverStatus,
};
use crate::state::SolverState;
use mf_foundation::MfError;

/// RHS 均值超过该相对量级时记录日志
const COMPATIBILITY_LOG_THRESHOLD: f64 = 1e-12;

/// PPE 求解报告
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PpeReport {
    /// 是否收敛
    pub converged: bool,
    /// 迭代次数
    pub iterations: usize,
    /// 真实残差 ‖A·p - b‖₂
    pub residual_norm: f64,
    /// 状态码（0 收敛，1 达到最大迭代，2 停滞，3 发散）
    pub status: i32,
    /// 相对容差
    pub tolerance_used: f64,
    /// 绝对容差
    pub atol_used: f64,
    /// A 是否奇异
    pub is_singular: bool,
}

impl Default for PpeReport {
    fn default() -> Self {
        Self {
            converged: true,
            iterations: 0,
            residual_norm: 0.0,
            status: SolverStatus::Converged.code(),
            tolerance_used: 0.0,
            atol_used: 0.0,
            is_singular: false,
        }
    }
}

/// 组装 PPE 右端项
pub fn build_rhs(state: &SolverState, u_star: &VelocityField) -> Vec<f64> {
    let ops = &state.operators;
    let c = &state.constants;
    let factor = c.density / c.dt;

    let mut b = ops.divergence_of(u_star);
    let bc = ops.divergence_of_offset();
    for (cell, (bi, &gi)) in b.iter_mut().zip(&bc).enumerate() {
        *bi = if state.mask.is_solid(cell) {
            0.0
        } else {
            factor * *bi - gi
        };
    }
    b
}

/// 压力泊松求解器
#[derive(Debug)]
pub struct PpeSolver {
    pcg: PcgSolver,
    precond: JacobiPreconditioner,
    is_singular: bool,
}

impl PpeSolver {
    /// 为矩阵 A 创建求解器
    pub fn new(config: SolverConfig, matrix: &CsrMatrix, is_singular: bool) -> Self {
        Self {
            pcg: PcgSolver::new(config),
            precond: JacobiPreconditioner::from_matrix(matrix),
            is_singular,
        }
    }

    /// 求解器配置
    pub fn config(&self) -> &SolverConfig {
        self.pcg.config()
    }

    /// A 是否奇异
    pub fn is_singular(&self) -> bool {
        self.is_singular
    }

    /// 求解 `A p = b`，p 输入为初值，输出为解
    pub fn solve(
        &mut self,
        matrix: &CsrMatrix,
        mask: &Mask,
        b: &[f64],
        p: &mut [f64],
    ) -> PpeReport {
        use crate::numerics::linear_algebra::IterativeSolver;

        let mut rhs: Vec<f64> = b
            .iter()
            .enumerate()
            .map(|(c, &v)| if mask.is_solid(c) { 0.0 } else { v })
            .collect();

        if self.is_singular {
            let mean = fluid_mean(mask, &rhs);
            let scale = norm_inf(&rhs).max(1.0);
            if mean.abs() > COMPATIBILITY_LOG_THRESHOLD * scale {
                debug!("PPE 右端项流体均值 {:.6e} 已投影去除", mean);
            }
            subtract_fluid(mask, &mut rhs, mean);
        }

        for (c, pc) in p.iter_mut().enumerate() {
            if mask.is_solid(c) {
                *pc = 0.0;
            }
        }

        let result = self.pcg.solve(matrix, &rhs, p, &self.precond);

        if self.is_singular {
            let mean = fluid_mean(mask, p);
            subtract_fluid(mask, p, mean);
        }
        for (c, pc) in p.iter_mut().enumerate() {
            if mask.is_solid(c) {
                *pc = 0.0;
            }
        }

        let config = self.pcg.config();
        if !result.is_converged() {
            let err =
                MfError::non_convergence(result.iterations, result.residual_norm, result.tolerance);
            warn!("{} (状态 {:?})", err, result.status);
        }

        PpeReport {
            converged: result.is_converged(),
            iterations: result.iterations,
            residual_norm: result.residual_norm,
            status: result.status.code(),
            tolerance_used: config.rtol,
            atol_used: config.atol,
            is_singular: self.is_singular,
        }
    }
}

/// 流体单元上的均值
pub fn fluid_mean(mask: &Mask, values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for (c, &v) in values.iter().enumerate() {
        if mask.is_fluid(c) {
            sum += v;
            n += 1;
        }
    }
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

fn subtract_fluid(mask: &Mask, values: &mut [f64], shift: f64) {
    for (c, v) in values.iter_mut().enumerate() {
        if mask.is_fluid(c) {
            *v -= shift;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::operators::build_pressure_laplacian;
    use mf_config::{BoundaryCondition, BoundaryTable, Face};

    #[test]
    fn test_singular_solve_has_zero_mean() {
        let g = Grid::unit_cube(4).unwrap();
        let m = Mask::all_fluid(&g);
        let bcs = BoundaryTable::uniform(BoundaryCondition::NoSlip);
        let a = build_pressure_laplacian(&g, &m, &bcs);
        // 不相容的右端项，均值被投影去除
        let b: Vec<f64> = (0..g.n_cells()).map(|c| (c % 7) as f64 - 2.0).collect();
        let mut p = vec![0.0; g.n_cells()];

        let mut solver = PpeSolver::new(SolverConfig::new(1e-10, 500), &a, true);
        let report = solver.solve(&a, &m, &b, &mut p);

        assert!(report.converged);
        assert!(report.is_singular);
        assert!(fluid_mean(&m, &p).abs() < 1e-12);
    }

    #[test]
    fn test_dirichlet_solve_and_solid_anchor() {
        let g = Grid::unit_cube(4).unwrap();
        let m = Mask::all_fluid(&g).with_solid_cells(&[[1, 1, 1]]);
        let bcs = BoundaryTable::uniform(BoundaryCondition::NoSlip)
            .with(Face::XMax, BoundaryCondition::PressureDirichlet { p: 0.0 });
        let a = build_pressure_laplacian(&g, &m, &bcs);
        let b: Vec<f64> = (0..g.n_cells()).map(|c| if m.is_solid(c) { 9.0 } else { 1.0 }).collect();
        let mut p = vec![1.0; g.n_cells()];

        let mut solver = PpeSolver::new(SolverConfig::new(1e-10, 500), &a, false);
        let report = solver.solve(&a, &m, &b, &mut p);

        assert!(report.converged);
        assert_eq!(report.status, 0);
        assert_eq!(p[g.cell_index(1, 1, 1)], 0.0);
        let mut r = a.apply_to(&p);
        for (c, ri) in r.iter_mut().enumerate() {
            if m.is_fluid(c) {
                *ri -= 1.0;
            }
        }
        assert!(norm_inf(&r) < 1e-6);
    }

    #[test]
    fn test_non_convergence_is_reported() {
        let g = Grid::unit_cube(4).unwrap();
        let m = Mask::all_fluid(&g);
        let bcs = BoundaryTable::uniform(BoundaryCondition::PressureDirichlet { p: 0.0 });
        let a = build_pressure_laplacian(&g, &m, &bcs);
        let b: Vec<f64> = (0..g.n_cells()).map(|c| (c as f64).sin()).collect();
        let mut p = vec![0.0; g.n_cells()];

        let mut solver = PpeSolver::new(SolverConfig::new(1e-14, 1).with_atol(0.0), &a, false);
        let report = solver.solve(&a, &m, &b, &mut p);
        assert!(!report.converged);
        assert_eq!(report.iterations, 1);
        assert_eq!(report.status, 1);
    }
}
