// crates/mf_physics/src/engine/diagnostics.rs

//! 诊断与健康指标
//!
//! 每步计算：
//!
//! | 指标 | 定义 |
//! |------|------|
//! | divergence_norm | ‖D·[U,V,W]‖₂ / max(1, 流体单元数) |
//! | max_velocity | 所有面上 \|U\|∪\|V\|∪\|W\| 的最大值 |
//! | cfl | Δt · max(\|u\|/dx + \|v\|/dy + \|w\|/dz)，单元中心平均速度 |
//! | energy | ½ρ · mean(u² + v² + w²)，流体单元平均 |
//! | ppe_iterations | PPE 求解迭代次数 |

use serde::{Deserialize, Serialize};

use crate::engine::ppe::PpeReport;
use crate::fields::VelocityField;
use crate::grid::Grid;
use crate::mask::Mask;
use crate::numerics::linear_algebra::{norm2, norm_inf};
use crate::operators::Operators;
use crate::state::Constants;

/// 最近一步的健康指标
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Health {
    /// 归一化散度二范数
    pub divergence_norm: f64,
    /// 散度无穷范数
    pub divergence_inf: f64,
    /// 最大速度
    pub max_velocity: f64,
    /// CFL 数
    pub cfl: f64,
    /// 动能密度
    pub energy: f64,
    /// PPE 迭代次数
    pub ppe_iterations: usize,
    /// PPE 是否收敛
    pub ppe_converged: bool,
    /// PPE 残差
    pub ppe_residual: f64,
}

impl Health {
    /// 由当前速度场计算
    pub fn measure(
        grid: &Grid,
        mask: &Mask,
        operators: &Operators,
        constants: &Constants,
        vel: &VelocityField,
        ppe: &PpeReport,
    ) -> Self {
        let div = operators.divergence_of(vel);
        let n_fluid = mask.fluid_count().max(1) as f64;
        let (cfl, energy) = cell_centered_metrics(grid, mask, constants, vel);

        Self {
            divergence_norm: norm2(&div) / n_fluid,
            divergence_inf: norm_inf(&div),
            max_velocity: vel.max_abs(),
            cfl,
            energy,
            ppe_iterations: ppe.iterations,
            ppe_converged: ppe.converged,
            ppe_residual: ppe.residual_norm,
        }
    }
}

/// 单元中心速度上的 CFL 与动能密度
fn cell_centered_metrics(
    grid: &Grid,
    mask: &Mask,
    constants: &Constants,
    vel: &VelocityField,
) -> (f64, f64) {
    let mut cfl_max: f64 = 0.0;
    let mut ke_sum = 0.0;
    let mut n_fluid = 0usize;

    for c in 0..grid.n_cells() {
        if mask.is_solid(c) {
            continue;
        }
        let ijk = grid.cell_coords(c);
        let mut courant = 0.0;
        let mut speed2 = 0.0;
        for axis in 0..3 {
            let comp = vel.component(axis);
            let mut upper = ijk;
            upper[axis] += 1;
            let uc = 0.5 * (comp[grid.face_at(axis, ijk)] + comp[grid.face_at(axis, upper)]);
            courant += uc.abs() / grid.h(axis);
            speed2 += uc * uc;
        }
        cfl_max = cfl_max.max(courant);
        ke_sum += speed2;
        n_fluid += 1;
    }

    let energy = if n_fluid > 0 {
        0.5 * constants.density * ke_sum / n_fluid as f64
    } else {
        0.0
    };
    (constants.dt * cfl_max, energy)
}

/// 逐步诊断记录（交给外部协作者）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// 步末时间
    pub time: f64,
    /// 步序号（从 1 开始）
    pub step_index: usize,
    /// 归一化散度
    pub divergence_norm: f64,
    /// 最大速度
    pub max_velocity: f64,
    /// PPE 迭代次数
    pub ppe_iterations: usize,
    /// 动能密度
    pub energy: f64,
    /// CFL 数
    pub cfl: f64,
    /// PPE 是否收敛
    pub ppe_converged: bool,
}

impl StepRecord {
    /// 由健康指标构建
    pub fn new(time: f64, step_index: usize, health: &Health) -> Self {
        Self {
            time,
            step_index,
            divergence_norm: health.divergence_norm,
            max_velocity: health.max_velocity,
            ppe_iterations: health.ppe_iterations,
            energy: health.energy,
            cfl: health.cfl,
            ppe_converged: health.ppe_converged,
        }
    }
}

/// 诊断历史（并列数组，只追加）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    /// 时间
    pub time: Vec<f64>,
    /// 归一化散度
    pub divergence_norm: Vec<f64>,
    /// 最大速度
    pub max_velocity: Vec<f64>,
    /// PPE 迭代次数
    pub ppe_iterations: Vec<usize>,
    /// 动能密度
    pub energy: Vec<f64>,
}

impl History {
    /// 追加一条记录
    pub fn push(&mut self, record: &StepRecord) {
        self.time.push(record.time);
        self.divergence_norm.push(record.divergence_norm);
        self.max_velocity.push(record.max_velocity);
        self.ppe_iterations.push(record.ppe_iterations);
        self.energy.push(record.energy);
    }

    /// 记录条数
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use mf_config::{AdvectionScheme, BoundaryCondition, BoundaryTable};

    #[test]
    fn test_uniform_flow_metrics() {
        let g = Grid::build([(0.0, 2.0), (0.0, 1.0), (0.0, 1.0)], [4, 2, 2]).unwrap();
        let m = Mask::all_fluid(&g);
        let bcs = BoundaryTable::uniform(BoundaryCondition::FreeSlip);
        let ops = Operators::build(&g, &m, &bcs, AdvectionScheme::Upwind);
        let constants = Constants::new(2.0, 0.0, 0.1, &g, DVec3::ZERO);
        let vel = VelocityField::uniform(&g, DVec3::new(1.0, -2.0, 0.0));

        let h = Health::measure(&g, &m, &ops, &constants, &vel, &PpeReport::default());
        assert!(h.divergence_norm < 1e-12);
        assert_eq!(h.max_velocity, 2.0);
        // dt·(1/0.5 + 2/0.5)
        assert!((h.cfl - 0.6).abs() < 1e-12);
        // ½·2·(1 + 4)
        assert!((h.energy - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_history_push() {
        let mut history = History::default();
        let health = Health {
            ppe_iterations: 3,
            ..Health::default()
        };
        history.push(&StepRecord::new(0.5, 1, &health));
        assert_eq!(history.len(), 1);
        assert_eq!(history.ppe_iterations, vec![3]);
        assert_eq!(history.time, vec![0.5]);
    }
}
