// crates/mf_physics/src/state.rs

//! 求解器状态
//!
//! [`SolverState`] 是一次运行中唯一的共享资源，由编排器独占：
//!
//! ```text
//! grid, mask            ─ 初始化后不变
//! fields (P, U, V, W)   ─ 每步更新
//! intermediate (U*)     ─ 每步覆盖
//! constants             ─ 不变
//! operators, boundary   ─ 构建一次，只读
//! health                ─ 每步覆盖
//! history               ─ 只追加
//! iteration, time       ─ 单调递增
//! ```
//!
//! # 生命周期
//!
//! ```text
//! Initialized -> OperatorsBuilt -> Ready -> Stepping ⇆ Stepping -> Terminated
//!                                              └────> Failed
//! ```

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::boundary::{BoundaryEngine, GhostField};
use crate::engine::diagnostics::{Health, History};
use crate::engine::ppe::PpeSolver;
use crate::fields::{MacFields, VelocityField};
use crate::grid::Grid;
use crate::mask::{Mask, SOLID};
use crate::operators::Operators;
use mf_foundation::{MfError, MfResult};

// ============================================================
// 物理常数
// ============================================================

/// 运行期常数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constants {
    /// 密度 ρ
    pub density: f64,
    /// 动力粘度 μ
    pub viscosity: f64,
    /// 时间步长 Δt
    pub dt: f64,
    /// 网格间距 (dx, dy, dz)
    pub spacing: DVec3,
    /// 间距倒数
    pub inv_spacing: DVec3,
    /// 单位质量体积力
    pub body_force: DVec3,
}

impl Constants {
    /// 创建常数集
    pub fn new(density: f64, viscosity: f64, dt: f64, grid: &Grid, body_force: DVec3) -> Self {
        Self {
            density,
            viscosity,
            dt,
            spacing: grid.spacing,
            inv_spacing: grid.spacing.recip(),
            body_force,
        }
    }

    /// 运动粘度 ν = μ/ρ
    #[inline]
    pub fn kinematic_viscosity(&self) -> f64 {
        self.viscosity / self.density
    }

    /// 校验 Δt 与 ρ 为有限正数
    pub fn check_time_and_density(&self) -> MfResult<()> {
        MfError::check_positive("simulation_parameters.time_step", self.dt)?;
        MfError::check_positive("fluid_properties.density", self.density)?;
        Ok(())
    }
}

// ============================================================
// 生命周期
// ============================================================

/// 求解器生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    /// 网格、掩码与场已分配
    Initialized,
    /// 算子已构建
    OperatorsBuilt,
    /// 初始条件已施加，可以推进
    Ready,
    /// 推进中
    Stepping,
    /// 已到达总时间
    Terminated,
    /// 出现致命错误，拒绝继续推进
    Failed,
}

impl Lifecycle {
    /// 是否允许推进下一步
    #[inline]
    pub fn can_step(self) -> bool {
        matches!(self, Lifecycle::Ready | Lifecycle::Stepping)
    }

    /// 状态机是否允许 `self -> next`
    ///
    /// 构建阶段依次为 `Initialized -> OperatorsBuilt -> Ready`；
    /// `Terminated` 与 `Failed` 是终态。
    pub fn can_transition_to(self, next: Lifecycle) -> bool {
        use Lifecycle::*;
        match (self, next) {
            (Initialized, OperatorsBuilt) | (OperatorsBuilt, Ready) => true,
            (Ready, Stepping) | (Stepping, Stepping) => true,
            (Ready | Stepping, Terminated) => true,
            (Terminated | Failed, _) => false,
            (_, Failed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized => write!(f, "INITIALIZED"),
            Self::OperatorsBuilt => write!(f, "OPERATORS_BUILT"),
            Self::Ready => write!(f, "READY"),
            Self::Stepping => write!(f, "STEPPING"),
            Self::Terminated => write!(f, "TERMINATED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

// ============================================================
// 求解器状态
// ============================================================

/// 求解器状态
#[derive(Debug)]
pub struct SolverState {
    /// 网格
    pub grid: Grid,
    /// 掩码
    pub mask: Mask,
    /// 主场
    pub fields: MacFields,
    /// 预测速度 U*, V*, W*
    pub intermediate: VelocityField,
    /// 常数
    pub constants: Constants,
    /// 离散算子
    pub operators: Operators,
    /// 边界引擎
    pub boundary: BoundaryEngine,
    /// 压力泊松求解器
    pub ppe: PpeSolver,
    /// 压力虚拟层（存在压力给定面时）
    pub pressure_halo: Option<GhostField>,
    /// 最近一步的健康指标
    pub health: Health,
    /// 逐步诊断历史
    pub history: History,
    /// 已完成步数
    pub iteration: usize,
    /// 当前时间
    pub time: f64,
    /// 总时间
    pub total_time: f64,
    /// 生命周期
    pub lifecycle: Lifecycle,
}

impl SolverState {
    /// 是否已到达总时间
    #[inline]
    pub fn reached_end(&self) -> bool {
        self.time + 1e-9 * self.constants.dt >= self.total_time
    }

    /// 检查状态不变量
    ///
    /// - 掩码取值合法且至少一个流体单元
    /// - 各数组符合 MAC 形状
    /// - 阻塞面速度与固体单元压力严格为零
    /// - 所有场为有限值
    pub fn check_invariants(&self) -> MfResult<()> {
        let grid = &self.grid;

        if self.mask.len() != grid.n_cells() || self.mask.counts() != grid.counts {
            return Err(MfError::invariant(
                "mask_shape",
                format!("掩码形状 {:?} 与网格 {:?} 不一致", self.mask.counts(), grid.counts),
            ));
        }
        if self.mask.values().iter().any(|v| !(-1..=1).contains(v)) {
            return Err(MfError::invariant("mask_values", "掩码取值不在 {-1, 0, 1} 中"));
        }
        if self.mask.fluid_count() == 0 {
            return Err(MfError::invariant("mask_values", "不存在流体单元"));
        }
        if self.fields.mask != self.mask.values() {
            return Err(MfError::invariant("mask_values", "场中的掩码副本被修改"));
        }

        self.fields.check_shapes(grid)?;
        for axis in 0..3 {
            let actual = self.intermediate.comps[axis].len();
            MfError::check_size("intermediate", grid.n_faces(axis), actual)?;
        }

        if let Some((name, idx, value)) = self.fields.first_non_finite() {
            return Err(MfError::invariant(
                "finite_fields",
                format!("{}[{}] = {}", name, idx, value),
            ));
        }

        for axis in 0..3 {
            let comp = self.fields.vel.component(axis);
            if let Some(idx) = self.operators.faces.blocked(axis).find(|&f| comp[f] != 0.0) {
                return Err(MfError::invariant(
                    "solid_leak",
                    format!(
                        "阻塞面 {}{:?} 速度 {} 非零",
                        crate::fields::COMPONENT_NAMES[axis],
                        grid.face_coords(axis, idx),
                        comp[idx]
                    ),
                ));
            }
        }
        let solid_pressure = (0..grid.n_cells())
            .find(|&c| self.mask.get(c) == SOLID && self.fields.p[c] != 0.0);
        if let Some(c) = solid_pressure {
            return Err(MfError::invariant(
                "solid_leak",
                format!("固体单元 {:?} 压力 {} 非零", grid.cell_coords(c), self.fields.p[c]),
            ));
        }

        Ok(())
    }
}
