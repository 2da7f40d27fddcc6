// crates/mf_physics/src/boundary/ghost.rs

//! 带一层虚拟单元的扩展场
//!
//! # 概念说明
//!
//! 核心算子直接作用在内部数组上，不需要虚拟单元。扩展布局
//! `(nx+2, ny+2, nz+2)` 仅供输出与外部工具使用：内部单元 `(i,j,k)`
//! 对应扩展索引 `(i+1, j+1, k+1)`，最外一层为虚拟单元。
//!
//! # 同步规则
//!
//! 每个规范面一条 [`HaloRule`]：
//!
//! - `Mirror { sign }`: 虚拟值 = sign × 相邻内部值（滑移 / 对称）
//! - `Copy`: 虚拟值 = 相邻内部值（零梯度）
//! - `Overwrite(v)`: 虚拟值 = v（Dirichlet）
//!
//! 按 X、Y、Z 顺序处理，每次覆盖整层（含已填充的虚拟行），
//! 因此棱与角点也被填充。

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use mf_config::{BoundaryCondition, BoundaryTable, Face};
use mf_foundation::{MfError, MfResult};

/// 单个面的虚拟层同步规则
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HaloRule {
    /// 镜像
    Mirror {
        /// 符号（+1 对称，-1 反对称）
        sign: f64,
    },
    /// 零梯度复制
    Copy,
    /// 给定值
    Overwrite(f64),
}

impl HaloRule {
    #[inline]
    fn ghost_value(self, interior: f64) -> f64 {
        match self {
            HaloRule::Mirror { sign } => sign * interior,
            HaloRule::Copy => interior,
            HaloRule::Overwrite(v) => v,
        }
    }
}

/// 压力场的虚拟层规则
///
/// 压力给定面写入 p_b；壁面与滑移面镜像；出入口零梯度。
pub fn pressure_rules(bcs: &BoundaryTable) -> [HaloRule; 6] {
    Face::ALL.map(|face| match bcs.get(face) {
        BoundaryCondition::PressureDirichlet { p } => HaloRule::Overwrite(p),
        BoundaryCondition::NoSlip | BoundaryCondition::FreeSlip => HaloRule::Mirror { sign: 1.0 },
        BoundaryCondition::Inflow { .. } | BoundaryCondition::Outflow => HaloRule::Copy,
    })
}

/// 扩展标量场
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GhostField {
    dims: [usize; 3],
    data: Vec<f64>,
}

impl GhostField {
    /// 零初始化
    pub fn zeros(grid: &Grid) -> Self {
        let dims = grid.counts.map(|n| n + 2);
        Self {
            dims,
            data: vec![0.0; dims.iter().product()],
        }
    }

    /// 由内部数组构建（虚拟层为零）
    pub fn from_interior(grid: &Grid, interior: &[f64]) -> MfResult<Self> {
        MfError::check_size("interior", grid.n_cells(), interior.len())?;
        let mut out = Self::zeros(grid);
        for (c, &v) in interior.iter().enumerate() {
            let [i, j, k] = grid.cell_coords(c);
            let idx = out.index(i + 1, j + 1, k + 1);
            out.data[idx] = v;
        }
        Ok(out)
    }

    /// 扩展形状 (nx+2, ny+2, nz+2)
    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// 扁平数据（`i + mx*(j + my*k)`）
    #[inline]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// 扩展索引
    #[inline]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        i + self.dims[0] * (j + self.dims[1] * k)
    }

    /// 扩展坐标取值
    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> f64 {
        self.data[self.index(i, j, k)]
    }

    /// 提取内部数组
    pub fn interior(&self) -> Vec<f64> {
        let [mx, my, mz] = self.dims;
        let mut out = Vec::with_capacity((mx - 2) * (my - 2) * (mz - 2));
        for k in 1..mz - 1 {
            for j in 1..my - 1 {
                for i in 1..mx - 1 {
                    out.push(self.get(i, j, k));
                }
            }
        }
        out
    }

    /// 按规范面顺序同步虚拟层
    pub fn sync(&mut self, rules: &[HaloRule; 6]) {
        for axis in 0..3 {
            let m = self.dims[axis];
            let (a1, a2) = ((axis + 1) % 3, (axis + 2) % 3);
            for s in 0..self.dims[a2] {
                for r in 0..self.dims[a1] {
                    let at = |pos: usize| {
                        let mut ijk = [0; 3];
                        ijk[axis] = pos;
                        ijk[a1] = r;
                        ijk[a2] = s;
                        self.index(ijk[0], ijk[1], ijk[2])
                    };
                    let (lo_ghost, lo_in) = (at(0), at(1));
                    let (hi_ghost, hi_in) = (at(m - 1), at(m - 2));
                    self.data[lo_ghost] =
                        rules[Face::from_axis(axis, false).index()].ghost_value(self.data[lo_in]);
                    self.data[hi_ghost] =
                        rules[Face::from_axis(axis, true).index()].ghost_value(self.data[hi_in]);
                }
            }
        }
    }
}
