// crates/mf_physics/src/operators/mod.rs

//! 离散算子
//!
//! 所有算子在初始化时由网格、掩码与边界表构建一次，之后只读。
//!
//! # 模块组织
//!
//! - [`faces`]: 速度面分类（内部 / 边界 / 阻塞）
//! - [`stencil`]: 面网格模板的邻点与虚拟值
//! - [`divergence`]: 散度 D
//! - [`gradient`]: 梯度 Gx, Gy, Gz（含压力给定面偏置）
//! - [`laplacian`]: 向量拉普拉斯 Lu, Lv, Lw（含入口偏置）
//! - [`pressure`]: 压力拉普拉斯 A
//! - [`advection`]: 对流倾向（迎风 / 中心）
//!
//! # 恒等式
//!
//! 对流体单元行 `A = D·G`，校正步使用的 `G·P + g_bc` 与构造 A 的
//! 梯度完全一致。

pub mod advection;
pub mod divergence;
pub mod faces;
pub mod gradient;
pub mod laplacian;
pub mod pressure;
pub mod stencil;

pub use advection::{Advection, AdvectionScheme};
pub use divergence::build_divergence;
pub use faces::{FaceKind, FaceTable};
pub use gradient::{build_gradient, GradientComponent};
pub use laplacian::{build_laplacian, LaplacianComponent};
pub use pressure::{build_pressure_laplacian, is_singular};
pub use stencil::{Neighbor, StencilContext};

use tracing::debug;

use crate::fields::VelocityField;
use crate::grid::Grid;
use crate::mask::Mask;
use crate::numerics::linear_algebra::CsrMatrix;
use mf_config::BoundaryTable;

/// 全部离散算子
#[derive(Debug, Clone)]
pub struct Operators {
    /// 面分类
    pub faces: FaceTable,
    /// 散度 D
    pub divergence: CsrMatrix,
    /// 梯度 Gx, Gy, Gz
    pub gradient: [GradientComponent; 3],
    /// 向量拉普拉斯 Lu, Lv, Lw
    pub laplacian: [LaplacianComponent; 3],
    /// 压力拉普拉斯 A
    pub pressure: CsrMatrix,
    /// 对流算子
    pub advection: Advection,
    /// A 是否奇异
    pub is_singular: bool,
}

impl Operators {
    /// 构建全部算子
    pub fn build(grid: &Grid, mask: &Mask, bcs: &BoundaryTable, scheme: AdvectionScheme) -> Self {
        let faces = FaceTable::build(grid, mask);
        let divergence = build_divergence(grid, mask);
        let gradient = [0, 1, 2].map(|axis| build_gradient(grid, &faces, bcs, axis));
        let laplacian = {
            let ctx = StencilContext::new(grid, &faces, bcs);
            [0, 1, 2].map(|d| build_laplacian(&ctx, d))
        };
        let pressure = build_pressure_laplacian(grid, mask, bcs);
        let singular = is_singular(&faces, bcs);

        debug!(
            "算子组装完成: D {:?} nnz={}, A {:?} nnz={}, L nnz=[{}, {}, {}], 阻塞面={}, 奇异={}",
            divergence.shape(),
            divergence.nnz(),
            pressure.shape(),
            pressure.nnz(),
            laplacian[0].matrix.nnz(),
            laplacian[1].matrix.nnz(),
            laplacian[2].matrix.nnz(),
            faces.blocked_count(),
            singular,
        );

        Self {
            faces,
            divergence,
            gradient,
            laplacian,
            pressure,
            advection: Advection::new(scheme),
            is_singular: singular,
        }
    }

    /// 模板上下文
    pub fn stencil<'a>(&'a self, grid: &'a Grid, bcs: &'a BoundaryTable) -> StencilContext<'a> {
        StencilContext::new(grid, &self.faces, bcs)
    }

    /// 堆叠梯度矩阵 `[Gx; Gy; Gz]`
    pub fn stacked_gradient(&self) -> CsrMatrix {
        CsrMatrix::vstack(&[
            &self.gradient[0].matrix,
            &self.gradient[1].matrix,
            &self.gradient[2].matrix,
        ])
    }

    /// 散度 `D·[U|V|W]`
    pub fn divergence_of(&self, vel: &VelocityField) -> Vec<f64> {
        self.divergence.apply_to(&vel.stacked())
    }

    /// 仿射梯度 `G·P + g_bc`
    pub fn gradient_of(&self, p: &[f64]) -> VelocityField {
        let comps = [0, 1, 2].map(|axis| {
            let g = &self.gradient[axis];
            let mut out = g.matrix.apply_to(p);
            for (o, &b) in out.iter_mut().zip(&g.offset) {
                *o += b;
            }
            out
        });
        VelocityField { comps }
    }

    /// 边界偏置的散度 `D·g_bc`
    pub fn divergence_of_offset(&self) -> Vec<f64> {
        let offset = VelocityField {
            comps: [0, 1, 2].map(|axis| self.gradient[axis].offset.clone()),
        };
        self.divergence_of(&offset)
    }

    /// 非零元总数
    pub fn total_nnz(&self) -> usize {
        self.divergence.nnz()
            + self.pressure.nnz()
            + self.gradient.iter().map(|g| g.matrix.nnz()).sum::<usize>()
            + self.laplacian.iter().map(|l| l.matrix.nnz()).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_config::{BoundaryCondition, Face};

    #[test]
    fn test_pressure_equals_div_grad() {
        let g = Grid::unit_cube(4).unwrap();
        let m = Mask::all_fluid(&g).with_solid_cells(&[[1, 2, 1]]);
        let bcs = BoundaryTable::uniform(BoundaryCondition::NoSlip)
            .with(Face::YMax, BoundaryCondition::PressureDirichlet { p: 0.0 });
        let ops = Operators::build(&g, &m, &bcs, AdvectionScheme::Upwind);

        let dg = ops.divergence.matmul(&ops.stacked_gradient());
        for c in 0..g.n_cells() {
            if m.is_solid(c) {
                continue;
            }
            for j in 0..g.n_cells() {
                assert!((dg.get(c, j) - ops.pressure.get(c, j)).abs() < 1e-9);
            }
        }
        assert!(!ops.is_singular);
    }
}
