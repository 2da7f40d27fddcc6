// crates/mf_physics/src/operators/gradient.rs

//! 离散梯度算子 G_d: ℝ^{|P|} → ℝ^{|F_d|}
//!
//! 内部面 `(i,j,k)`（沿 d 的索引为 1..n-1）两侧均为流体时：
//!
//! ```text
//! G_d[f, c-] = -1/h_d,   G_d[f, c+] = +1/h_d
//! ```
//!
//! 阻塞面与非压力给定的边界面行为零，其速度由边界引擎负责。
//!
//! # 压力给定边界
//!
//! 压力给定面上，边界外的压力取 p_b，梯度为仿射形式 `G·P + g_bc`：
//!
//! ```text
//! 下边界: (P_0 - p_b)/h     => G[f, c_0]   = +1/h, g_bc[f] = -p_b/h
//! 上边界: (p_b - P_{n-1})/h => G[f, c_n-1] = -1/h, g_bc[f] = +p_b/h
//! ```
//!
//! 这样 `D·G` 恰好等于压力拉普拉斯 `A`，校正后的速度严格满足离散连续方程。

use crate::grid::Grid;
use crate::numerics::linear_algebra::{CsrBuilder, CsrMatrix};
use crate::operators::faces::{FaceKind, FaceTable};
use mf_config::{BoundaryCondition, BoundaryTable};

/// 单个分量的梯度：矩阵与边界偏置
#[derive(Debug, Clone)]
pub struct GradientComponent {
    /// 梯度矩阵
    pub matrix: CsrMatrix,
    /// 压力给定面上的常数项
    pub offset: Vec<f64>,
}

/// 组装分量 axis 的梯度
pub fn build_gradient(
    grid: &Grid,
    faces: &FaceTable,
    bcs: &BoundaryTable,
    axis: usize,
) -> GradientComponent {
    let n_faces = grid.n_faces(axis);
    let inv_h = 1.0 / grid.h(axis);
    let mut builder = CsrBuilder::new(n_faces, grid.n_cells());
    let mut offset = vec![0.0; n_faces];

    for f in 0..n_faces {
        let ijk = grid.face_coords(axis, f);
        match faces.kind(axis, f) {
            FaceKind::Open => {
                let (lo, hi) = grid.face_cells(axis, ijk);
                if let (Some(lo), Some(hi)) = (lo, hi) {
                    builder.set(f, lo, -inv_h);
                    builder.set(f, hi, inv_h);
                }
            }
            FaceKind::Boundary(face) => {
                if let BoundaryCondition::PressureDirichlet { p } = bcs.get(face) {
                    let (lo, hi) = grid.face_cells(axis, ijk);
                    if face.is_max() {
                        if let Some(c) = lo {
                            builder.set(f, c, -inv_h);
                            offset[f] = p * inv_h;
                        }
                    } else if let Some(c) = hi {
                        builder.set(f, c, inv_h);
                        offset[f] = -p * inv_h;
                    }
                }
            }
            FaceKind::Blocked => {}
        }
    }

    GradientComponent {
        matrix: builder.build(),
        offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::Mask;
    use mf_config::Face;

    #[test]
    fn test_interior_and_blocked_rows() {
        let g = Grid::unit_cube(4).unwrap();
        let m = Mask::all_fluid(&g).with_solid_cells(&[[2, 2, 2]]);
        let faces = FaceTable::build(&g, &m);
        let bcs = BoundaryTable::uniform(BoundaryCondition::NoSlip);
        let gx = build_gradient(&g, &faces, &bcs, 0);

        let f = g.u_index(1, 0, 0);
        assert_eq!(gx.matrix.get(f, g.cell_index(0, 0, 0)), -4.0);
        assert_eq!(gx.matrix.get(f, g.cell_index(1, 0, 0)), 4.0);
        assert_eq!(gx.matrix.row(g.u_index(2, 2, 2)).nnz(), 0);
        assert_eq!(gx.matrix.row(g.u_index(0, 1, 1)).nnz(), 0);
        assert!(gx.offset.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_dirichlet_rows() {
        let g = Grid::unit_cube(2).unwrap();
        let faces = FaceTable::build(&g, &Mask::all_fluid(&g));
        let bcs = BoundaryTable::uniform(BoundaryCondition::FreeSlip)
            .with(Face::XMin, BoundaryCondition::PressureDirichlet { p: 3.0 })
            .with(Face::XMax, BoundaryCondition::PressureDirichlet { p: 1.0 });
        let gx = build_gradient(&g, &faces, &bcs, 0);

        let lo = g.u_index(0, 1, 0);
        assert_eq!(gx.matrix.get(lo, g.cell_index(0, 1, 0)), 2.0);
        assert_eq!(gx.offset[lo], -6.0);

        let hi = g.u_index(2, 1, 0);
        assert_eq!(gx.matrix.get(hi, g.cell_index(1, 1, 0)), -2.0);
        assert_eq!(gx.offset[hi], 2.0);
    }
}
