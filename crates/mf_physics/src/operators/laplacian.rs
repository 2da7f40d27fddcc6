// crates/mf_physics/src/operators/laplacian.rs

//! 面网格上的向量拉普拉斯 L_d（每个速度分量一个）
//!
//! 内部面使用七点模板，系数 `1/h_e²`。越出计算域或紧邻固体的
//! 邻点由 [`StencilContext::neighbor`] 给出的虚拟值替代：
//!
//! ```text
//! ghost = s·F + o  =>  diag += (s - 1)/h², bias += o/h²
//! ```
//!
//! 因此 `L_d·F + bias_d` 即带边界条件的离散拉普拉斯。
//!
//! - 边界法向面：行为零（值由边界引擎给定）
//! - 阻塞面：单位行，乘积后保持为零

use crate::grid::Grid;
use crate::numerics::linear_algebra::{CsrBuilder, CsrMatrix};
use crate::operators::faces::FaceKind;
use crate::operators::stencil::{Neighbor, StencilContext};

/// 单个分量的拉普拉斯：矩阵与边界偏置
#[derive(Debug, Clone)]
pub struct LaplacianComponent {
    /// 拉普拉斯矩阵
    pub matrix: CsrMatrix,
    /// 入口壁面速度带来的常数项
    pub bias: Vec<f64>,
}

impl LaplacianComponent {
    /// 计算 `L·F + bias`
    pub fn apply(&self, field: &[f64]) -> Vec<f64> {
        let mut out = self.matrix.apply_to(field);
        for (o, &b) in out.iter_mut().zip(&self.bias) {
            *o += b;
        }
        out
    }
}

/// 组装分量 d 的向量拉普拉斯
pub fn build_laplacian(ctx: &StencilContext<'_>, d: usize) -> LaplacianComponent {
    let grid: &Grid = ctx.grid;
    let n = grid.n_faces(d);
    let mut builder = CsrBuilder::new_square(n);
    let mut bias = vec![0.0; n];

    for f in 0..n {
        match ctx.faces.kind(d, f) {
            FaceKind::Boundary(_) => {}
            FaceKind::Blocked => builder.set(f, f, 1.0),
            FaceKind::Open => {
                let ijk = grid.face_coords(d, f);
                let mut diag = 0.0;
                for e in 0..3 {
                    let coef = 1.0 / (grid.h(e) * grid.h(e));
                    for upper in [false, true] {
                        match ctx.neighbor(d, ijk, e, upper) {
                            Neighbor::Face(col) => {
                                builder.add(f, col, coef);
                                diag -= coef;
                            }
                            Neighbor::Ghost { scale, offset } => {
                                diag += coef * (scale - 1.0);
                                bias[f] += coef * offset;
                            }
                        }
                    }
                }
                builder.add(f, f, diag);
            }
        }
    }

    LaplacianComponent {
        matrix: builder.build(),
        bias,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::Mask;
    use crate::operators::faces::FaceTable;
    use glam::DVec3;
    use mf_config::{BoundaryCondition, BoundaryTable, Face};

    #[test]
    fn test_interior_stencil() {
        let g = Grid::unit_cube(4).unwrap();
        let faces = FaceTable::build(&g, &Mask::all_fluid(&g));
        let bcs = BoundaryTable::uniform(BoundaryCondition::NoSlip);
        let ctx = StencilContext::new(&g, &faces, &bcs);
        let lu = build_laplacian(&ctx, 0);

        let f = g.u_index(2, 1, 1);
        assert_eq!(lu.matrix.get(f, f), -6.0 * 16.0);
        assert_eq!(lu.matrix.get(f, g.u_index(1, 1, 1)), 16.0);
        assert_eq!(lu.matrix.row(f).nnz(), 7);
        // 边界法向面为零行
        assert_eq!(lu.matrix.row(g.u_index(0, 1, 1)).nnz(), 0);
    }

    #[test]
    fn test_wall_ghost_folds_into_diagonal() {
        let g = Grid::unit_cube(4).unwrap();
        let faces = FaceTable::build(&g, &Mask::all_fluid(&g));
        let bcs = BoundaryTable::uniform(BoundaryCondition::FreeSlip)
            .with(Face::YMin, BoundaryCondition::NoSlip)
            .with(
                Face::ZMin,
                BoundaryCondition::Inflow {
                    velocity: DVec3::new(2.0, 0.0, 0.0),
                },
            );
        let ctx = StencilContext::new(&g, &faces, &bcs);
        let lu = build_laplacian(&ctx, 0);

        // y 下侧无滑移：对角多减 2/h²
        let f = g.u_index(2, 0, 1);
        assert_eq!(lu.matrix.get(f, f), -7.0 * 16.0);
        // y 上侧自由滑移：对角少一项
        let f = g.u_index(2, 3, 1);
        assert_eq!(lu.matrix.get(f, f), -5.0 * 16.0);
        // z 下侧入口：偏置 2·u_b/h²
        let f = g.u_index(2, 1, 0);
        assert_eq!(lu.matrix.get(f, f), -7.0 * 16.0);
        assert_eq!(lu.bias[f], 4.0 * 16.0);
    }

    #[test]
    fn test_blocked_rows_are_identity() {
        let g = Grid::unit_cube(4).unwrap();
        let faces = FaceTable::build(&g, &Mask::all_fluid(&g).with_solid_cells(&[[2, 2, 2]]));
        let bcs = BoundaryTable::uniform(BoundaryCondition::NoSlip);
        let ctx = StencilContext::new(&g, &faces, &bcs);
        let lw = build_laplacian(&ctx, 2);

        let f = g.w_index(2, 2, 3);
        assert_eq!(lw.matrix.get(f, f), 1.0);
        assert_eq!(lw.matrix.row(f).nnz(), 1);
    }
}
