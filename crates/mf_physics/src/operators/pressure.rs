// crates/mf_physics/src/operators/pressure.rs

//! 单元中心压力拉普拉斯 A（七点模板）
//!
//! 流体单元 c 的每个邻点：
//!
//! - 流体邻点：`A[c, n] = +1/h²`，`A[c, c] -= 1/h²`
//! - 固体邻点：不贡献（零通量）
//! - 越出计算域：压力给定时 `A[c, c] -= 1/h²`，否则不贡献
//!
//! 固体单元行为单位行，使其压力锚定为零。
//!
//! 在流体行上 `A = D·G`，A 对称且负半定；当没有任何流体单元
//! 接触压力给定面时，A 奇异，零空间为常数。

use crate::grid::Grid;
use crate::mask::Mask;
use crate::numerics::linear_algebra::{CsrBuilder, CsrMatrix};
use crate::operators::faces::{FaceKind, FaceTable};
use mf_config::{BoundaryTable, Face};

/// 组装压力拉普拉斯
pub fn build_pressure_laplacian(grid: &Grid, mask: &Mask, bcs: &BoundaryTable) -> CsrMatrix {
    let n = grid.n_cells();
    let mut builder = CsrBuilder::new_square(n);

    for c in 0..n {
        if mask.is_solid(c) {
            builder.set(c, c, 1.0);
            continue;
        }
        let ijk = grid.cell_coords(c);
        let mut diag = 0.0;
        for axis in 0..3 {
            let coef = 1.0 / (grid.h(axis) * grid.h(axis));
            for upper in [false, true] {
                let pos = ijk[axis];
                let outside = if upper {
                    pos + 1 == grid.counts[axis]
                } else {
                    pos == 0
                };
                if outside {
                    if bcs.get(Face::from_axis(axis, upper)).is_pressure_dirichlet() {
                        diag -= coef;
                    }
                    continue;
                }
                let mut nb = ijk;
                nb[axis] = if upper { pos + 1 } else { pos - 1 };
                let nc = grid.cell_at(nb);
                if mask.is_fluid(nc) {
                    builder.add(c, nc, coef);
                    diag -= coef;
                }
            }
        }
        builder.add(c, c, diag);
    }

    builder.build()
}

/// A 是否奇异：没有任何流体单元接触压力给定面
pub fn is_singular(faces: &FaceTable, bcs: &BoundaryTable) -> bool {
    !(0..3).any(|axis| {
        faces.component(axis).iter().any(|k| match k {
            FaceKind::Boundary(face) => bcs.get(*face).is_pressure_dirichlet(),
            _ => false,
        })
    })
}
