// crates/mf_physics/src/operators/divergence.rs

//! 离散散度算子 D: ℝ^{|U|+|V|+|W|} → ℝ^{|P|}
//!
//! 流体单元 (i,j,k) 的行有六个非零元：
//!
//! ```text
//! D[c, U(i,j,k)]   = -1/dx    D[c, U(i+1,j,k)] = +1/dx
//! D[c, V(i,j,k)]   = -1/dy    D[c, V(i,j+1,k)] = +1/dy
//! D[c, W(i,j,k)]   = -1/dz    D[c, W(i,j,k+1)] = +1/dz
//! ```
//!
//! 列号为面在堆叠速度向量 `[U | V | W]` 中的位置。固体单元的行为空。

use crate::grid::Grid;
use crate::mask::Mask;
use crate::numerics::linear_algebra::{CsrBuilder, CsrMatrix};

/// 组装散度矩阵
pub fn build_divergence(grid: &Grid, mask: &Mask) -> CsrMatrix {
    let mut builder = CsrBuilder::new(grid.n_cells(), grid.n_velocity_dofs());

    for c in 0..grid.n_cells() {
        if mask.is_solid(c) {
            continue;
        }
        let ijk = grid.cell_coords(c);
        for axis in 0..3 {
            let inv_h = 1.0 / grid.h(axis);
            let offset = grid.face_offset(axis);
            let mut upper = ijk;
            upper[axis] += 1;
            builder.set(c, offset + grid.face_at(axis, ijk), -inv_h);
            builder.set(c, offset + grid.face_at(axis, upper), inv_h);
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::VelocityField;
    use glam::DVec3;

    #[test]
    fn test_row_structure() {
        let g = Grid::build([(0.0, 1.0), (0.0, 2.0), (0.0, 4.0)], [2, 2, 2]).unwrap();
        let m = Mask::all_fluid(&g).with_solid_cells(&[[1, 1, 1]]);
        let d = build_divergence(&g, &m);

        assert_eq!(d.shape(), (8, g.n_velocity_dofs()));
        assert_eq!(d.nnz(), 7 * 6);
        assert_eq!(d.row(g.cell_index(1, 1, 1)).nnz(), 0);

        let c = g.cell_index(0, 0, 0);
        assert_eq!(d.get(c, g.u_index(0, 0, 0)), -2.0);
        assert_eq!(d.get(c, g.u_index(1, 0, 0)), 2.0);
        assert_eq!(d.get(c, g.face_offset(1) + g.v_index(0, 1, 0)), 1.0);
        assert_eq!(d.get(c, g.face_offset(2) + g.w_index(0, 0, 0)), -0.5);
    }

    #[test]
    fn test_uniform_flow_is_divergence_free() {
        let g = Grid::unit_cube(3).unwrap();
        let d = build_divergence(&g, &Mask::all_fluid(&g));
        let vel = VelocityField::uniform(&g, DVec3::new(1.0, -2.0, 0.5));
        let div = d.apply_to(&vel.stacked());
        assert!(div.iter().all(|v| v.abs() < 1e-12));
    }
}
