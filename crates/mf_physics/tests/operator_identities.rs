// crates/mf_physics/tests/operator_identities.rs

//! 离散算子恒等式
//!
//! - D·G·c = 0（常数压力）
//! - 线性场的向量拉普拉斯在内部为零
//! - 全 Neumann 时 A·1 = 0
//! - A 对称，‖A - Aᵀ‖_F ≤ √nnz·eps
//! - A 在流体行上等于 D·G
//! - 制造解 p = x² + y² + z² 上 A·p = 6

use mf_config::{AdvectionScheme, BoundaryCondition, BoundaryTable, Face};
use mf_physics::numerics::linear_algebra::norm_inf;
use mf_physics::operators::{FaceKind, Neighbor};
use mf_physics::{Grid, Mask, Operators, VelocityField};

// ============================================================================
// 测试辅助函数
// ============================================================================

fn closed_box() -> BoundaryTable {
    BoundaryTable::uniform(BoundaryCondition::NoSlip)
}

fn mixed_boundaries() -> BoundaryTable {
    BoundaryTable::uniform(BoundaryCondition::FreeSlip)
        .with(
            Face::XMin,
            BoundaryCondition::Inflow {
                velocity: glam::DVec3::new(1.0, 0.0, 0.0),
            },
        )
        .with(Face::XMax, BoundaryCondition::PressureDirichlet { p: 0.5 })
        .with(Face::ZMin, BoundaryCondition::NoSlip)
}

fn obstacle_mask(grid: &Grid) -> Mask {
    Mask::all_fluid(grid).with_solid_cells(&[[1, 1, 1], [2, 1, 1], [3, 0, 2]])
}

fn build(grid: &Grid, mask: &Mask, bcs: &BoundaryTable) -> Operators {
    Operators::build(grid, mask, bcs, AdvectionScheme::Upwind)
}

// ============================================================================
// 梯度与散度
// ============================================================================

#[test]
fn test_divergence_of_constant_gradient_vanishes() {
    let g = Grid::build([(0.0, 1.0), (0.0, 2.0), (0.0, 1.5)], [4, 3, 5]).unwrap();
    let m = obstacle_mask(&g);
    let ops = build(&g, &m, &closed_box());

    let p = vec![3.7; g.n_cells()];
    let grad = ops.gradient_of(&p);
    assert!(grad.max_abs() < 1e-12);
    assert!(norm_inf(&ops.divergence_of(&grad)) < 1e-12);
}

#[test]
fn test_constant_pressure_matching_dirichlet_value_has_zero_gradient() {
    let g = Grid::unit_cube(4).unwrap();
    let m = Mask::all_fluid(&g);
    let bcs = BoundaryTable::uniform(BoundaryCondition::PressureDirichlet { p: 2.0 });
    let ops = build(&g, &m, &bcs);

    let grad = ops.gradient_of(&vec![2.0; g.n_cells()]);
    assert!(grad.max_abs() < 1e-12);
}

#[test]
fn test_pressure_laplacian_equals_div_grad_on_fluid_rows() {
    let g = Grid::build([(0.0, 1.0), (0.0, 2.0), (0.0, 1.5)], [4, 3, 5]).unwrap();
    let m = obstacle_mask(&g);
    let ops = build(&g, &m, &mixed_boundaries());

    let dg = ops.divergence.matmul(&ops.stacked_gradient());
    for c in 0..g.n_cells() {
        if m.is_solid(c) {
            continue;
        }
        let row = ops.pressure.row(c);
        for (col, v) in row.iter() {
            assert!((dg.get(c, col) - v).abs() < 1e-9, "A[{}, {}]", c, col);
        }
        let significant = |m: &mf_physics::numerics::linear_algebra::CsrMatrix| {
            m.row(c).iter().filter(|(_, v)| v.abs() > 1e-12).count()
        };
        assert_eq!(significant(&dg), significant(&ops.pressure));
    }
}

// ============================================================================
// 压力拉普拉斯
// ============================================================================

#[test]
fn test_pressure_laplacian_annihilates_constants_when_all_neumann() {
    let g = Grid::unit_cube(5).unwrap();
    let m = obstacle_mask(&g);
    let ops = build(&g, &m, &closed_box());
    assert!(ops.is_singular);

    let ones: Vec<f64> = (0..g.n_cells()).map(|c| if m.is_fluid(c) { 1.0 } else { 0.0 }).collect();
    let r = ops.pressure.apply_to(&ones);
    for c in 0..g.n_cells() {
        if m.is_fluid(c) {
            assert!(r[c].abs() < 1e-10, "cell {:?}", g.cell_coords(c));
        }
    }
}

#[test]
fn test_pressure_laplacian_is_symmetric() {
    let g = Grid::build([(0.0, 1.0), (0.0, 2.0), (0.0, 1.5)], [4, 3, 5]).unwrap();
    let m = obstacle_mask(&g);
    for bcs in [closed_box(), mixed_boundaries()] {
        let ops = build(&g, &m, &bcs);
        let bound = (ops.pressure.nnz() as f64).sqrt() * f64::EPSILON;
        assert!(ops.pressure.asymmetry_norm() <= bound);
    }
}

#[test]
fn test_pressure_laplacian_reproduces_quadratic() {
    let g = Grid::unit_cube(4).unwrap();
    let m = Mask::all_fluid(&g);
    let ops = build(&g, &m, &closed_box());

    let p: Vec<f64> = (0..g.n_cells())
        .map(|c| {
            let [i, j, k] = g.cell_coords(c);
            g.cell_center(i, j, k).length_squared()
        })
        .collect();
    let ap = ops.pressure.apply_to(&p);

    for k in 1..3 {
        for j in 1..3 {
            for i in 1..3 {
                let v = ap[g.cell_index(i, j, k)];
                assert!((v - 6.0).abs() < 1e-9, "({}, {}, {}): {}", i, j, k, v);
            }
        }
    }
}

#[test]
fn test_singularity_detection() {
    let g = Grid::unit_cube(3).unwrap();
    let m = Mask::all_fluid(&g);
    assert!(build(&g, &m, &closed_box()).is_singular);
    assert!(!build(&g, &m, &mixed_boundaries()).is_singular);

    // 压力给定面全部被固体遮挡时仍奇异
    let blocked: Vec<[usize; 3]> = (0..3)
        .flat_map(|j| (0..3).map(move |k| [2, j, k]))
        .collect();
    let m = Mask::all_fluid(&g).with_solid_cells(&blocked);
    let bcs = closed_box().with(Face::XMax, BoundaryCondition::PressureDirichlet { p: 0.0 });
    assert!(build(&g, &m, &bcs).is_singular);
}

// ============================================================================
// 向量拉普拉斯
// ============================================================================

#[test]
fn test_vector_laplacian_of_linear_field_vanishes_in_interior() {
    let g = Grid::build([(0.0, 1.0), (0.0, 2.0), (0.0, 1.5)], [5, 4, 6]).unwrap();
    let m = Mask::all_fluid(&g);
    let bcs = mixed_boundaries();
    let ops = build(&g, &m, &bcs);
    let ctx = ops.stencil(&g, &bcs);

    for d in 0..3 {
        let field: Vec<f64> = (0..g.n_faces(d))
            .map(|f| {
                let x = g.face_center(d, g.face_coords(d, f));
                1.5 + 2.0 * x.x - 0.7 * x.y + 0.3 * x.z
            })
            .collect();
        let lap = ops.laplacian[d].apply(&field);

        let mut checked = 0;
        for f in 0..g.n_faces(d) {
            if ops.faces.kind(d, f) != FaceKind::Open {
                continue;
            }
            let ijk = g.face_coords(d, f);
            let interior = (0..3).all(|e| {
                [false, true]
                    .iter()
                    .all(|&upper| matches!(ctx.neighbor(d, ijk, e, upper), Neighbor::Face(_)))
            });
            if interior {
                assert!(lap[f].abs() < 1e-9, "分量 {} 面 {:?}: {}", d, ijk, lap[f]);
                checked += 1;
            }
        }
        assert!(checked > 0);
    }
}

#[test]
fn test_vector_laplacian_keeps_blocked_faces_at_zero() {
    let g = Grid::unit_cube(4).unwrap();
    let m = obstacle_mask(&g);
    let ops = build(&g, &m, &closed_box());

    let mut vel = VelocityField::zeros(&g);
    for d in 0..3 {
        for f in 0..g.n_faces(d) {
            if !ops.faces.kind(d, f).is_blocked() {
                vel.comps[d][f] = 1.0 + f as f64;
            }
        }
    }
    for d in 0..3 {
        let lap = ops.laplacian[d].apply(vel.component(d));
        for f in ops.faces.blocked(d) {
            assert_eq!(lap[f], 0.0);
        }
    }
}
