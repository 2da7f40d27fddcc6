// crates/mf_physics/tests/boundary_tests.rs

//! 边界条件集成测试
//!
//! 在完整时间步中验证出口通量平衡、被遮挡的入口以及压力虚拟层。

use mf_config::{BoundaryRecord, Face, SimulationConfig};
use mf_physics::{HaloRule, Simulation};

// ============================================================================
// 测试辅助函数
// ============================================================================

/// x_min 入口、x_max 零梯度出口、其余无滑移
fn inflow_outflow(n: usize) -> SimulationConfig {
    SimulationConfig::cube(n)
        .with_boundary(BoundaryRecord::inflow(Face::XMin, [1.0, 0.0, 0.0]))
        .with_boundary(BoundaryRecord::outflow(Face::XMax))
        .with_ppe_tolerance(1e-10, 1e-14)
        .with_time(0.01, 0.05)
}

// ============================================================================
// 出口
// ============================================================================

/// 没有压力给定面时出口被缩放，使每步边界净通量为零
#[test]
fn test_outflow_balances_inflow() {
    let mut sim = Simulation::new(&inflow_outflow(3)).unwrap();
    assert!(sim.state().operators.is_singular);
    assert!(!sim.state().boundary.pressure_anchored());

    let summary = sim
        .run_to_end(|state, record| {
            let flux = state
                .boundary
                .boundary_flux(&state.grid, &state.operators.faces, &state.fields.vel);
            assert!(flux.net().abs() < 1e-12, "步 {}: 净通量 {}", record.step_index, flux.net());
            assert!(flux.fixed < 0.0);
            assert!(record.divergence_norm < 1e-8);
            Ok(())
        })
        .unwrap();

    assert_eq!(summary.steps, 5);
    assert!(sim.state().pressure_halo.is_none());
}

/// 出口面在第一步即携带与入口相等的流量
#[test]
fn test_outflow_is_uniform_from_rest() {
    let mut sim = Simulation::new(&inflow_outflow(3)).unwrap();
    sim.step().unwrap();

    let state = sim.state();
    let g = &state.grid;
    for k in 0..3 {
        for j in 0..3 {
            let u = state.fields.vel.u()[g.u_index(3, j, k)];
            assert!((u - 1.0).abs() < 1e-12, "出口 ({}, {}) = {}", j, k, u);
        }
    }
}

// ============================================================================
// 被遮挡的边界面
// ============================================================================

/// 贴着入口的固体单元遮挡对应入口面
#[test]
fn test_solid_cell_blocks_inflow_face() {
    let mut mask = vec![1; 27];
    mask[0] = 0;
    let config = SimulationConfig::cube(3)
        .with_mask(mask)
        .with_boundary(BoundaryRecord::inflow(Face::XMin, [1.0, 0.0, 0.0]))
        .with_boundary(BoundaryRecord::pressure(Face::XMax, 0.0))
        .with_ppe_tolerance(1e-10, 1e-14);
    let mut sim = Simulation::new(&config).unwrap();

    for _ in 0..3 {
        sim.step().unwrap();
        let state = sim.state();
        let g = &state.grid;
        assert_eq!(state.fields.vel.u()[g.u_index(0, 0, 0)], 0.0);
        assert_eq!(state.fields.vel.u()[g.u_index(0, 1, 0)], 1.0);
        assert_eq!(state.fields.p[0], 0.0);
    }
}

// ============================================================================
// 压力虚拟层
// ============================================================================

/// 虚拟层在压力给定面写入给定值，入口零梯度，壁面镜像
#[test]
fn test_pressure_halo_follows_boundary_rules() {
    let config = SimulationConfig::cube(3)
        .with_boundary(BoundaryRecord::inflow(Face::XMin, [1.0, 0.0, 0.0]))
        .with_boundary(BoundaryRecord::pressure(Face::XMax, 0.25));
    let mut sim = Simulation::new(&config).unwrap();
    sim.step().unwrap();

    let state = sim.state();
    let rules = mf_physics::boundary::pressure_rules(state.boundary.table());
    assert_eq!(rules[Face::XMax.index()], HaloRule::Overwrite(0.25));
    assert_eq!(rules[Face::XMin.index()], HaloRule::Copy);

    let halo = state.pressure_halo.as_ref().unwrap();
    for k in 1..4 {
        for j in 1..4 {
            assert_eq!(halo.get(4, j, k), 0.25);
            assert_eq!(halo.get(0, j, k), halo.get(1, j, k));
        }
    }
    for i in 1..4 {
        assert_eq!(halo.get(i, 0, 2), halo.get(i, 1, 2));
        assert_eq!(halo.get(i, 2, 4), halo.get(i, 2, 3));
    }
}
