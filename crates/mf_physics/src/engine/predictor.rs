// crates/mf_physics/src/engine/predictor.rs

//! 预测步（显式 Euler）
//!
//! ```text
//! F* = F + Δt·( ν·(L_F·F + bias_F) - A_F(U,V,W) + g_F )
//! ```
//!
//! 仅在内部面上更新；边界面保留 `apply_pre` 写入的值，阻塞面为零。

use crate::fields::VelocityField;
use crate::operators::FaceKind;
use crate::state::SolverState;
use mf_foundation::MfResult;

/// 计算预测速度
///
/// Δt 或 ρ 非有限或非正时返回配置错误，不做任何计算。
pub fn predict(state: &SolverState, pre: &VelocityField) -> MfResult<VelocityField> {
    let c = &state.constants;
    c.check_time_and_density()?;

    let ops = &state.operators;
    let nu = c.kinematic_viscosity();
    let ctx = ops.stencil(&state.grid, state.boundary.table());
    let advection = ops.advection.tendency(&ctx, pre);

    let comps = [0, 1, 2].map(|d| {
        let field = pre.component(d);
        let diffusion = if nu != 0.0 {
            ops.laplacian[d].apply(field)
        } else {
            vec![0.0; field.len()]
        };
        let adv = advection.component(d);
        let g = c.body_force[d];

        field
            .iter()
            .enumerate()
            .map(|(f, &value)| match ops.faces.kind(d, f) {
                FaceKind::Open => value + c.dt * (nu * diffusion[f] - adv[f] + g),
                FaceKind::Boundary(_) => value,
                FaceKind::Blocked => 0.0,
            })
            .collect()
    });

    Ok(VelocityField { comps })
}
