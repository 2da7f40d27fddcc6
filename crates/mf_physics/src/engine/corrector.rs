// crates/mf_physics/src/engine/corrector.rs

//! 速度校正
//!
//! ```text
//! F = F* - (Δt/ρ)·(G_F·P + g_bc)
//! ```
//!
//! 随后阻塞面置零。压力不被修改。
//!
//! 由于 `A = D·G`，校正后满足 `D·U = (Δt/ρ)·(b - A·P)`，
//! 散度只剩 PPE 残差。

use crate::fields::VelocityField;
use crate::state::SolverState;

/// 由预测速度与压力计算校正后的速度
pub fn correct(state: &SolverState, u_star: &VelocityField, p: &[f64]) -> VelocityField {
    let c = &state.constants;
    let factor = c.dt / c.density;
    let grad = state.operators.gradient_of(p);

    let mut out = u_star.clone();
    for axis in 0..3 {
        for (f, gf) in out.comps[axis].iter_mut().zip(grad.component(axis)) {
            *f -= factor * gf;
        }
    }
    out.zero_blocked(&state.operators.faces);
    out
}
