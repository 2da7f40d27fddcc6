// crates/mf_physics/src/operators/advection.rs

//! 对流项 (u·∇)u 的面心离散
//!
//! 分量 d 在内部面上的倾向：
//!
//! ```text
//! A_d = Σ_e a_e · ∂F_d/∂x_e
//! ```
//!
//! 其中 a_d 为面自身的值，a_e (e≠d) 为面两侧单元上 F_e 四个面值的平均。
//! 导数由 [`AdvectionScheme`] 选择：
//!
//! - `Central`: `(F₊ - F₋) / 2h`
//! - `Upwind`: `a ≥ 0` 时 `(F - F₋)/h`，否则 `(F₊ - F)/h`
//!
//! 边界面与阻塞面的倾向为零。

use crate::fields::VelocityField;
use crate::operators::faces::FaceKind;
use crate::operators::stencil::StencilContext;

pub use mf_config::AdvectionScheme;

/// 对流算子（策略对象）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advection {
    scheme: AdvectionScheme,
}

impl Advection {
    /// 创建
    pub fn new(scheme: AdvectionScheme) -> Self {
        Self { scheme }
    }

    /// 离散格式
    pub fn scheme(&self) -> AdvectionScheme {
        self.scheme
    }

    /// 计算三个分量的对流倾向
    pub fn tendency(&self, ctx: &StencilContext<'_>, vel: &VelocityField) -> VelocityField {
        let comps = [0, 1, 2].map(|d| self.component(ctx, vel, d));
        VelocityField { comps }
    }

    /// 计算分量 d 的对流倾向
    pub fn component(&self, ctx: &StencilContext<'_>, vel: &VelocityField, d: usize) -> Vec<f64> {
        let grid = ctx.grid;
        let field = vel.component(d);
        let mut out = vec![0.0; field.len()];

        for (f, slot) in out.iter_mut().enumerate() {
            if ctx.faces.kind(d, f) != FaceKind::Open {
                continue;
            }
            let ijk = grid.face_coords(d, f);
            let center = field[f];
            let mut sum = 0.0;
            for e in 0..3 {
                let a = if e == d {
                    center
                } else {
                    transverse_velocity(ctx, vel, d, ijk, e)
                };
                if a == 0.0 {
                    continue;
                }
                let lo = ctx.neighbor(d, ijk, e, false).value(field, center);
                let hi = ctx.neighbor(d, ijk, e, true).value(field, center);
                let h = grid.h(e);
                let slope = match self.scheme {
                    AdvectionScheme::Central => (hi - lo) / (2.0 * h),
                    AdvectionScheme::Upwind => {
                        if a >= 0.0 {
                            (center - lo) / h
                        } else {
                            (hi - center) / h
                        }
                    }
                };
                sum += a * slope;
            }
            *slot = sum;
        }
        out
    }
}

/// 分量 e 插值到分量 d 的面 ijk 上（四点平均）
fn transverse_velocity(
    ctx: &StencilContext<'_>,
    vel: &VelocityField,
    d: usize,
    ijk: [usize; 3],
    e: usize,
) -> f64 {
    let grid = ctx.grid;
    let fe = vel.component(e);
    let mut lower_cell = ijk;
    lower_cell[d] -= 1;
    let mut sum = 0.0;
    for cell in [lower_cell, ijk] {
        let mut up = cell;
        up[e] += 1;
        sum += fe[grid.face_at(e, cell)] + fe[grid.face_at(e, up)];
    }
    0.25 * sum
}
