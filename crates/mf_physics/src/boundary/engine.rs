// crates/mf_physics/src/boundary/engine.rs

//! 边界条件引擎
//!
//! 每步调用两次：
//!
//! - [`BoundaryEngine::apply_pre`]: 预测步之前。阻塞面置零，写入法向速度
//!   （入口给定值、壁面为零），出口与压力给定面取零梯度。若存在出口
//!   且没有压力给定面，则缩放出口速度使边界净通量为零。
//! - [`BoundaryEngine::apply_post`]: 校正步之后。重新置零阻塞面并写入
//!   Dirichlet 法向速度；若存在压力给定面，同步压力虚拟层。
//!
//! 出口法向速度在 `apply_pre` 之后保持不变，压力给定面的法向速度
//! 由投影给出。
//!
//! # 通量约定
//!
//! 上边界面贡献 `+F·A`，下边界面贡献 `-F·A`，即正值为流出。

use tracing::debug;

use crate::boundary::ghost::{pressure_rules, GhostField};
use crate::fields::VelocityField;
use crate::grid::Grid;
use crate::operators::faces::FaceTable;
use mf_config::{BoundaryCondition, BoundaryTable, Face};

/// 通量绝对值低于该阈值视为零
const FLUX_EPS: f64 = 1e-14;

/// 边界净通量拆分
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundaryFlux {
    /// 非出口边界面的净流出量
    pub fixed: f64,
    /// 出口面的净流出量
    pub outflow: f64,
    /// 出口面（未阻塞）总面积
    pub outflow_area: f64,
}

impl BoundaryFlux {
    /// 总净流出量
    #[inline]
    pub fn net(&self) -> f64 {
        self.fixed + self.outflow
    }
}

/// 边界条件引擎
#[derive(Debug, Clone)]
pub struct BoundaryEngine {
    bcs: BoundaryTable,
    pressure_anchored: bool,
}

impl BoundaryEngine {
    /// 创建引擎
    ///
    /// `faces` 用于判断是否有未被固体遮挡的压力给定面。
    pub fn new(bcs: BoundaryTable, faces: &FaceTable) -> Self {
        let pressure_anchored = !crate::operators::is_singular(faces, &bcs);
        Self {
            bcs,
            pressure_anchored,
        }
    }

    /// 边界表
    #[inline]
    pub fn table(&self) -> &BoundaryTable {
        &self.bcs
    }

    /// 是否存在有效的压力给定面
    #[inline]
    pub fn pressure_anchored(&self) -> bool {
        self.pressure_anchored
    }

    /// 预测步前的边界处理（返回新场）
    pub fn apply_pre(&self, grid: &Grid, faces: &FaceTable, vel: &VelocityField) -> VelocityField {
        let mut out = vel.clone();
        out.zero_blocked(faces);

        for face in Face::ALL {
            let d = face.axis();
            let bc = self.bcs.get(face);
            let comp = out.component_mut(d);
            for f in faces.on_boundary(d, face) {
                comp[f] = match bc {
                    BoundaryCondition::Inflow { velocity } => velocity[d],
                    BoundaryCondition::NoSlip | BoundaryCondition::FreeSlip => 0.0,
                    BoundaryCondition::Outflow | BoundaryCondition::PressureDirichlet { .. } => {
                        comp[adjacent_face(grid, d, f, face)]
                    }
                };
            }
        }

        if self.bcs.has_outflow() && !self.pressure_anchored {
            self.balance_outflow(grid, faces, &mut out);
        }
        out
    }

    /// 校正步后的边界处理
    ///
    /// 返回压力虚拟层（仅当存在压力给定面时）。
    pub fn apply_post(
        &self,
        grid: &Grid,
        faces: &FaceTable,
        vel: &mut VelocityField,
        p: &[f64],
    ) -> Option<GhostField> {
        vel.zero_blocked(faces);
        for face in Face::ALL {
            let d = face.axis();
            let value = match self.bcs.get(face) {
                BoundaryCondition::Inflow { velocity } => velocity[d],
                BoundaryCondition::NoSlip | BoundaryCondition::FreeSlip => 0.0,
                _ => continue,
            };
            let comp = vel.component_mut(d);
            for f in faces.on_boundary(d, face) {
                comp[f] = value;
            }
        }

        if !self.bcs.has_pressure_dirichlet() {
            return None;
        }
        let mut halo = GhostField::from_interior(grid, p).ok()?;
        halo.sync(&pressure_rules(&self.bcs));
        Some(halo)
    }

    /// 边界净通量
    pub fn boundary_flux(
        &self,
        grid: &Grid,
        faces: &FaceTable,
        vel: &VelocityField,
    ) -> BoundaryFlux {
        let mut flux = BoundaryFlux::default();
        for face in Face::ALL {
            let d = face.axis();
            let area = grid.face_area(d);
            let sign = if face.is_max() { 1.0 } else { -1.0 };
            let comp = vel.component(d);
            let is_outflow = matches!(self.bcs.get(face), BoundaryCondition::Outflow);
            for f in faces.on_boundary(d, face) {
                let q = sign * comp[f] * area;
                if is_outflow {
                    flux.outflow += q;
                    flux.outflow_area += area;
                } else {
                    flux.fixed += q;
                }
            }
        }
        flux
    }

    /// 调整出口速度，使边界净通量为零
    fn balance_outflow(&self, grid: &Grid, faces: &FaceTable, vel: &mut VelocityField) {
        let flux = self.boundary_flux(grid, faces, vel);
        if flux.outflow_area <= 0.0 {
            return;
        }

        let target = -flux.fixed;
        if flux.outflow.abs() > FLUX_EPS && target * flux.outflow > 0.0 {
            let factor = target / flux.outflow;
            debug!("出口通量缩放: {:.6e} -> {:.6e} (系数 {:.6})", flux.outflow, target, factor);
            for face in outflow_faces(&self.bcs) {
                let comp = vel.component_mut(face.axis());
                for f in faces.on_boundary(face.axis(), face) {
                    comp[f] *= factor;
                }
            }
        } else {
            let q = target / flux.outflow_area;
            debug!("出口通量重置为均匀流出速度 {:.6e}", q);
            for face in outflow_faces(&self.bcs) {
                let sign = if face.is_max() { 1.0 } else { -1.0 };
                let comp = vel.component_mut(face.axis());
                for f in faces.on_boundary(face.axis(), face) {
                    comp[f] = sign * q;
                }
            }
        }
    }
}

fn outflow_faces(bcs: &BoundaryTable) -> impl Iterator<Item = Face> + '_ {
    bcs.iter()
        .filter(|(_, bc)| matches!(bc, BoundaryCondition::Outflow))
        .map(|(face, _)| face)
}

/// 边界面 f 向内一格的同分量面
fn adjacent_face(grid: &Grid, d: usize, f: usize, face: Face) -> usize {
    let mut ijk = grid.face_coords(d, f);
    if face.is_max() {
        ijk[d] -= 1;
    } else {
        ijk[d] += 1;
    }
    grid.face_at(d, ijk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::Mask;
    use glam::DVec3;

    fn setup(n: usize, bcs: BoundaryTable) -> (Grid, FaceTable, BoundaryEngine) {
        let g = Grid::unit_cube(n).unwrap();
        let faces = FaceTable::build(&g, &Mask::all_fluid(&g));
        let engine = BoundaryEngine::new(bcs, &faces);
        (g, faces, engine)
    }

    #[test]
    fn test_dirichlet_normals() {
        let bcs = BoundaryTable::uniform(BoundaryCondition::NoSlip).with(
            Face::XMin,
            BoundaryCondition::Inflow {
                velocity: DVec3::new(2.0, 0.0, 0.0),
            },
        );
        let (g, faces, engine) = setup(3, bcs);
        let vel = VelocityField::uniform(&g, DVec3::ONE);
        let pre = engine.apply_pre(&g, &faces, &vel);

        assert_eq!(pre.u()[g.u_index(0, 1, 1)], 2.0);
        assert_eq!(pre.u()[g.u_index(3, 1, 1)], 0.0);
        assert_eq!(pre.v()[g.v_index(1, 0, 1)], 0.0);
        assert_eq!(pre.u()[g.u_index(1, 1, 1)], 1.0);
        // 输入未被修改
        assert_eq!(vel.u()[g.u_index(0, 1, 1)], 1.0);
    }

    #[test]
    fn test_outflow_zero_gradient_with_pressure_anchor() {
        let bcs = BoundaryTable::uniform(BoundaryCondition::FreeSlip)
            .with(Face::XMax, BoundaryCondition::PressureDirichlet { p: 0.0 });
        let (g, faces, engine) = setup(3, bcs);
        let mut vel = VelocityField::zeros(&g);
        vel.comps[0][g.u_index(2, 1, 1)] = 0.7;
        let pre = engine.apply_pre(&g, &faces, &vel);
        assert_eq!(pre.u()[g.u_index(3, 1, 1)], 0.7);
    }

    #[test]
    fn test_outflow_balancing() {
        let bcs = BoundaryTable::uniform(BoundaryCondition::NoSlip)
            .with(
                Face::XMin,
                BoundaryCondition::Inflow {
                    velocity: DVec3::new(1.0, 0.0, 0.0),
                },
            )
            .with(Face::XMax, BoundaryCondition::Outflow);
        let (g, faces, engine) = setup(3, bcs);

        // 内部静止：出口复制得 0，通量重置为均匀流出
        let pre = engine.apply_pre(&g, &faces, &VelocityField::zeros(&g));
        assert!(engine.boundary_flux(&g, &faces, &pre).net().abs() < 1e-12);
        assert!((pre.u()[g.u_index(3, 2, 0)] - 1.0).abs() < 1e-12);

        // 内部流速 0.5：出口按系数 2 缩放
        let interior = VelocityField::uniform(&g, DVec3::new(0.5, 0.0, 0.0));
        let pre = engine.apply_pre(&g, &faces, &interior);
        assert!(engine.boundary_flux(&g, &faces, &pre).net().abs() < 1e-12);
        assert!((pre.u()[g.u_index(3, 1, 1)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_apply_post_is_idempotent_and_writes_halo() {
        let bcs = BoundaryTable::uniform(BoundaryCondition::NoSlip)
            .with(Face::ZMax, BoundaryCondition::PressureDirichlet { p: 2.0 });
        let (g, faces, engine) = setup(2, bcs);
        let mut vel = VelocityField::uniform(&g, DVec3::ONE);
        let p = vec![1.0; g.n_cells()];

        let halo = engine.apply_post(&g, &faces, &mut vel, &p).unwrap();
        let once = vel.clone();
        engine.apply_post(&g, &faces, &mut vel, &p);
        assert_eq!(vel, once);
        assert_eq!(vel.w()[g.w_index(0, 0, 0)], 0.0);
        assert_eq!(vel.w()[g.w_index(0, 0, 2)], 1.0);
        assert_eq!(halo.get(1, 1, 3), 2.0);
        assert_eq!(halo.get(1, 1, 0), 1.0);
    }

    #[test]
    fn test_no_halo_without_pressure_faces() {
        let (g, faces, engine) = setup(2, BoundaryTable::uniform(BoundaryCondition::NoSlip));
        let mut vel = VelocityField::zeros(&g);
        assert!(engine.apply_post(&g, &faces, &mut vel, &vec![0.0; 8]).is_none());
    }
}
