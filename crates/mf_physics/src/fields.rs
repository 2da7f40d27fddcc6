// crates/mf_physics/src/fields.rs

//! MAC 场存储
//!
//! - [`VelocityField`]: 三个交错速度分量 `U, V, W`
//! - [`MacFields`]: 压力、速度与掩码副本
//!
//! 全部为双精度扁平数组，布局见 [`crate::grid`]。

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::mask::Mask;
use crate::operators::FaceTable;
use mf_foundation::{MfError, MfResult};

/// 速度分量名称
pub const COMPONENT_NAMES: [&str; 3] = ["U", "V", "W"];

/// 交错速度场
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityField {
    /// 三个分量，按 U, V, W 顺序
    pub comps: [Vec<f64>; 3],
}

impl VelocityField {
    /// 零初始化
    pub fn zeros(grid: &Grid) -> Self {
        Self {
            comps: [0, 1, 2].map(|axis| vec![0.0; grid.n_faces(axis)]),
        }
    }

    /// 各分量取常值
    pub fn uniform(grid: &Grid, value: DVec3) -> Self {
        Self {
            comps: [0, 1, 2].map(|axis| vec![value[axis]; grid.n_faces(axis)]),
        }
    }

    /// U 分量
    #[inline]
    pub fn u(&self) -> &[f64] {
        &self.comps[0]
    }

    /// V 分量
    #[inline]
    pub fn v(&self) -> &[f64] {
        &self.comps[1]
    }

    /// W 分量
    #[inline]
    pub fn w(&self) -> &[f64] {
        &self.comps[2]
    }

    /// 第 axis 个分量
    #[inline]
    pub fn component(&self, axis: usize) -> &[f64] {
        &self.comps[axis]
    }

    /// 第 axis 个分量（可变）
    #[inline]
    pub fn component_mut(&mut self, axis: usize) -> &mut [f64] {
        &mut self.comps[axis]
    }

    /// 堆叠为 `[U | V | W]`
    pub fn stacked(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.len());
        for comp in &self.comps {
            out.extend_from_slice(comp);
        }
        out
    }

    /// 从堆叠向量拆分
    pub fn from_stacked(grid: &Grid, stacked: &[f64]) -> MfResult<Self> {
        MfError::check_size("velocity", grid.n_velocity_dofs(), stacked.len())?;
        let mut offset = 0;
        let comps = [0, 1, 2].map(|axis| {
            let n = grid.n_faces(axis);
            let comp = stacked[offset..offset + n].to_vec();
            offset += n;
            comp
        });
        Ok(Self { comps })
    }

    /// 自由度总数
    pub fn len(&self) -> usize {
        self.comps.iter().map(Vec::len).sum()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 所有面上的最大 |速度|
    pub fn max_abs(&self) -> f64 {
        self.comps
            .iter()
            .flat_map(|c| c.iter())
            .fold(0.0, |m, &v| m.max(v.abs()))
    }

    /// 将被固体阻塞的面置零
    pub fn zero_blocked(&mut self, faces: &FaceTable) {
        for axis in 0..3 {
            let comp = &mut self.comps[axis];
            for idx in faces.blocked(axis) {
                comp[idx] = 0.0;
            }
        }
    }

    /// 第一个非有限值 (分量名, 索引, 值)
    pub fn first_non_finite(&self) -> Option<(&'static str, usize, f64)> {
        self.comps.iter().enumerate().find_map(|(axis, comp)| {
            comp.iter()
                .position(|v| !v.is_finite())
                .map(|idx| (COMPONENT_NAMES[axis], idx, comp[idx]))
        })
    }
}

/// 求解器的主场
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacFields {
    /// 单元中心压力 `(nx, ny, nz)`
    pub p: Vec<f64>,
    /// 面中心速度
    pub vel: VelocityField,
    /// 掩码副本
    pub mask: Vec<i32>,
}

impl MacFields {
    /// 校验各数组长度符合 MAC 形状
    pub fn check_shapes(&self, grid: &Grid) -> MfResult<()> {
        MfError::check_size("P", grid.n_cells(), self.p.len())?;
        MfError::check_size("mask", grid.n_cells(), self.mask.len())?;
        for axis in 0..3 {
            let actual = self.vel.comps[axis].len();
            MfError::check_size(COMPONENT_NAMES[axis], grid.n_faces(axis), actual)?;
        }
        Ok(())
    }

    /// 第一个非有限值 (字段名, 索引, 值)
    pub fn first_non_finite(&self) -> Option<(&'static str, usize, f64)> {
        self.p
            .iter()
            .position(|v| !v.is_finite())
            .map(|idx| ("P", idx, self.p[idx]))
            .or_else(|| self.vel.first_non_finite())
    }

    /// 施加初始条件
    ///
    /// 所有单元取 p0，所有面取 (u0, v0, w0)，随后固体单元压力
    /// 与被阻塞的面速度重置为零。
    pub fn apply_initial(&mut self, velocity: DVec3, pressure: f64, faces: &FaceTable) {
        for (p, &m) in self.p.iter_mut().zip(&self.mask) {
            *p = if m == 0 { 0.0 } else { pressure };
        }
        for axis in 0..3 {
            self.vel.comps[axis].fill(velocity[axis]);
        }
        self.vel.zero_blocked(faces);
    }
}

/// 分配零初始化的 MAC 场
pub fn allocate_fields(grid: &Grid, mask: &Mask) -> MacFields {
    MacFields {
        p: vec![0.0; grid.n_cells()],
        vel: VelocityField::zeros(grid),
        mask: mask.values().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_shapes() {
        let g = Grid::build([(0.0, 1.0); 3], [2, 3, 4]).unwrap();
        let f = allocate_fields(&g, &Mask::all_fluid(&g));
        assert_eq!(f.p.len(), 24);
        assert_eq!(f.vel.u().len(), 3 * 3 * 4);
        assert_eq!(f.vel.v().len(), 2 * 4 * 4);
        assert_eq!(f.vel.w().len(), 2 * 3 * 5);
        assert!(f.check_shapes(&g).is_ok());
    }

    #[test]
    fn test_stacked_split() {
        let g = Grid::unit_cube(2).unwrap();
        let mut vel = VelocityField::zeros(&g);
        vel.comps[1][3] = 2.0;
        let s = vel.stacked();
        assert_eq!(s[g.face_offset(1) + 3], 2.0);
        assert_eq!(VelocityField::from_stacked(&g, &s).unwrap(), vel);
        assert!(VelocityField::from_stacked(&g, &s[1..]).is_err());
    }

    #[test]
    fn test_apply_initial_zeroes_solids() {
        let g = Grid::unit_cube(3).unwrap();
        let mask = Mask::all_fluid(&g).with_solid_cells(&[[1, 1, 1]]);
        let faces = FaceTable::build(&g, &mask);
        let mut f = allocate_fields(&g, &mask);
        f.apply_initial(DVec3::new(1.0, 2.0, 3.0), 5.0, &faces);

        assert_eq!(f.p[g.cell_index(1, 1, 1)], 0.0);
        assert_eq!(f.p[g.cell_index(0, 0, 0)], 5.0);
        assert_eq!(f.vel.u()[g.u_index(1, 1, 1)], 0.0);
        assert_eq!(f.vel.u()[g.u_index(2, 1, 1)], 0.0);
        assert_eq!(f.vel.w()[g.w_index(1, 1, 2)], 0.0);
        assert_eq!(f.vel.v()[g.v_index(0, 0, 0)], 2.0);
    }

    #[test]
    fn test_first_non_finite() {
        let g = Grid::unit_cube(2).unwrap();
        let mut f = allocate_fields(&g, &Mask::all_fluid(&g));
        assert!(f.first_non_finite().is_none());
        f.vel.comps[2][4] = f64::NAN;
        let (name, idx, _) = f.first_non_finite().unwrap();
        assert_eq!((name, idx), ("W", 4));
    }
}
