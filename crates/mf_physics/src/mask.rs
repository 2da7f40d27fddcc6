// crates/mf_physics/src/mask.rs

//! 障碍物掩码
//!
//! 每个单元一个三态整数：
//! - `1`: 流体
//! - `0`: 固体
//! - `-1`: 边界流体
//!
//! 所有离散算子把边界流体与普通流体同等对待，区别仅用于诊断输出。

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use mf_foundation::{ensure, MfError, MfResult};

/// 流体
pub const FLUID: i32 = 1;
/// 固体
pub const SOLID: i32 = 0;
/// 边界流体
pub const BOUNDARY_FLUID: i32 = -1;

/// 单元掩码（按 `i + nx*(j + ny*k)` 扁平化）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mask {
    counts: [usize; 3],
    values: Vec<i32>,
}

/// 由掩码派生的布尔场
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedMasks {
    /// mask ≠ 0
    pub is_fluid: Vec<bool>,
    /// mask == -1
    pub is_boundary_fluid: Vec<bool>,
    /// mask == 0
    pub is_solid: Vec<bool>,
}

impl Mask {
    /// 从扁平数组与形状读入掩码
    ///
    /// # 错误
    ///
    /// 以下情况返回几何错误：
    /// - 长度与形状乘积不一致
    /// - 形状与网格单元数不一致
    /// - 取值不在 {-1, 0, 1} 中
    /// - 不存在流体单元
    pub fn ingest(flat: &[i32], shape: &[usize], grid: &Grid) -> MfResult<Self> {
        let expected: usize = shape.iter().product();
        ensure!(
            !shape.is_empty() && flat.len() == expected,
            MfError::geometry(format!(
                "mask_flat 长度 {} 与 mask_shape {:?} 不一致",
                flat.len(),
                shape
            ))
        );
        ensure!(
            shape == grid.counts.as_slice(),
            MfError::geometry(format!("mask_shape {:?} 与网格 {:?} 不一致", shape, grid.counts))
        );
        if let Some((idx, &v)) = flat
            .iter()
            .enumerate()
            .find(|&(_, &v)| !matches!(v, FLUID | SOLID | BOUNDARY_FLUID))
        {
            let [i, j, k] = grid.cell_coords(idx);
            return Err(MfError::geometry(format!(
                "掩码单元 ({}, {}, {}) 取值 {} 不在 {{-1, 0, 1}} 中",
                i, j, k, v
            )));
        }
        ensure!(flat.iter().any(|&v| v != SOLID), MfError::geometry("计算域内不存在流体单元"));

        Ok(Self {
            counts: grid.counts,
            values: flat.to_vec(),
        })
    }

    /// 全流体掩码
    pub fn all_fluid(grid: &Grid) -> Self {
        Self {
            counts: grid.counts,
            values: vec![FLUID; grid.n_cells()],
        }
    }

    /// 将若干单元设为固体（测试与演示用）
    pub fn with_solid_cells(mut self, cells: &[[usize; 3]]) -> Self {
        let [nx, ny, _] = self.counts;
        for &[i, j, k] in cells {
            self.values[i + nx * (j + ny * k)] = SOLID;
        }
        self
    }

    /// 形状 (nx, ny, nz)
    #[inline]
    pub fn counts(&self) -> [usize; 3] {
        self.counts
    }

    /// 单元数
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 原始取值
    #[inline]
    pub fn values(&self) -> &[i32] {
        &self.values
    }

    /// 单元取值
    #[inline]
    pub fn get(&self, cell: usize) -> i32 {
        self.values[cell]
    }

    /// 单元是否为流体（含边界流体）
    #[inline]
    pub fn is_fluid(&self, cell: usize) -> bool {
        self.values[cell] != SOLID
    }

    /// 单元是否为固体
    #[inline]
    pub fn is_solid(&self, cell: usize) -> bool {
        self.values[cell] == SOLID
    }

    /// 流体单元数
    pub fn fluid_count(&self) -> usize {
        self.values.iter().filter(|&&v| v != SOLID).count()
    }

    /// 边界流体单元数
    pub fn boundary_fluid_count(&self) -> usize {
        self.values.iter().filter(|&&v| v == BOUNDARY_FLUID).count()
    }

    /// 固体单元数
    pub fn solid_count(&self) -> usize {
        self.values.iter().filter(|&&v| v == SOLID).count()
    }

    /// 派生布尔场
    pub fn derive(&self) -> DerivedMasks {
        DerivedMasks {
            is_fluid: self.values.iter().map(|&v| v != SOLID).collect(),
            is_boundary_fluid: self.values.iter().map(|&v| v == BOUNDARY_FLUID).collect(),
            is_solid: self.values.iter().map(|&v| v == SOLID).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid::build([(0.0, 1.0); 3], [2, 2, 1]).unwrap()
    }

    #[test]
    fn test_ingest_ok() {
        let g = grid();
        let m = Mask::ingest(&[1, 0, -1, 1], &[2, 2, 1], &g).unwrap();
        assert_eq!(m.fluid_count(), 3);
        assert_eq!(m.solid_count(), 1);
        assert_eq!(m.boundary_fluid_count(), 1);
        assert!(m.is_fluid(2));
        assert!(m.is_solid(1));
    }

    #[test]
    fn test_ingest_errors_are_geometry() {
        use mf_foundation::ErrorKind;
        let g = grid();
        let cases: [(&[i32], &[usize]); 4] = [
            (&[1, 1, 1], &[2, 2, 1]),
            (&[1, 1, 1, 1], &[4, 1, 1]),
            (&[1, 2, 1, 1], &[2, 2, 1]),
            (&[0, 0, 0, 0], &[2, 2, 1]),
        ];
        for (flat, shape) in cases {
            let err = Mask::ingest(flat, shape, &g).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Geometry, "{:?}", flat);
        }
    }

    #[test]
    fn test_derive() {
        let g = grid();
        let d = Mask::ingest(&[1, 0, -1, 1], &[2, 2, 1], &g).unwrap().derive();
        assert_eq!(d.is_fluid, vec![true, false, true, true]);
        assert_eq!(d.is_boundary_fluid, vec![false, false, true, false]);
        assert_eq!(d.is_solid, vec![false, true, false, false]);
    }

    #[test]
    fn test_with_solid_cells() {
        let g = Grid::unit_cube(3).unwrap();
        let m = Mask::all_fluid(&g).with_solid_cells(&[[1, 1, 1]]);
        assert!(m.is_solid(g.cell_index(1, 1, 1)));
        assert_eq!(m.fluid_count(), 26);
    }
}
