// crates/mf_physics/src/grid.rs

//! 均匀笛卡尔 MAC 网格
//!
//! 压力位于单元中心，速度分量位于与其正交的面中心：
//! - `P`: `(nx, ny, nz)`
//! - `U`: `(nx+1, ny, nz)`，x = i·dx 处的 yz 面
//! - `V`: `(nx, ny+1, nz)`，y = j·dy 处的 xz 面
//! - `W`: `(nx, ny, nz+1)`，z = k·dz 处的 xy 面
//!
//! # 扁平化约定
//!
//! 所有数组均以 i 为最快变化轴：
//!
//! ```text
//! cell(i,j,k)     = i + nx*(j + ny*k)
//! face_d(i,j,k)   = i + mx*(j + my*k),  (mx,my,mz) = 面阵列形状
//! ```
//!
//! 堆叠速度向量的顺序为 `[U | V | W]`。

use glam::DVec3;
use serde::{Deserialize, Serialize};

use mf_config::DomainConfig;
use mf_foundation::{ensure, MfError, MfResult};

/// 轴名称
pub const AXIS_NAMES: [&str; 3] = ["x", "y", "z"];

/// 均匀笛卡尔网格描述
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    /// 单元数 (nx, ny, nz)
    pub counts: [usize; 3],
    /// 下角点 (x_min, y_min, z_min)
    pub origin: DVec3,
    /// 上角点 (x_max, y_max, z_max)
    pub upper: DVec3,
    /// 网格间距 (dx, dy, dz)
    pub spacing: DVec3,
}

impl Grid {
    /// 由各轴范围和单元数构建网格
    ///
    /// 单元数为零、范围非有限或 max ≤ min 时返回配置错误。
    pub fn build(extents: [(f64, f64); 3], counts: [usize; 3]) -> MfResult<Self> {
        for axis in 0..3 {
            let (lo, hi) = extents[axis];
            let name = AXIS_NAMES[axis];
            ensure!(counts[axis] > 0, MfError::config(format!("n{} 必须为正整数", name)));
            ensure!(
                lo.is_finite() && hi.is_finite(),
                MfError::config(format!(
                    "{}_min/{}_max 必须为有限值: [{}, {}]",
                    name, name, lo, hi
                ))
            );
            ensure!(
                hi > lo,
                MfError::config(format!("{}_max={} 必须大于 {}_min={}", name, hi, name, lo))
            );
        }

        let origin = DVec3::new(extents[0].0, extents[1].0, extents[2].0);
        let upper = DVec3::new(extents[0].1, extents[1].1, extents[2].1);
        let n = DVec3::new(counts[0] as f64, counts[1] as f64, counts[2] as f64);
        Ok(Self {
            counts,
            origin,
            upper,
            spacing: (upper - origin) / n,
        })
    }

    /// 从配置的计算域构建
    pub fn from_domain(domain: &DomainConfig) -> MfResult<Self> {
        Self::build(domain.extents(), domain.counts())
    }

    /// 单位立方体上的 n×n×n 网格
    pub fn unit_cube(n: usize) -> MfResult<Self> {
        Self::build([(0.0, 1.0); 3], [n; 3])
    }

    // ========== 尺寸 ==========

    /// x 方向单元数
    #[inline]
    pub fn nx(&self) -> usize {
        self.counts[0]
    }

    /// y 方向单元数
    #[inline]
    pub fn ny(&self) -> usize {
        self.counts[1]
    }

    /// z 方向单元数
    #[inline]
    pub fn nz(&self) -> usize {
        self.counts[2]
    }

    /// x 方向间距
    #[inline]
    pub fn dx(&self) -> f64 {
        self.spacing.x
    }

    /// y 方向间距
    #[inline]
    pub fn dy(&self) -> f64 {
        self.spacing.y
    }

    /// z 方向间距
    #[inline]
    pub fn dz(&self) -> f64 {
        self.spacing.z
    }

    /// 第 axis 轴的间距
    #[inline]
    pub fn h(&self, axis: usize) -> f64 {
        self.spacing[axis]
    }

    /// 单元体积
    #[inline]
    pub fn cell_volume(&self) -> f64 {
        self.spacing.x * self.spacing.y * self.spacing.z
    }

    /// 法向为 axis 的面面积
    #[inline]
    pub fn face_area(&self, axis: usize) -> f64 {
        self.cell_volume() / self.spacing[axis]
    }

    /// 单元总数 |P|
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.counts.iter().product()
    }

    /// 速度分量 axis 的面阵列形状
    #[inline]
    pub fn face_dims(&self, axis: usize) -> [usize; 3] {
        let mut dims = self.counts;
        dims[axis] += 1;
        dims
    }

    /// 速度分量 axis 的面数
    #[inline]
    pub fn n_faces(&self, axis: usize) -> usize {
        self.face_dims(axis).iter().product()
    }

    /// 全部速度自由度 |U|+|V|+|W|
    #[inline]
    pub fn n_velocity_dofs(&self) -> usize {
        (0..3).map(|a| self.n_faces(a)).sum()
    }

    /// 分量 axis 在堆叠速度向量中的起始偏移
    #[inline]
    pub fn face_offset(&self, axis: usize) -> usize {
        (0..axis).map(|a| self.n_faces(a)).sum()
    }

    // ========== 索引 ==========

    /// 单元扁平索引 `i + nx*(j + ny*k)`
    #[inline]
    pub fn cell_index(&self, i: usize, j: usize, k: usize) -> usize {
        i + self.counts[0] * (j + self.counts[1] * k)
    }

    /// 单元扁平索引（三元组形式）
    #[inline]
    pub fn cell_at(&self, ijk: [usize; 3]) -> usize {
        self.cell_index(ijk[0], ijk[1], ijk[2])
    }

    /// 单元扁平索引还原为 (i, j, k)
    #[inline]
    pub fn cell_coords(&self, idx: usize) -> [usize; 3] {
        unflatten(idx, self.counts)
    }

    /// 分量 axis 的面扁平索引
    #[inline]
    pub fn face_at(&self, axis: usize, ijk: [usize; 3]) -> usize {
        let dims = self.face_dims(axis);
        ijk[0] + dims[0] * (ijk[1] + dims[1] * ijk[2])
    }

    /// 面扁平索引还原为 (i, j, k)
    #[inline]
    pub fn face_coords(&self, axis: usize, idx: usize) -> [usize; 3] {
        unflatten(idx, self.face_dims(axis))
    }

    /// U 面索引
    #[inline]
    pub fn u_index(&self, i: usize, j: usize, k: usize) -> usize {
        self.face_at(0, [i, j, k])
    }

    /// V 面索引
    #[inline]
    pub fn v_index(&self, i: usize, j: usize, k: usize) -> usize {
        self.face_at(1, [i, j, k])
    }

    /// W 面索引
    #[inline]
    pub fn w_index(&self, i: usize, j: usize, k: usize) -> usize {
        self.face_at(2, [i, j, k])
    }

    /// 面 (axis, ijk) 两侧的单元，越出计算域的一侧为 None
    ///
    /// 返回 (下侧单元, 上侧单元)。
    #[inline]
    pub fn face_cells(&self, axis: usize, ijk: [usize; 3]) -> (Option<usize>, Option<usize>) {
        let lower = if ijk[axis] > 0 {
            let mut c = ijk;
            c[axis] -= 1;
            Some(self.cell_at(c))
        } else {
            None
        };
        let upper = if ijk[axis] < self.counts[axis] {
            Some(self.cell_at(ijk))
        } else {
            None
        };
        (lower, upper)
    }

    // ========== 坐标 ==========

    /// 单元中心坐标
    #[inline]
    pub fn cell_center(&self, i: usize, j: usize, k: usize) -> DVec3 {
        self.origin + (DVec3::new(i as f64, j as f64, k as f64) + 0.5) * self.spacing
    }

    /// 分量 axis 的面中心坐标
    #[inline]
    pub fn face_center(&self, axis: usize, ijk: [usize; 3]) -> DVec3 {
        let mut offset = DVec3::splat(0.5);
        offset[axis] = 0.0;
        self.origin
            + (DVec3::new(ijk[0] as f64, ijk[1] as f64, ijk[2] as f64) + offset) * self.spacing
    }
}

#[inline]
fn unflatten(idx: usize, dims: [usize; 3]) -> [usize; 3] {
    let i = idx % dims[0];
    let rest = idx / dims[0];
    [i, rest % dims[1], rest / dims[1]]
}
