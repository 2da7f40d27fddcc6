// crates/mf_physics/src/operators/faces.rs

//! 速度面分类
//!
//! 每个速度面属于以下三类之一：
//!
//! - [`FaceKind::Blocked`]: 任一相邻的域内单元为固体，速度恒为零
//! - [`FaceKind::Boundary`]: 位于计算域边界（沿自身轴索引为 0 或 n）
//! - [`FaceKind::Open`]: 两侧均为流体的内部面
//!
//! 固体优先：边界面若紧邻固体单元，同样归为 Blocked。

use crate::grid::Grid;
use crate::mask::Mask;
use mf_config::Face;

/// 速度面类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceKind {
    /// 内部流体面
    Open,
    /// 计算域边界面（相邻单元为流体）
    Boundary(Face),
    /// 与固体相邻的面
    Blocked,
}

impl FaceKind {
    /// 是否为内部流体面
    #[inline]
    pub fn is_open(self) -> bool {
        matches!(self, FaceKind::Open)
    }

    /// 是否被固体阻塞
    #[inline]
    pub fn is_blocked(self) -> bool {
        matches!(self, FaceKind::Blocked)
    }
}

/// 三个速度分量的面分类表
#[derive(Debug, Clone)]
pub struct FaceTable {
    kinds: [Vec<FaceKind>; 3],
}

impl FaceTable {
    /// 由网格与掩码构建
    pub fn build(grid: &Grid, mask: &Mask) -> Self {
        let kinds = [0, 1, 2].map(|axis| {
            let n = grid.counts[axis];
            (0..grid.n_faces(axis))
                .map(|idx| {
                    let ijk = grid.face_coords(axis, idx);
                    let (lo, hi) = grid.face_cells(axis, ijk);
                    let solid = lo.map_or(false, |c| mask.is_solid(c))
                        || hi.map_or(false, |c| mask.is_solid(c));
                    if solid {
                        FaceKind::Blocked
                    } else if ijk[axis] == 0 {
                        FaceKind::Boundary(Face::from_axis(axis, false))
                    } else if ijk[axis] == n {
                        FaceKind::Boundary(Face::from_axis(axis, true))
                    } else {
                        FaceKind::Open
                    }
                })
                .collect()
        });
        Self { kinds }
    }

    /// 面类别
    #[inline]
    pub fn kind(&self, axis: usize, idx: usize) -> FaceKind {
        self.kinds[axis][idx]
    }

    /// 分量 axis 的全部面类别
    #[inline]
    pub fn component(&self, axis: usize) -> &[FaceKind] {
        &self.kinds[axis]
    }

    /// 分量 axis 中被阻塞的面索引
    pub fn blocked(&self, axis: usize) -> impl Iterator<Item = usize> + '_ {
        self.kinds[axis]
            .iter()
            .enumerate()
            .filter(|(_, k)| k.is_blocked())
            .map(|(idx, _)| idx)
    }

    /// 分量 axis 中位于给定边界面上的（未阻塞）面索引
    pub fn on_boundary(&self, axis: usize, face: Face) -> impl Iterator<Item = usize> + '_ {
        self.kinds[axis]
            .iter()
            .enumerate()
            .filter(move |&(_, &k)| k == FaceKind::Boundary(face))
            .map(|(idx, _)| idx)
    }

    /// 被阻塞的面总数
    pub fn blocked_count(&self) -> usize {
        (0..3).map(|a| self.blocked(a).count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_fluid_classification() {
        let g = Grid::unit_cube(3).unwrap();
        let t = FaceTable::build(&g, &Mask::all_fluid(&g));
        assert_eq!(t.kind(0, g.u_index(0, 1, 1)), FaceKind::Boundary(Face::XMin));
        assert_eq!(t.kind(0, g.u_index(3, 1, 1)), FaceKind::Boundary(Face::XMax));
        assert_eq!(t.kind(1, g.v_index(1, 3, 0)), FaceKind::Boundary(Face::YMax));
        assert_eq!(t.kind(2, g.w_index(2, 2, 0)), FaceKind::Boundary(Face::ZMin));
        assert!(t.kind(0, g.u_index(1, 0, 0)).is_open());
        assert_eq!(t.blocked_count(), 0);
        assert_eq!(t.on_boundary(0, Face::XMin).count(), 9);
    }

    #[test]
    fn test_solid_wins() {
        let g = Grid::unit_cube(3).unwrap();
        let m = Mask::all_fluid(&g).with_solid_cells(&[[0, 1, 1], [1, 1, 1]]);
        let t = FaceTable::build(&g, &m);
        // 边界面紧邻固体
        assert!(t.kind(0, g.u_index(0, 1, 1)).is_blocked());
        assert!(t.kind(0, g.u_index(1, 1, 1)).is_blocked());
        assert!(t.kind(0, g.u_index(2, 1, 1)).is_blocked());
        assert!(t.kind(1, g.v_index(1, 2, 1)).is_blocked());
        assert!(t.kind(0, g.u_index(3, 1, 1)) == FaceKind::Boundary(Face::XMax));
        assert_eq!(t.on_boundary(0, Face::XMin).count(), 8);
    }
}
