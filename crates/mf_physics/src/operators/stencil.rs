// crates/mf_physics/src/operators/stencil.rs

//! 面网格七点模板的邻点查找
//!
//! 向量拉普拉斯与对流算子在内部面上使用同一套邻点规则：
//!
//! - 法向邻点（沿分量自身的轴）总在域内，直接取面值
//! - 切向邻点越出计算域时，以边界条件给出的虚拟值替代
//! - 切向邻点为阻塞面时，按无滑移壁面处理
//!
//! 虚拟值统一写作 `ghost = scale·F + offset`，其中 F 为中心面的值。
//!
//! | 边界条件 | scale | offset |
//! |----------|-------|--------|
//! | 无滑移 | -1 | 0 |
//! | 自由滑移 / 出口 / 压力给定 | 1 | 0 |
//! | 入口 | -1 | 2·v_b |

use crate::grid::Grid;
use crate::operators::faces::FaceTable;
use mf_config::{BoundaryCondition, BoundaryTable, Face};

/// 邻点
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Neighbor {
    /// 真实面（同一分量内的扁平索引）
    Face(usize),
    /// 虚拟面，值为 `scale·F + offset`
    Ghost {
        /// 中心面值的系数
        scale: f64,
        /// 常数项
        offset: f64,
    },
}

impl Neighbor {
    /// 无滑移壁面镜像
    pub const WALL: Neighbor = Neighbor::Ghost {
        scale: -1.0,
        offset: 0.0,
    };

    /// 在分量数组上取值，`center` 为中心面的值
    #[inline]
    pub fn value(self, comp: &[f64], center: f64) -> f64 {
        match self {
            Neighbor::Face(idx) => comp[idx],
            Neighbor::Ghost { scale, offset } => scale * center + offset,
        }
    }
}

/// 模板上下文
#[derive(Debug, Clone, Copy)]
pub struct StencilContext<'a> {
    /// 网格
    pub grid: &'a Grid,
    /// 面分类
    pub faces: &'a FaceTable,
    /// 边界表
    pub bcs: &'a BoundaryTable,
}

impl<'a> StencilContext<'a> {
    /// 创建上下文
    pub fn new(grid: &'a Grid, faces: &'a FaceTable, bcs: &'a BoundaryTable) -> Self {
        Self { grid, faces, bcs }
    }

    /// 分量 d 在面 ijk 处沿 e 轴 `upper` 侧的邻点
    ///
    /// 仅对内部面（沿 d 的索引为 1..n-1）调用。
    pub fn neighbor(&self, d: usize, ijk: [usize; 3], e: usize, upper: bool) -> Neighbor {
        let dims = self.grid.face_dims(d);
        let pos = ijk[e];
        let outside = if upper { pos + 1 >= dims[e] } else { pos == 0 };

        if outside {
            debug_assert_ne!(d, e, "法向邻点不应越出计算域");
            return tangential_ghost(self.bcs.get(Face::from_axis(e, upper)), d);
        }

        let mut n = ijk;
        n[e] = if upper { pos + 1 } else { pos - 1 };
        let idx = self.grid.face_at(d, n);
        if e != d && self.faces.kind(d, idx).is_blocked() {
            return Neighbor::WALL;
        }
        Neighbor::Face(idx)
    }
}

/// 分量 d 在边界条件 bc 所在面外侧的切向虚拟值
fn tangential_ghost(bc: BoundaryCondition, d: usize) -> Neighbor {
    match bc {
        BoundaryCondition::NoSlip => Neighbor::WALL,
        BoundaryCondition::FreeSlip
        | BoundaryCondition::Outflow
        | BoundaryCondition::PressureDirichlet { .. } => Neighbor::Ghost {
            scale: 1.0,
            offset: 0.0,
        },
        BoundaryCondition::Inflow { velocity } => Neighbor::Ghost {
            scale: -1.0,
            offset: 2.0 * velocity[d],
        },
    }
}
