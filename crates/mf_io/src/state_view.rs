// crates/mf_io/src/state_view.rs

//! 求解器状态的 JSON 安全视图
//!
//! 用于快照与结构校验，不参与数值计算：
//!
//! - 三维数组变为嵌套列表 `a[i][j][k]`，对应扁平索引 `i + nx*(j + ny*k)`
//! - 稀疏矩阵变为描述符 `{format: "csr", shape, nnz}`
//! - 对流算子（策略对象）写为 `null`，格式名另存
//!
//! 可选部分（历史、健康指标）始终存在，可能为空。
//!
//! # 使用示例
//!
//! ```
//! use mf_config::SimulationConfig;
//! use mf_io::StateView;
//! use mf_physics::Simulation;
//!
//! let sim = Simulation::new(&SimulationConfig::cube(2)).unwrap();
//! let view = StateView::from_state(sim.state());
//! assert_eq!(view.fields.u.len(), 3);
//! assert_eq!(view.operators.pressure_laplacian.format, "csr");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::IoResult;
use mf_config::{AdvectionScheme, BoundaryRecord};
use mf_physics::numerics::linear_algebra::CsrMatrix;
use mf_physics::{Constants, Grid, Health, History, Lifecycle, SolverState};

/// 三维嵌套列表
pub type Nested3<T> = Vec<Vec<Vec<T>>>;

/// 将扁平数组按 `i + nx*(j + ny*k)` 展开为 `a[i][j][k]`
pub fn nest<T: Copy>(flat: &[T], dims: [usize; 3]) -> Nested3<T> {
    let [nx, ny, nz] = dims;
    debug_assert_eq!(flat.len(), nx * ny * nz);
    (0..nx)
        .map(|i| {
            (0..ny)
                .map(|j| (0..nz).map(|k| flat[i + nx * (j + ny * k)]).collect())
                .collect()
        })
        .collect()
}

/// [`nest`] 的逆操作
pub fn flatten<T: Copy + Default>(nested: &Nested3<T>) -> Vec<T> {
    let nx = nested.len();
    let ny = nested.first().map_or(0, |a| a.len());
    let nz = nested.first().and_then(|a| a.first()).map_or(0, |b| b.len());
    let mut flat = vec![T::default(); nx * ny * nz];
    for (i, plane) in nested.iter().enumerate() {
        for (j, row) in plane.iter().enumerate() {
            for (k, &v) in row.iter().enumerate() {
                flat[i + nx * (j + ny * k)] = v;
            }
        }
    }
    flat
}

// ============================================================
// 视图结构
// ============================================================

/// 稀疏矩阵描述符
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparseDescriptor {
    /// 存储格式，恒为 `"csr"`
    pub format: String,
    /// (行数, 列数)
    pub shape: [usize; 2],
    /// 非零元数
    pub nnz: usize,
}

impl SparseDescriptor {
    /// 由 CSR 矩阵生成
    pub fn of(matrix: &CsrMatrix) -> Self {
        Self {
            format: "csr".to_string(),
            shape: [matrix.n_rows(), matrix.n_cols()],
            nnz: matrix.nnz(),
        }
    }
}

/// 网格信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridView {
    /// 单元数 (nx, ny, nz)
    pub counts: [usize; 3],
    /// 域下界
    pub origin: [f64; 3],
    /// 域上界
    pub upper: [f64; 3],
    /// 间距 (dx, dy, dz)
    pub spacing: [f64; 3],
}

impl From<&Grid> for GridView {
    fn from(grid: &Grid) -> Self {
        Self {
            counts: grid.counts,
            origin: grid.origin.to_array(),
            upper: grid.upper.to_array(),
            spacing: grid.spacing.to_array(),
        }
    }
}

/// 主场
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldsView {
    /// 压力 `(nx, ny, nz)`
    pub p: Nested3<f64>,
    /// U `(nx+1, ny, nz)`
    pub u: Nested3<f64>,
    /// V `(nx, ny+1, nz)`
    pub v: Nested3<f64>,
    /// W `(nx, ny, nz+1)`
    pub w: Nested3<f64>,
}

/// 预测速度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntermediateView {
    /// U*
    pub u_star: Nested3<f64>,
    /// V*
    pub v_star: Nested3<f64>,
    /// W*
    pub w_star: Nested3<f64>,
}

/// 离散算子描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorsView {
    /// 散度 D
    pub divergence: SparseDescriptor,
    /// 梯度 G_U, G_V, G_W
    pub gradient: [SparseDescriptor; 3],
    /// 向量拉普拉斯 L_U, L_V, L_W
    pub laplacian: [SparseDescriptor; 3],
    /// 压力拉普拉斯 A
    pub pressure_laplacian: SparseDescriptor,
    /// 对流算子不可序列化，恒为 null
    pub advection: Option<Value>,
    /// 对流格式
    pub advection_scheme: AdvectionScheme,
    /// A 是否奇异
    pub is_singular: bool,
}

/// 求解器状态视图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateView {
    /// 网格
    pub grid: GridView,
    /// 掩码 `(nx, ny, nz)`
    pub mask: Nested3<i32>,
    /// 主场
    pub fields: FieldsView,
    /// 预测速度
    pub intermediate: IntermediateView,
    /// 常数
    pub constants: Constants,
    /// 算子
    pub operators: OperatorsView,
    /// 边界条件记录
    pub boundary_conditions: Vec<BoundaryRecord>,
    /// 健康指标
    pub health: Health,
    /// 诊断历史
    pub history: History,
    /// 已完成步数
    pub iteration: usize,
    /// 当前时间
    pub time: f64,
    /// 总时间
    pub total_time: f64,
    /// 生命周期
    pub lifecycle: Lifecycle,
    /// 压力虚拟层 `(nx+2, ny+2, nz+2)`（仅在请求时写出）
    pub pressure_halo: Option<Nested3<f64>>,
}

impl StateView {
    /// 由求解器状态生成（不含虚拟层）
    pub fn from_state(state: &SolverState) -> Self {
        let grid = &state.grid;
        let ops = &state.operators;
        let comp = |vel: &mf_physics::VelocityField, axis: usize| {
            nest(vel.component(axis), grid.face_dims(axis))
        };

        Self {
            grid: GridView::from(grid),
            mask: nest(state.mask.values(), grid.counts),
            fields: FieldsView {
                p: nest(&state.fields.p, grid.counts),
                u: comp(&state.fields.vel, 0),
                v: comp(&state.fields.vel, 1),
                w: comp(&state.fields.vel, 2),
            },
            intermediate: IntermediateView {
                u_star: comp(&state.intermediate, 0),
                v_star: comp(&state.intermediate, 1),
                w_star: comp(&state.intermediate, 2),
            },
            constants: state.constants,
            operators: OperatorsView {
                divergence: SparseDescriptor::of(&ops.divergence),
                gradient: [0, 1, 2].map(|d| SparseDescriptor::of(&ops.gradient[d].matrix)),
                laplacian: [0, 1, 2].map(|d| SparseDescriptor::of(&ops.laplacian[d].matrix)),
                pressure_laplacian: SparseDescriptor::of(&ops.pressure),
                advection: None,
                advection_scheme: ops.advection.scheme(),
                is_singular: ops.is_singular,
            },
            boundary_conditions: state.boundary.table().to_records(),
            health: state.health,
            history: state.history.clone(),
            iteration: state.iteration,
            time: state.time,
            total_time: state.total_time,
            lifecycle: state.lifecycle,
            pressure_halo: None,
        }
    }

    /// 附加压力虚拟层（若状态中存在）
    pub fn with_halo(mut self, state: &SolverState) -> Self {
        self.pressure_halo = state
            .pressure_halo
            .as_ref()
            .map(|halo| nest(halo.data(), halo.dims()));
        self
    }

    /// 转为 JSON 值
    pub fn to_value(&self) -> IoResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// 从 JSON 值解析
    pub fn from_value(value: Value) -> IoResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}
