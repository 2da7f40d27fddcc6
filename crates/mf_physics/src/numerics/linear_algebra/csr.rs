// crates/mf_physics/src/numerics/linear_algebra/csr.rs

//! 压缩稀疏行（CSR）矩阵
//!
//! 散度 D、梯度 G_d、向量拉普拉斯 L_d 与压力拉普拉斯 A 都以 CSR 存储，
//! 初始化时组装一次，之后只做矩阵-向量乘法。`D·G` 的恒等式检查
//! 需要 [`CsrMatrix::matmul`] 与 [`CsrMatrix::vstack`]，对称性检查需要
//! [`CsrMatrix::asymmetry_norm`]。
//!
//! # 特性开关
//!
//! - `parallel`: [`CsrMatrix::apply`] 走基于 `rayon` 的按行并行路径
//!
//! # 存储
//!
//! - `row_ptr`: 长度 `n_rows + 1`，第 i 行的非零元位于 `row_ptr[i]..row_ptr[i+1]`
//! - `col_idx`: 列索引，行内严格升序
//! - `values`: 非零元值
//!
//! 构建器写入的 0.0 保留为结构非零元；梯度的阻塞面行则没有任何元素。
//!
//! # 使用示例
//!
//! ```
//! use mf_physics::numerics::linear_algebra::CsrBuilder;
//!
//! // 一维三单元的 Neumann 拉普拉斯
//! let neighbors: [&[usize]; 3] = [&[1], &[0, 2], &[1]];
//! let mut builder = CsrBuilder::new_square(3);
//! for (row, cols) in neighbors.iter().enumerate() {
//!     for &col in cols.iter() {
//!         builder.add(row, col, 1.0);
//!         builder.add(row, row, -1.0);
//!     }
//! }
//!
//! let a = builder.build();
//! assert_eq!(a.apply_to(&[1.0, 1.0, 1.0]), vec![0.0; 3]);
//! ```

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use std::collections::BTreeMap;

// =============================================================================
// 矩阵
// =============================================================================

/// CSR 格式稀疏矩阵（f64）
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    n_rows: usize,
    n_cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    fn from_parts(
        n_rows: usize,
        n_cols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<f64>,
    ) -> Self {
        debug_assert_eq!(row_ptr.len(), n_rows + 1);
        debug_assert_eq!(row_ptr.last().copied(), Some(col_idx.len()));
        debug_assert_eq!(col_idx.len(), values.len());
        Self {
            n_rows,
            n_cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// 对角矩阵
    pub fn diagonal(diag: &[f64]) -> Self {
        let n = diag.len();
        Self::from_parts(n, n, (0..=n).collect(), (0..n).collect(), diag.to_vec())
    }

    /// 单位矩阵
    pub fn identity(n: usize) -> Self {
        Self::diagonal(&vec![1.0; n])
    }

    /// 没有非零元的矩阵
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self::from_parts(n_rows, n_cols, vec![0; n_rows + 1], Vec::new(), Vec::new())
    }

    /// 行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// 列数
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// 结构非零元数量
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// 形状 (n_rows, n_cols)
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    fn find(&self, row: usize, col: usize) -> Option<usize> {
        let start = self.row_ptr[row];
        self.col_idx[start..self.row_ptr[row + 1]]
            .binary_search(&col)
            .ok()
            .map(|local| start + local)
    }

    /// (row, col) 处的值，不存在时为 0
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.find(row, col).map_or(0.0, |idx| self.values[idx])
    }

    /// 第 row 行的非零元
    #[inline]
    pub fn row(&self, row: usize) -> RowView<'_> {
        let range = self.row_ptr[row]..self.row_ptr[row + 1];
        RowView {
            col_idx: &self.col_idx[range.clone()],
            values: &self.values[range],
        }
    }

    /// 对角线（缺失的对角元为 0）
    pub fn extract_diagonal(&self) -> Vec<f64> {
        (0..self.n_rows).map(|i| self.get(i, i)).collect()
    }

    #[inline]
    fn row_dot(&self, row: usize, x: &[f64]) -> f64 {
        self.row(row).iter().map(|(col, v)| v * x[col]).sum()
    }

    /// y = A·x
    ///
    /// # Panics
    ///
    /// 向量长度与矩阵形状不符。
    pub fn mul_vec(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.n_cols, "x 长度必须等于矩阵列数");
        assert_eq!(y.len(), self.n_rows, "y 长度必须等于矩阵行数");
        for (row, out) in y.iter_mut().enumerate() {
            *out = self.row_dot(row, x);
        }
    }

    /// y = A·x，按行并行，结果与 [`mul_vec`](Self::mul_vec) 逐位一致
    #[cfg(feature = "parallel")]
    pub fn mul_vec_parallel(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.n_cols, "x 长度必须等于矩阵列数");
        assert_eq!(y.len(), self.n_rows, "y 长度必须等于矩阵行数");
        y.par_iter_mut()
            .enumerate()
            .for_each(|(row, out)| *out = self.row_dot(row, x));
    }

    /// 算子应用：启用 `parallel` 时并行，否则串行
    #[inline]
    pub fn apply(&self, x: &[f64], y: &mut [f64]) {
        #[cfg(feature = "parallel")]
        self.mul_vec_parallel(x, y);
        #[cfg(not(feature = "parallel"))]
        self.mul_vec(x, y);
    }

    /// 返回 A·x
    pub fn apply_to(&self, x: &[f64]) -> Vec<f64> {
        let mut y = vec![0.0; self.n_rows];
        self.apply(x, &mut y);
        y
    }

    /// 转置
    pub fn transpose(&self) -> CsrMatrix {
        let mut row_ptr = vec![0usize; self.n_cols + 1];
        for &c in &self.col_idx {
            row_ptr[c + 1] += 1;
        }
        for i in 0..self.n_cols {
            row_ptr[i + 1] += row_ptr[i];
        }
        let mut next = row_ptr.clone();
        let mut col_idx = vec![0usize; self.nnz()];
        let mut values = vec![0.0; self.nnz()];

        // 按原行号升序写入，转置后行内列索引自然有序
        for row in 0..self.n_rows {
            for (col, v) in self.row(row).iter() {
                let dst = next[col];
                col_idx[dst] = row;
                values[dst] = v;
                next[col] += 1;
            }
        }
        Self::from_parts(self.n_cols, self.n_rows, row_ptr, col_idx, values)
    }

    /// C = A·B
    ///
    /// # Panics
    ///
    /// `self.n_cols() != other.n_rows()`
    pub fn matmul(&self, other: &CsrMatrix) -> CsrMatrix {
        assert_eq!(self.n_cols, other.n_rows, "矩阵乘法维度不匹配");

        let mut row_ptr = Vec::with_capacity(self.n_rows + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        let mut acc: BTreeMap<usize, f64> = BTreeMap::new();

        row_ptr.push(0);
        for row in 0..self.n_rows {
            acc.clear();
            for (k, a) in self.row(row).iter() {
                for (col, b) in other.row(k).iter() {
                    *acc.entry(col).or_insert(0.0) += a * b;
                }
            }
            col_idx.extend(acc.keys().copied());
            values.extend(acc.values().copied());
            row_ptr.push(col_idx.len());
        }
        Self::from_parts(self.n_rows, other.n_cols, row_ptr, col_idx, values)
    }

    /// 纵向堆叠列数相同的矩阵，例如 `[Gx; Gy; Gz]`
    ///
    /// # Panics
    ///
    /// 列数不一致。
    pub fn vstack(blocks: &[&CsrMatrix]) -> CsrMatrix {
        let n_cols = blocks.first().map_or(0, |b| b.n_cols);
        let mut row_ptr = vec![0usize];
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        for block in blocks {
            assert_eq!(block.n_cols, n_cols, "vstack 列数必须一致");
            let offset = col_idx.len();
            row_ptr.extend(block.row_ptr[1..].iter().map(|p| p + offset));
            col_idx.extend_from_slice(&block.col_idx);
            values.extend_from_slice(&block.values);
        }
        Self::from_parts(row_ptr.len() - 1, n_cols, row_ptr, col_idx, values)
    }

    /// 所有非零元满足 `|A[i,j] - A[j,i]| <= tol`
    pub fn is_symmetric(&self, tol: f64) -> bool {
        self.n_rows == self.n_cols
            && (0..self.n_rows).all(|i| {
                self.row(i)
                    .iter()
                    .all(|(j, a_ij)| (a_ij - self.get(j, i)).abs() <= tol)
            })
    }

    /// ‖A − Aᵀ‖_F
    pub fn asymmetry_norm(&self) -> f64 {
        let t = self.transpose();
        let mut sum = 0.0;
        for i in 0..self.n_rows {
            for (j, a) in self.row(i).iter() {
                let d = a - t.get(i, j);
                sum += d * d;
            }
            // 只在 Aᵀ 中出现的位置
            for (j, b) in t.row(i).iter() {
                if self.find(i, j).is_none() {
                    sum += b * b;
                }
            }
        }
        sum.sqrt()
    }
}

// =============================================================================
// 行视图
// =============================================================================

/// 某一行非零元的只读视图
pub struct RowView<'a> {
    col_idx: &'a [usize],
    values: &'a [f64],
}

impl<'a> RowView<'a> {
    /// 非零元数量
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// (列索引, 值) 对
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + 'a {
        self.col_idx
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }
}

// =============================================================================
// 构建器
// =============================================================================

/// 逐行累积的 CSR 构建器
///
/// 算子组装按网格顺序访问行，但同一行内的列（邻居单元或面）
/// 是乱序写入的，因此每行用 BTreeMap 排序。
pub struct CsrBuilder {
    n_cols: usize,
    rows: Vec<BTreeMap<usize, f64>>,
}

impl CsrBuilder {
    /// 方阵构建器
    #[inline]
    pub fn new_square(n: usize) -> Self {
        Self::new(n, n)
    }

    /// n_rows × n_cols 构建器
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_cols,
            rows: vec![BTreeMap::new(); n_rows],
        }
    }

    /// 覆盖 (row, col)
    ///
    /// # Panics
    ///
    /// 索引越界。
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        assert!(col < self.n_cols, "列索引越界");
        self.rows[row].insert(col, value);
    }

    /// 累加到 (row, col)
    ///
    /// # Panics
    ///
    /// 索引越界。
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        assert!(col < self.n_cols, "列索引越界");
        *self.rows[row].entry(col).or_insert(0.0) += value;
    }

    /// 生成紧凑的 CSR 矩阵
    pub fn build(self) -> CsrMatrix {
        let n_rows = self.rows.len();
        let nnz = self.rows.iter().map(BTreeMap::len).sum();
        let mut row_ptr = Vec::with_capacity(n_rows + 1);
        let mut col_idx = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);

        row_ptr.push(0);
        for row in self.rows {
            for (col, val) in row {
                col_idx.push(col);
                values.push(val);
            }
            row_ptr.push(col_idx.len());
        }
        CsrMatrix::from_parts(n_rows, self.n_cols, row_ptr, col_idx, values)
    }
}
