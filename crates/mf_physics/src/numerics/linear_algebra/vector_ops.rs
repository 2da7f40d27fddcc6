// crates/mf_physics/src/numerics/linear_algebra/vector_ops.rs

//! PCG 与诊断用到的向量运算
//!
//! 散度范数用 [`norm2`] 与 [`norm_inf`]，PCG 的更新用 [`axpy`] 与 [`xpay`]。
//!
//! ```
//! use mf_physics::numerics::linear_algebra::vector_ops::{axpy, dot};
//!
//! let x = vec![1.0, 2.0, 3.0];
//! let mut y = vec![4.0, 5.0, 6.0];
//! assert_eq!(dot(&x, &y), 32.0);
//! axpy(2.0, &x, &mut y);
//! assert_eq!(y, vec![6.0, 9.0, 12.0]);
//! ```

/// x·y
#[inline]
pub fn dot(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    x.iter().zip(y).map(|(a, b)| a * b).sum()
}

/// ‖x‖₂
#[inline]
pub fn norm2(x: &[f64]) -> f64 {
    dot(x, x).sqrt()
}

/// ‖x‖∞，空向量为 0
#[inline]
pub fn norm_inf(x: &[f64]) -> f64 {
    x.iter().fold(0.0, |m: f64, v| m.max(v.abs()))
}

/// y ← y + α·x
#[inline]
pub fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    debug_assert_eq!(x.len(), y.len());
    y.iter_mut().zip(x).for_each(|(yi, xi)| *yi += alpha * xi);
}

/// y ← x + α·y（PCG 搜索方向更新）
#[inline]
pub fn xpay(x: &[f64], alpha: f64, y: &mut [f64]) {
    debug_assert_eq!(x.len(), y.len());
    y.iter_mut().zip(x).for_each(|(yi, xi)| *yi = xi + alpha * *yi);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norms() {
        let x = [3.0, -4.0];
        assert_eq!(norm2(&x), 5.0);
        assert_eq!(norm_inf(&x), 4.0);
        assert_eq!(norm_inf(&[]), 0.0);
    }

    #[test]
    fn test_xpay() {
        let mut p = vec![1.0, 1.0];
        xpay(&[1.0, 2.0], 3.0, &mut p);
        assert_eq!(p, vec![4.0, 5.0]);
    }
}
