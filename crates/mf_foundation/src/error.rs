// crates/mf_foundation/src/error.rs

//! MacFlow 错误类型
//!
//! 所有层共用 [`MfError`]，命令行层通过 [`MfError::kind`] 得到 [`ErrorKind`]
//! 并映射为退出码。
//!
//! | 类别 | 含义 | 是否致命 |
//! |---|---|---|
//! | `Config` | 输入配置违反约束 | 初始化时中止 |
//! | `Geometry` | 掩码长度/形状/取值错误，全固体域 | 初始化时中止 |
//! | `Invariant` | 步间不变量被破坏 | 中止 |
//! | `Numeric` | 修正后出现 NaN/Inf | 中止，拒绝后续步进 |
//! | `SolverNonConvergence` | 压力泊松方程未收敛 | 仅警告 |
//!
//! ```
//! use mf_foundation::error::{ErrorKind, MfError, MfResult};
//!
//! fn time_step(dt: f64) -> MfResult<f64> {
//!     MfError::check_positive("time_step", dt)?;
//!     Ok(dt)
//! }
//! let err = time_step(0.0).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Config);
//! assert_eq!(err.kind().exit_code(), 2);
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// 统一结果类型
pub type MfResult<T> = Result<T, MfError>;

/// 错误类别
///
/// 与 [`MfError`] 的变体一一对应，供命令行层选择退出码。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 配置错误
    Config,
    /// 几何（掩码）错误
    Geometry,
    /// 不变量错误
    Invariant,
    /// 数值错误（NaN/Inf）
    Numeric,
    /// 压力求解未收敛（非致命）
    SolverNonConvergence,
    /// IO 或序列化等基础设施错误
    Infrastructure,
}

impl ErrorKind {
    /// 命令行退出码
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Config => 2,
            Self::Geometry => 3,
            Self::Invariant => 4,
            Self::Numeric => 5,
            Self::SolverNonConvergence => 0,
            Self::Infrastructure => 1,
        }
    }

    /// 是否致命
    pub fn is_fatal(self) -> bool {
        !matches!(self, Self::SolverNonConvergence)
    }
}

/// MacFlow 错误类型
#[derive(Error, Debug)]
pub enum MfError {
    // ========================================================================
    // 初始化阶段
    // ========================================================================
    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 具体错误信息
        message: String,
    },

    /// 几何错误
    #[error("几何错误: {message}")]
    Geometry {
        /// 具体错误信息
        message: String,
    },

    // ========================================================================
    // 运行阶段
    // ========================================================================
    /// 不变量被破坏
    #[error("不变量错误: {invariant}: {message}")]
    Invariant {
        /// 不变量名称
        invariant: &'static str,
        /// 具体错误信息
        message: String,
    },

    /// 数值错误（场中出现 NaN/Inf）
    #[error("数值错误: 字段 {field} 索引 {index} 处出现非有限值 {value} (t={time})")]
    Numeric {
        /// 字段名
        field: &'static str,
        /// 扁平索引
        index: usize,
        /// 非有限值
        value: f64,
        /// 模拟时间
        time: f64,
    },

    /// 压力泊松方程未收敛
    #[error("压力求解未收敛: {iterations} 次迭代后残差 {residual:.3e} > 容差 {tolerance:.3e}")]
    SolverNonConvergence {
        /// 迭代次数
        iterations: usize,
        /// 最终残差
        residual: f64,
        /// 目标容差
        tolerance: f64,
    },

    // ========================================================================
    // 基础设施
    // ========================================================================
    /// 向量长度与网格自由度不符
    #[error("{name} 长度为 {actual}, 网格要求 {expected}")]
    SizeMismatch {
        /// 向量名
        name: &'static str,
        /// 网格要求的长度
        expected: usize,
        /// 实际长度
        actual: usize,
    },

    /// 读写失败
    #[error("读写失败: {message}")]
    Io {
        /// 操作与对象
        message: String,
        /// 底层错误
        #[source]
        source: Option<std::io::Error>,
    },

    /// 输入文件缺失
    #[error("找不到文件 {}", path.display())]
    FileNotFound {
        /// 请求的路径
        path: PathBuf,
    },

    /// JSON/CSV 编解码失败
    #[error("编解码失败: {message}")]
    Serialization {
        /// 失败原因
        message: String,
    },
}

// ========================================================================
// 构造
// ========================================================================

impl MfError {
    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 几何错误
    pub fn geometry(message: impl Into<String>) -> Self {
        Self::Geometry {
            message: message.into(),
        }
    }

    /// 不变量错误
    pub fn invariant(invariant: &'static str, message: impl Into<String>) -> Self {
        Self::Invariant {
            invariant,
            message: message.into(),
        }
    }

    /// 数值错误
    pub fn numeric(field: &'static str, index: usize, value: f64, time: f64) -> Self {
        Self::Numeric {
            field,
            index,
            value,
            time,
        }
    }

    /// 压力求解未收敛
    pub fn non_convergence(iterations: usize, residual: f64, tolerance: f64) -> Self {
        Self::SolverNonConvergence {
            iterations,
            residual,
            tolerance,
        }
    }

    /// 读写错误
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// 读写错误，保留底层 [`std::io::Error`]
    pub fn io_with_source(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(source),
        }
    }

    /// 文件缺失
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// 编解码错误
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// 错误类别
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Config,
            Self::Geometry { .. } => ErrorKind::Geometry,
            Self::Invariant { .. } | Self::SizeMismatch { .. } => ErrorKind::Invariant,
            Self::Numeric { .. } => ErrorKind::Numeric,
            Self::SolverNonConvergence { .. } => ErrorKind::SolverNonConvergence,
            Self::Io { .. } | Self::FileNotFound { .. } | Self::Serialization { .. } => {
                ErrorKind::Infrastructure
            }
        }
    }
}

// ========================================================================
// 前置检查
// ========================================================================

impl MfError {
    /// 向量长度须等于网格自由度
    #[inline]
    pub fn check_size(name: &'static str, expected: usize, actual: usize) -> MfResult<()> {
        if expected == actual {
            return Ok(());
        }
        Err(Self::SizeMismatch {
            name,
            expected,
            actual,
        })
    }

    /// 配置标量须为有限正数
    #[inline]
    pub fn check_positive(key: &str, value: f64) -> MfResult<()> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(Self::config(format!("{} 必须为正, 实际 {}", key, value)))
        }
    }
}

impl From<std::io::Error> for MfError {
    fn from(source: std::io::Error) -> Self {
        let message = source.to_string();
        Self::io_with_source(message, source)
    }
}

/// 条件不满足时提前返回错误
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err.into());
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(MfError::config("x").kind(), ErrorKind::Config);
        assert_eq!(MfError::geometry("x").kind(), ErrorKind::Geometry);
        assert_eq!(MfError::invariant("mass", "x").kind(), ErrorKind::Invariant);
        assert_eq!(MfError::numeric("U", 3, f64::NAN, 0.1).kind(), ErrorKind::Numeric);
        assert_eq!(
            MfError::non_convergence(1000, 1e-3, 1e-6).kind(),
            ErrorKind::SolverNonConvergence
        );
        assert_eq!(MfError::file_not_found("a.json").kind(), ErrorKind::Infrastructure);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ErrorKind::Config.exit_code(), 2);
        assert_eq!(ErrorKind::Geometry.exit_code(), 3);
        assert_eq!(ErrorKind::Invariant.exit_code(), 4);
        assert_eq!(ErrorKind::Numeric.exit_code(), 5);
        assert!(!ErrorKind::SolverNonConvergence.is_fatal());
        assert!(ErrorKind::Infrastructure.is_fatal());
    }

    #[test]
    fn test_messages_name_the_location() {
        let msg = MfError::numeric("U", 7, f64::INFINITY, 0.5).to_string();
        assert!(msg.contains("字段 U 索引 7"));

        let err = MfError::check_size("pressure", 27, 26).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invariant);
        assert_eq!(err.to_string(), "pressure 长度为 26, 网格要求 27");
    }

    #[test]
    fn test_check_positive_rejects_nan() {
        assert!(MfError::check_positive("dt", 1e-3).is_ok());
        assert!(MfError::check_positive("dt", 0.0).is_err());
        assert!(MfError::check_positive("dt", f64::NAN).is_err());
        assert!(MfError::check_positive("dt", f64::INFINITY).is_err());
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error as _;
        let err: MfError = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "只读").into();
        assert!(err.source().is_some());
        assert!(err.to_string().contains("只读"));
    }

    #[test]
    fn test_ensure_returns_early() {
        fn reject_solid(fluid_cells: usize) -> MfResult<usize> {
            ensure!(fluid_cells > 0, MfError::geometry("全为固体"));
            Ok(fluid_cells)
        }
        assert_eq!(reject_solid(8).ok(), Some(8));
        assert_eq!(reject_solid(0).unwrap_err().kind(), ErrorKind::Geometry);
    }
}
