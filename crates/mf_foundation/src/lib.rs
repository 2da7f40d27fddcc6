// crates/mf_foundation/src/lib.rs

//! MacFlow Foundation Layer
//!
//! 基础层，提供整个项目共用的错误类型与验证工具。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型与错误类别（含退出码映射）
//! - [`validation`]: 收集式验证报告
//!
//! # 示例
//!
//! ```
//! use mf_foundation::prelude::*;
//!
//! fn positive(x: f64) -> MfResult<f64> {
//!     ensure!(x > 0.0, MfError::config("x 必须为正"));
//!     Ok(x)
//! }
//! assert!(positive(1.0).is_ok());
//! assert_eq!(positive(-1.0).unwrap_err().kind(), ErrorKind::Config);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod validation;

// 重导出常用类型
pub use error::{ErrorKind, MfError, MfResult};
pub use validation::{ValidationError, ValidationReport, ValidationWarning};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{ErrorKind, MfError, MfResult};
    pub use crate::validation::{ValidationError, ValidationReport, ValidationWarning};
    pub use crate::ensure;
}
