// crates/mf_foundation/src/validation.rs

//! 收集式验证
//!
//! 配置文件与快照的检查需要一次列出全部问题，而不是遇错即停。
//! 每条错误带有出错位置的键路径（如 `fluid_properties.density`、
//! `fields.u`），便于命令行逐条打印。
//!
//! # 示例
//!
//! ```
//! use mf_foundation::validation::{ValidationError, ValidationReport};
//!
//! let density = -1.0f64;
//! let mut report = ValidationReport::new();
//! if density <= 0.0 {
//!     report.add_error(ValidationError::InvalidField {
//!         key: "fluid_properties.density".into(),
//!         reason: "必须为正".into(),
//!     });
//! }
//! assert_eq!(report.first_error_key(), Some("fluid_properties.density"));
//! ```

use std::fmt;

/// 验证报告
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// 错误（按发现顺序）
    pub errors: Vec<ValidationError>,
    /// 警告
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    /// 空报告
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录错误
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// 记录警告
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// 是否有错误
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// 是否有警告
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// 错误数量
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// 警告数量
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// 没有错误即通过，警告不影响
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// 第一条错误的键路径
    pub fn first_error_key(&self) -> Option<&str> {
        self.errors.first().and_then(ValidationError::key)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} 个错误, {} 个警告", self.error_count(), self.warning_count())?;
        for err in &self.errors {
            write!(f, "\n  ✗ {}", err)?;
        }
        for warning in &self.warnings {
            write!(f, "\n  ! {}", warning)?;
        }
        Ok(())
    }
}

/// 验证错误
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// 数组形状或长度不符
    ShapeMismatch {
        /// 键路径
        field: String,
        /// 期望长度
        expected: usize,
        /// 实际长度
        actual: usize,
    },
    /// 缺少必需字段
    Missing {
        /// 键路径
        key: String,
    },
    /// 字段值非法
    InvalidField {
        /// 键路径
        key: String,
        /// 原因
        reason: String,
    },
    /// 无法归到某个字段的问题
    Custom {
        /// 描述
        message: String,
    },
}

impl ValidationError {
    /// 出错位置的键路径
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::ShapeMismatch { field, .. } => Some(field.as_str()),
            Self::Missing { key } | Self::InvalidField { key, .. } => Some(key.as_str()),
            Self::Custom { .. } => None,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch {
                field,
                expected,
                actual,
            } => write!(f, "{}: 长度期望 {}, 实际 {}", field, expected, actual),
            Self::Missing { key } => write!(f, "{}: 缺少字段", key),
            Self::InvalidField { key, reason } => write!(f, "{}: {}", key, reason),
            Self::Custom { message } => f.write_str(message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// 验证警告
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationWarning {
    /// 数值偏高但仍可运行（如初始 CFL 介于 0.5 与 1 之间）
    HighValue {
        /// 名称
        field: String,
        /// 实际值
        value: f64,
        /// 建议上限
        threshold: f64,
    },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HighValue {
                field,
                value,
                threshold,
            } => write!(f, "{} = {:.3} 超过建议值 {}", field, value, threshold),
        }
    }
}
