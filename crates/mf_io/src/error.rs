// crates/mf_io/src/error.rs
//! IO 错误类型定义
//!
//! 底层错误通过 thiserror 自动转换，最终统一转换为 MfError。

use std::path::PathBuf;

use mf_foundation::MfError;
use thiserror::Error;

/// IO 模块结果类型别名
pub type IoResult<T> = Result<T, IoError>;

/// IO 错误枚举
#[derive(Error, Debug)]
pub enum IoError {
    /// 文件系统错误
    #[error("文件操作失败: {path}: {source}")]
    File {
        /// 出错的路径
        path: PathBuf,
        /// 底层错误
        #[source]
        source: std::io::Error,
    },

    /// JSON 序列化失败
    #[error("JSON 序列化失败: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV 写入失败
    #[error("CSV 写入失败: {0}")]
    Csv(#[from] csv::Error),

    /// 状态视图不符合结构约定
    #[error("状态视图结构错误: {path} - {message}")]
    Schema {
        /// JSON 路径
        path: String,
        /// 原因
        message: String,
    },

    /// 基础层错误转换
    #[error("基础层错误: {0}")]
    Foundation(#[from] MfError),
}

impl IoError {
    /// 构造文件错误
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    /// 构造结构错误
    pub fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<IoError> for MfError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::File { path, source } => {
                MfError::io_with_source(format!("文件操作失败: {}", path.display()), source)
            }
            IoError::Json(e) => MfError::serialization(e.to_string()),
            IoError::Csv(e) => MfError::serialization(format!("CSV: {e}")),
            IoError::Schema { path, message } => {
                MfError::serialization(format!("状态视图结构错误 [{path}]: {message}"))
            }
            IoError::Foundation(mf_err) => mf_err,
        }
    }
}
