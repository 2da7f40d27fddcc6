// apps/mf_cli/src/commands/mod.rs

//! CLI 命令模块

pub mod info;
pub mod run;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use mf_config::SimulationConfig;
use mf_foundation::MfError;

/// 加载并校验配置
pub fn load_config(path: &Path) -> Result<SimulationConfig> {
    if !path.exists() {
        return Err(MfError::file_not_found(path)).context("无法加载配置");
    }
    SimulationConfig::from_file(path)
        .map_err(MfError::from)
        .with_context(|| format!("加载配置失败: {}", path.display()))
}
