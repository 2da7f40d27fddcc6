// apps/mf_cli/src/commands/validate.rs

//! 配置验证命令
//!
//! 收集配置文件的全部语义问题，并检查掩码几何。

use anyhow::{Context, Result};
use clap::Args;
use mf_config::SimulationConfig;
use mf_foundation::validation::{ValidationError, ValidationReport};
use mf_foundation::MfError;
use mf_physics::{Grid, Mask};
use std::path::{Path, PathBuf};
use tracing::info;

/// 验证参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 严格模式（警告也视为错误）
    #[arg(long)]
    pub strict: bool,
}

/// 执行验证命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("=== MacFlow 配置验证 ===");
    println!("检查配置文件: {}", args.config.display());

    let FileCheck {
        report,
        geometry_error,
    } = validate_file(&args.config)?;
    print_report(&report);

    if let Some(err) = geometry_error {
        return Err(err).context("掩码几何无效");
    }
    if report.has_errors() {
        return Err(MfError::config(format!("配置存在 {} 个错误", report.error_count())).into());
    }
    if args.strict && report.has_warnings() {
        return Err(MfError::config(format!(
            "严格模式: 配置存在 {} 个警告",
            report.warning_count()
        ))
        .into());
    }

    println!("  ✓ 配置有效");
    Ok(())
}

/// 配置文件检查结果
#[derive(Debug)]
pub struct FileCheck {
    /// 全部问题（掩码失败也会列入）
    pub report: ValidationReport,
    /// 掩码组装失败时的原始错误，保留几何错误类别
    pub geometry_error: Option<MfError>,
}

/// 校验配置文件
///
/// 只有文件不可读或不是合法 JSON 时才返回错误。掩码只在其余配置
/// 有效时检查。
pub fn validate_file(path: &Path) -> Result<FileCheck> {
    if !path.exists() {
        return Err(MfError::file_not_found(path)).context("无法验证配置");
    }
    let config = SimulationConfig::from_file_unchecked(path)
        .map_err(MfError::from)
        .with_context(|| format!("无法解析配置: {}", path.display()))?;

    let mut report = config.validate_report();
    let geometry_error = if report.is_valid() {
        check_geometry(&config, &mut report)
    } else {
        None
    };
    Ok(FileCheck {
        report,
        geometry_error,
    })
}

fn check_geometry(config: &SimulationConfig, report: &mut ValidationReport) -> Option<MfError> {
    let outcome = Grid::from_domain(&config.domain).and_then(|grid| {
        Mask::ingest(&config.geometry.mask_flat, &config.geometry.mask_shape, &grid)
    });
    match outcome {
        Ok(mask) => {
            println!(
                "  ✓ 掩码: 流体 {} (边界流体 {}), 固体 {}",
                mask.fluid_count(),
                mask.boundary_fluid_count(),
                mask.solid_count()
            );
            None
        }
        Err(err) => {
            report.add_error(ValidationError::InvalidField {
                key: "geometry.mask_flat".to_string(),
                reason: err.to_string(),
            });
            Some(err)
        }
    }
}

fn print_report(report: &ValidationReport) {
    println!("\n结果: {}", report);
}
