// apps/mf_cli/src/main.rs

//! MacFlow 命令行界面
//!
//! 三维不可压 Navier–Stokes 投影法求解器的命令行工具。
//!
//! # 架构层级
//!
//! 本模块属于 **Layer 5: Application**：
//! - 读取并校验 JSON 配置
//! - 驱动 `mf_physics::Simulation`，通过 `mf_io` 写出快照与历史
//! - 将错误类别映射为进程退出码

mod commands;

use clap::{Parser, Subcommand};
use mf_foundation::MfError;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// MacFlow 三维 MAC 网格投影法求解器命令行工具
#[derive(Parser)]
#[command(name = "mf_cli")]
#[command(author = "MacFlow Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MacFlow 3D incompressible MAC-grid projection solver", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行模拟
    Run(commands::run::RunArgs),
    /// 验证配置
    Validate(commands::validate::ValidateArgs),
    /// 显示配置对应的网格与算子信息
    Info(commands::info::InfoArgs),
}

fn main() {
    let cli = Cli::parse();

    // 初始化日志
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("日志初始化失败: {}", err);
    }

    // 执行命令
    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
        Commands::Info(args) => commands::info::execute(args),
    };

    if let Err(err) = result {
        eprintln!("错误: {:#}", err);
        std::process::exit(exit_code(&err));
    }
}

/// 由错误链中的 MfError 决定退出码，其他错误为 1
fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<MfError>())
        .map(MfError::kind)
        .filter(|kind| kind.is_fatal())
        .map_or(1, |kind| kind.exit_code())
}
