// apps/mf_cli/src/commands/run.rs

//! 运行模拟命令
//!
//! 推进到配置的总时间（或步数上限），每 `output_interval` 步
//! 写出一个快照，每步追加一行 `history.csv`。

use anyhow::{Context, Result};
use clap::Args;
use mf_io::{HistoryWriter, SnapshotWriter};
use mf_physics::Simulation;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

use super::load_config;

/// 运行模拟参数
#[derive(Args)]
pub struct RunArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 输出目录
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// 最多推进的步数
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// 快照中附带压力虚拟层
    #[arg(long)]
    pub halo: bool,

    /// 不写快照，只写历史
    #[arg(long)]
    pub no_snapshots: bool,
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== MacFlow 模拟启动 ===");

    let config = load_config(&args.config)?;
    let interval = config.simulation_parameters.output_interval.max(1);
    let d = &config.domain;
    info!(
        "网格: {}x{}x{}, Δt={} s, 总时间={} s, 预计 {} 步",
        d.nx,
        d.ny,
        d.nz,
        config.simulation_parameters.time_step,
        config.simulation_parameters.total_time,
        config.step_count()
    );

    let mut sim = Simulation::new(&config).context("构建求解器失败")?;

    let snapshots = if args.no_snapshots {
        None
    } else {
        Some(SnapshotWriter::new(&args.output)?.with_halo(args.halo))
    };
    let mut history = HistoryWriter::create(args.output.join(mf_io::writer::HISTORY_FILE_NAME))?;

    if let Some(writer) = &snapshots {
        writer.write(sim.state())?;
    }

    let start = Instant::now();
    let mut output_count = 0;
    let summary = sim.run(args.max_steps, |state, record| {
        history.append(record)?;
        if record.step_index % interval == 0 {
            info!(
                "步 {}: t={:.4} s, div={:.3e}, max|u|={:.4}, CFL={:.3}, PPE 迭代={}",
                record.step_index,
                record.time,
                record.divergence_norm,
                record.max_velocity,
                record.cfl,
                record.ppe_iterations
            );
            if let Some(writer) = &snapshots {
                writer.write(state)?;
                output_count += 1;
            }
        }
        Ok(())
    });
    history.flush()?;
    let summary = summary.context("模拟运行失败")?;

    if summary.non_converged_steps > 0 {
        warn!("{} 步 PPE 未收敛", summary.non_converged_steps);
    }

    info!("=== 模拟完成 ===");
    info!("总步数: {}", summary.steps);
    info!("结束时间: {:.6} s", summary.final_time);
    info!("状态: {}", summary.lifecycle);
    info!("计算时间: {:.2} s", start.elapsed().as_secs_f64());
    info!("快照数: {}, 历史行数: {}", output_count, history.rows());
    info!("输出目录: {}", args.output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_config::SimulationConfig;
    use tempfile::TempDir;

    fn snapshot_names(dir: &std::path::Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("snapshot_"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_output_interval_and_step_cap() {
        let dir = TempDir::new().unwrap();
        let mut config = SimulationConfig::cube(2);
        config.simulation_parameters.output_interval = 3;
        let config_path = dir.path().join("case.json");
        config.save_to_file(&config_path).unwrap();
        let output = dir.path().join("out");

        execute(RunArgs {
            config: config_path,
            output: output.clone(),
            max_steps: Some(7),
            halo: false,
            no_snapshots: false,
        })
        .unwrap();

        assert_eq!(
            snapshot_names(&output),
            vec!["snapshot_000000.json", "snapshot_000003.json", "snapshot_000006.json"]
        );

        let history_path = output.join(mf_io::writer::HISTORY_FILE_NAME);
        let history = std::fs::read_to_string(history_path).unwrap();
        let data_rows = history.lines().skip(1).filter(|l| !l.is_empty()).count();
        assert_eq!(data_rows, 7);
    }

    #[test]
    fn test_no_snapshots_still_writes_history() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("case.json");
        SimulationConfig::cube(2).save_to_file(&config_path).unwrap();
        let output = dir.path().join("out");

        execute(RunArgs {
            config: config_path,
            output: output.clone(),
            max_steps: Some(2),
            halo: false,
            no_snapshots: true,
        })
        .unwrap();

        assert!(snapshot_names(&output).is_empty());
        assert!(output.join(mf_io::writer::HISTORY_FILE_NAME).exists());
    }
}
