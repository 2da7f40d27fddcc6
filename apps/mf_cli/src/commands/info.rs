// apps/mf_cli/src/commands/info.rs

//! 信息显示命令
//!
//! 按配置组装求解器（不推进），显示网格、自由度、算子规模与边界。

use anyhow::{Context, Result};
use clap::Args;
use mf_physics::{Simulation, SolverState};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::info;

use super::load_config;

/// 信息显示参数
#[derive(Args)]
pub struct InfoArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 以 JSON 输出
    #[arg(long)]
    pub json: bool,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    info!("=== MacFlow 信息 ===");

    let config = load_config(&args.config)?;
    let sim = Simulation::new(&config).context("构建求解器失败")?;
    let summary = summarize(sim.state(), config.step_count());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(sim.state(), config.step_count());
    }
    Ok(())
}

/// 汇总网格与算子信息
pub fn summarize(state: &SolverState, step_count: usize) -> Value {
    let g = &state.grid;
    let ops = &state.operators;
    let gradient_nnz: usize = ops.gradient.iter().map(|c| c.matrix.nnz()).sum();
    let laplacian_nnz: usize = ops.laplacian.iter().map(|c| c.matrix.nnz()).sum();
    let boundaries: Vec<Value> = state
        .boundary
        .table()
        .iter()
        .map(|(face, bc)| json!({ "face": face.name(), "type": bc.kind().name() }))
        .collect();

    json!({
        "grid": {
            "counts": g.counts,
            "spacing": [g.dx(), g.dy(), g.dz()],
            "origin": [g.origin.x, g.origin.y, g.origin.z],
            "upper": [g.upper.x, g.upper.y, g.upper.z],
        },
        "dofs": {
            "cells": g.n_cells(),
            "faces": [g.n_faces(0), g.n_faces(1), g.n_faces(2)],
            "velocity": g.n_velocity_dofs(),
        },
        "mask": {
            "fluid": state.mask.fluid_count(),
            "boundary_fluid": state.mask.boundary_fluid_count(),
            "solid": state.mask.solid_count(),
            "blocked_faces": ops.faces.blocked_count(),
        },
        "operators": {
            "divergence_nnz": ops.divergence.nnz(),
            "gradient_nnz": gradient_nnz,
            "laplacian_nnz": laplacian_nnz,
            "pressure_nnz": ops.pressure.nnz(),
            "total_nnz": ops.divergence.nnz() + gradient_nnz + laplacian_nnz + ops.pressure.nnz(),
            "advection_scheme": ops.advection.scheme(),
            "ppe_singular": ops.is_singular,
        },
        "boundary_conditions": boundaries,
        "time": {
            "dt": state.constants.dt,
            "total_time": state.total_time,
            "steps": step_count,
        },
    })
}

fn print_summary(state: &SolverState, step_count: usize) {
    let g = &state.grid;
    let ops = &state.operators;

    println!("=== 网格 ===");
    println!("单元数: {} x {} x {} = {}", g.nx(), g.ny(), g.nz(), g.n_cells());
    println!("间距: dx={:.4e}, dy={:.4e}, dz={:.4e}", g.dx(), g.dy(), g.dz());
    println!(
        "速度自由度: {} (u {}, v {}, w {})",
        g.n_velocity_dofs(),
        g.n_faces(0),
        g.n_faces(1),
        g.n_faces(2)
    );

    println!("\n=== 掩码 ===");
    println!(
        "流体 {} (边界流体 {}), 固体 {}, 阻塞面 {}",
        state.mask.fluid_count(),
        state.mask.boundary_fluid_count(),
        state.mask.solid_count(),
        ops.faces.blocked_count()
    );

    println!("\n=== 算子 ===");
    println!("D: {:?}, nnz={}", ops.divergence.shape(), ops.divergence.nnz());
    for (name, c) in ["Gx", "Gy", "Gz"].iter().zip(&ops.gradient) {
        println!("{}: {:?}, nnz={}", name, c.matrix.shape(), c.matrix.nnz());
    }
    for (name, c) in ["Lu", "Lv", "Lw"].iter().zip(&ops.laplacian) {
        println!("{}: {:?}, nnz={}", name, c.matrix.shape(), c.matrix.nnz());
    }
    println!("A: {:?}, nnz={}", ops.pressure.shape(), ops.pressure.nnz());
    println!("对流格式: {:?}", ops.advection.scheme());
    if ops.is_singular {
        println!("PPE: 奇异（纯 Neumann，求解时固定零均值）");
    } else {
        println!("PPE: 非奇异");
    }

    println!("\n=== 边界 ===");
    for (face, bc) in state.boundary.table().iter() {
        println!("{}: {}", face, bc.kind());
    }

    println!("\n=== 时间 ===");
    println!(
        "Δt={} s, 总时间={} s, 步数={}",
        state.constants.dt, state.total_time, step_count
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_config::{BoundaryRecord, Face, SimulationConfig};

    #[test]
    fn test_summary_counts() {
        let config = SimulationConfig::cube(3)
            .with_boundary(BoundaryRecord::pressure(Face::XMax, 0.0));
        let sim = Simulation::new(&config).unwrap();
        let summary = summarize(sim.state(), config.step_count());

        assert_eq!(summary["dofs"]["cells"], 27);
        assert_eq!(summary["dofs"]["velocity"], 3 * 36);
        assert_eq!(summary["mask"]["fluid"], 27);
        assert_eq!(summary["operators"]["ppe_singular"], false);
        assert_eq!(summary["boundary_conditions"].as_array().unwrap().len(), 6);
        assert_eq!(summary["time"]["steps"], 10);
    }

    #[test]
    fn test_closed_box_is_singular() {
        let config = SimulationConfig::cube(2);
        let sim = Simulation::new(&config).unwrap();
        let summary = summarize(sim.state(), config.step_count());
        assert_eq!(summary["operators"]["ppe_singular"], true);
        assert_eq!(summary["operators"]["advection_scheme"], "upwind");
    }
}
