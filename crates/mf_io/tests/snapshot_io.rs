// crates/mf_io/tests/snapshot_io.rs

//! 快照与历史文件的读写测试

use mf_config::{BoundaryRecord, Face, SimulationConfig};
use mf_io::{read_snapshot, write_history, HistoryWriter, SnapshotWriter, StateView};
use mf_physics::Simulation;
use tempfile::TempDir;

// ============================================================================
// 测试辅助函数
// ============================================================================

fn channel() -> SimulationConfig {
    SimulationConfig::cube(3)
        .with_boundary(BoundaryRecord::inflow(Face::XMin, [1.0, 0.0, 0.0]))
        .with_boundary(BoundaryRecord::pressure(Face::XMax, 0.0))
        .with_time(0.01, 0.03)
}

fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

// ============================================================================
// 快照
// ============================================================================

/// 新初始化的状态写出后可以读回
#[test]
fn test_fresh_state_round_trip() {
    let dir = TempDir::new().unwrap();
    let sim = Simulation::new(&SimulationConfig::cube(2)).unwrap();

    let writer = SnapshotWriter::new(dir.path()).unwrap();
    let path = writer.write(sim.state()).unwrap();
    assert_eq!(path.file_name().unwrap(), "snapshot_000000.json");

    let view = read_snapshot(&path).unwrap();
    assert_eq!(view, StateView::from_state(sim.state()));
    assert!(view.pressure_halo.is_none());
}

/// 每步一个快照，按请求附带压力虚拟层
#[test]
fn test_snapshots_per_step_with_halo() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("nested/output");
    let writer = SnapshotWriter::new(&out).unwrap().with_halo(true).pretty(true);

    let mut sim = Simulation::new(&channel()).unwrap();
    sim.run_to_end(|state, _| {
        writer.write(state)?;
        Ok(())
    })
    .unwrap();

    for step in 1..=3 {
        let path = out.join(mf_io::snapshot_file_name(step));
        let view = read_snapshot(&path).unwrap();
        assert_eq!(view.iteration, step);
        let halo = view.pressure_halo.unwrap();
        assert_eq!(halo.len(), 5);
        assert_eq!(halo[4][2][2], 0.0);
    }
}

/// 损坏的快照在读取时被结构校验拒绝
#[test]
fn test_corrupted_snapshot_rejected() {
    let dir = TempDir::new().unwrap();
    let sim = Simulation::new(&SimulationConfig::cube(2)).unwrap();
    let path = SnapshotWriter::new(dir.path())
        .unwrap()
        .write(sim.state())
        .unwrap();

    let mut value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    value["fields"]["p"] = serde_json::json!([]);
    std::fs::write(&path, value.to_string()).unwrap();

    let err = read_snapshot(&path).unwrap_err();
    assert!(matches!(err, mf_io::IoError::Schema { .. }));
}

// ============================================================================
// 历史
// ============================================================================

/// 逐步追加的历史文件有表头且每步一行
#[test]
fn test_history_writer_appends_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.csv");
    let mut history = HistoryWriter::create(&path).unwrap();

    let mut sim = Simulation::new(&channel()).unwrap();
    sim.run_to_end(|_, record| {
        history.append(record)?;
        Ok(())
    })
    .unwrap();
    history.flush().unwrap();
    assert_eq!(history.rows(), 3);

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("time,step_index,divergence_norm,max_velocity,ppe_iterations,energy"));
    assert!(lines[3].contains(",3,"));
}

/// 整体写出的历史与内存中的历史一致
#[test]
fn test_write_history_matches_state() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.csv");

    let mut sim = Simulation::new(&channel()).unwrap();
    sim.run_to_end(|_, _| Ok(())).unwrap();
    write_history(&path, &sim.state().history).unwrap();

    let lines = read_lines(&path);
    assert_eq!(lines[0], "time,divergence_norm,max_velocity,ppe_iterations,energy");
    assert_eq!(lines.len(), 1 + sim.state().history.len());

    let last: Vec<f64> = lines[3].split(',').map(|s| s.parse().unwrap()).collect();
    let h = &sim.state().history;
    assert_eq!(last[0], h.time[2]);
    assert_eq!(last[3] as usize, h.ppe_iterations[2]);
}
