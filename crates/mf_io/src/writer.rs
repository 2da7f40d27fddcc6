// crates/mf_io/src/writer.rs

//! 快照与诊断历史输出
//!
//! - [`SnapshotWriter`]: 每次写出一个 `snapshot_<step>.json`（步号补零到六位）
//! - [`HistoryWriter`]: 逐步追加 `history.csv`
//!
//! # 使用示例
//!
//! ```no_run
//! use mf_config::SimulationConfig;
//! use mf_io::{HistoryWriter, SnapshotWriter};
//! use mf_physics::Simulation;
//!
//! let mut sim = Simulation::new(&SimulationConfig::cube(4))?;
//! let snapshots = SnapshotWriter::new("output")?.with_halo(true);
//! let mut history = HistoryWriter::create("output/history.csv")?;
//!
//! sim.run_to_end(|state, record| {
//!     history.append(record)?;
//!     snapshots.write(state)?;
//!     Ok(())
//! })?;
//! history.flush()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{IoError, IoResult};
use crate::schema::validate_state_view;
use crate::state_view::StateView;
use mf_physics::{History, SolverState, StepRecord};

/// 历史文件默认文件名
pub const HISTORY_FILE_NAME: &str = "history.csv";

/// 快照文件名
pub fn snapshot_file_name(step: usize) -> String {
    format!("snapshot_{:06}.json", step)
}

// ============================================================
// 快照
// ============================================================

/// JSON 快照写出器
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
    include_halo: bool,
    pretty: bool,
}

impl SnapshotWriter {
    /// 创建写出器，目录不存在时创建
    pub fn new(dir: impl Into<PathBuf>) -> IoResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| IoError::file(&dir, e))?;
        Ok(Self {
            dir,
            include_halo: false,
            pretty: false,
        })
    }

    /// 是否写出压力虚拟层
    pub fn with_halo(mut self, include_halo: bool) -> Self {
        self.include_halo = include_halo;
        self
    }

    /// 是否缩进排版
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// 输出目录
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 写出当前状态，返回文件路径
    ///
    /// 写出前做结构校验，未通过时不产生文件。
    pub fn write(&self, state: &SolverState) -> IoResult<PathBuf> {
        let mut view = StateView::from_state(state);
        if self.include_halo {
            view = view.with_halo(state);
        }
        let value = view.to_value()?;
        validate_state_view(&value)?;

        let path = self.dir.join(snapshot_file_name(state.iteration));
        let file = File::create(&path).map_err(|e| IoError::file(&path, e))?;
        let mut out = BufWriter::new(file);
        if self.pretty {
            serde_json::to_writer_pretty(&mut out, &value)?;
        } else {
            serde_json::to_writer(&mut out, &value)?;
        }
        out.flush().map_err(|e| IoError::file(&path, e))?;

        debug!("快照已写出: {}", path.display());
        Ok(path)
    }
}

/// 读取快照
pub fn read_snapshot(path: impl AsRef<Path>) -> IoResult<StateView> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| IoError::file(path, e))?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    validate_state_view(&value)?;
    StateView::from_value(value)
}

// ============================================================
// 诊断历史
// ============================================================

/// `history.csv` 追加写出器
///
/// 列为 [`StepRecord`] 的字段，首行为表头。
pub struct HistoryWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: usize,
}

impl std::fmt::Debug for HistoryWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryWriter")
            .field("path", &self.path)
            .field("rows", &self.rows)
            .finish()
    }
}

impl HistoryWriter {
    /// 创建（覆盖）历史文件
    pub fn create(path: impl Into<PathBuf>) -> IoResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| IoError::file(parent, e))?;
        }
        let file = File::create(&path).map_err(|e| IoError::file(&path, e))?;
        Ok(Self {
            path,
            writer: csv::Writer::from_writer(file),
            rows: 0,
        })
    }

    /// 追加一行
    pub fn append(&mut self, record: &StepRecord) -> IoResult<()> {
        self.writer.serialize(record)?;
        self.rows += 1;
        Ok(())
    }

    /// 已写出的行数（不含表头）
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// 文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 刷新到磁盘
    pub fn flush(&mut self) -> IoResult<()> {
        self.writer
            .flush()
            .map_err(|e| IoError::file(&self.path, e))
    }
}

/// 一次性写出整个诊断历史
///
/// 列为 `time,divergence_norm,max_velocity,ppe_iterations,energy`。
pub fn write_history(path: impl AsRef<Path>, history: &History) -> IoResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| IoError::file(path, e))?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(crate::schema::HISTORY_COLUMNS)?;
    for i in 0..history.len() {
        writer.write_record(&[
            history.time[i].to_string(),
            history.divergence_norm[i].to_string(),
            history.max_velocity[i].to_string(),
            history.ppe_iterations[i].to_string(),
            history.energy[i].to_string(),
        ])?;
    }
    writer.flush().map_err(|e| IoError::file(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_file_name() {
        assert_eq!(snapshot_file_name(0), "snapshot_000000.json");
        assert_eq!(snapshot_file_name(42), "snapshot_000042.json");
    }
}
