//! # Task Partitioner
//!
//! One [`ExpansionTask`] per dataset row. The task index is the row's 0-based
//! position in the region-filtered dataset and fixes the row's place in the
//! final artifact, whatever order workers finish in.
//!
//! Tasks live in a pre-sized `Vec` indexed by task id. Each task carries a
//! write-once completion slot owned by the worker that runs it; the merge
//! stage reads it only after the pool has joined.
//!
//! ## On-disk naming
//! Temp files are named `temp_<region>_<index>.txt`. [`parse_task_index`] is
//! the only place that reads an index back out of a file name.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use expandr_common::dataset::NetworkRecord;
use tracing::{debug, warn};

const TEMP_FILE_PREFIX: &str = "temp_";
const TEMP_FILE_SUFFIX: &str = ".txt";

/// Lifecycle of one task. There is no retry or cancellation edge: once
/// running, a task always ends in one of the completed states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    /// Finished with this many addresses in its temp file.
    Completed(u64),
    /// Finished without output: invalid row, write failure or timeout.
    CompletedEmpty,
}

#[derive(Debug)]
pub struct ExpansionTask {
    pub index: usize,
    pub record: NetworkRecord,
    pub temp_path: PathBuf,
    started: AtomicBool,
    written: OnceLock<u64>,
}

impl ExpansionTask {
    pub fn new(index: usize, record: NetworkRecord, temp_dir: &Path) -> Self {
        let temp_path = temp_dir.join(temp_file_name(&record.region_id, index));
        Self {
            index,
            record,
            temp_path,
            started: AtomicBool::new(false),
            written: OnceLock::new(),
        }
    }

    pub fn state(&self) -> TaskState {
        match self.written.get() {
            Some(0) => TaskState::CompletedEmpty,
            Some(&count) => TaskState::Completed(count),
            None if self.started.load(Ordering::Acquire) => TaskState::Running,
            None => TaskState::Pending,
        }
    }

    pub(crate) fn mark_running(&self) {
        self.started.store(true, Ordering::Release);
    }

    /// Records the terminal state. `written == 0` means nothing to merge.
    pub(crate) fn complete(&self, written: u64) {
        if self.written.set(written).is_err() {
            warn!("Task {} reported completion twice; keeping the first", self.index);
        }
    }
}

/// Builds the task list for one region, indexed in row order.
pub fn partition(region_id: &str, records: Vec<NetworkRecord>, temp_dir: &Path) -> Vec<ExpansionTask> {
    let mut tasks: Vec<ExpansionTask> = Vec::with_capacity(records.len());
    for (index, mut record) in records.into_iter().enumerate() {
        if record.region_id != region_id {
            debug!(
                "Row {index} carries region {} while partitioning {region_id}",
                record.region_id
            );
            record.region_id = region_id.to_string();
        }
        tasks.push(ExpansionTask::new(index, record, temp_dir));
    }
    tasks
}

pub fn temp_file_name(region_id: &str, index: usize) -> String {
    format!("{TEMP_FILE_PREFIX}{region_id}_{index}{TEMP_FILE_SUFFIX}")
}

/// Reads the task index back out of a temp file name written for `region_id`.
pub fn parse_task_index(file_name: &str, region_id: &str) -> Option<usize> {
    file_name
        .strip_prefix(TEMP_FILE_PREFIX)?
        .strip_prefix(region_id)?
        .strip_prefix('_')?
        .strip_suffix(TEMP_FILE_SUFFIX)?
        .parse()
        .ok()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
