//! # Region Expander
//!
//! Orchestrates one region run:
//! 1. wipe and recreate the temp directory,
//! 2. estimate the total and partition rows into tasks,
//! 3. dispatch every task to a fixed-size pool without waiting on any,
//! 4. drain progress events on the calling thread until all tasks reported,
//! 5. wait for the pool to join, then merge and tear the temp directory down.
//!
//! Workers may finish in any order; the merge order is the task order.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use expandr_common::config::Config;
use expandr_common::dataset::{DatasetError, NetworkRecord};
use rayon::ThreadPoolBuilder;
use tracing::{info, warn};

use crate::error::ExpandError;
use crate::estimator;
use crate::merge::{self, MergeStats};
use crate::progress::{self, ProgressEvent, ProgressReporter};
use crate::task;
use crate::worker::{self, FsTempFiles, TempFileFactory};

/// Summary of one expanded region.
#[derive(Debug, Clone)]
pub struct RegionReport {
    pub region_id: String,
    pub tasks: usize,
    /// Usable-host estimate computed before dispatch.
    pub estimated: u64,
    /// Sum of the progress events.
    pub reported: u64,
    pub merge: MergeStats,
    pub elapsed: Duration,
    pub output: PathBuf,
}

impl RegionReport {
    pub fn addresses_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 { self.merge.lines_written as f64 / secs } else { 0.0 }
    }
}

#[derive(Debug, Clone)]
pub enum RegionOutcome {
    Expanded(RegionReport),
    /// The artifact already existed; nothing was loaded or expanded.
    Skipped(PathBuf),
}

pub struct RegionExpander {
    cfg: Config,
    files: Box<dyn TempFileFactory>,
}

impl RegionExpander {
    pub fn new(cfg: &Config) -> Self {
        Self {
            cfg: cfg.clone(),
            files: Box::new(FsTempFiles),
        }
    }

    /// Replaces how temp files are opened.
    pub fn with_temp_files(mut self, files: Box<dyn TempFileFactory>) -> Self {
        self.files = files;
        self
    }

    pub fn output_path(&self, region_id: &str) -> PathBuf {
        self.cfg.output_path(region_id)
    }

    /// Expands `region_id` unless its artifact already exists.
    ///
    /// `load` is only called when the region actually needs expanding.
    pub fn process_region<F>(
        &self,
        region_id: &str,
        load: F,
        reporter: &dyn ProgressReporter,
    ) -> Result<RegionOutcome, ExpandError>
    where
        F: FnOnce() -> Result<Vec<NetworkRecord>, DatasetError>,
    {
        let output = self.output_path(region_id);
        if output.exists() {
            info!("{} already exists, skipping region {region_id}", output.display());
            return Ok(RegionOutcome::Skipped(output));
        }

        let records = load()?;
        self.expand_region(region_id, records, reporter)
            .map(RegionOutcome::Expanded)
    }

    /// Expands `records` (already filtered to `region_id`) into the region's
    /// artifact, overwriting nothing but the temp directory.
    pub fn expand_region(
        &self,
        region_id: &str,
        records: Vec<NetworkRecord>,
        reporter: &dyn ProgressReporter,
    ) -> Result<RegionReport, ExpandError> {
        let start = Instant::now();
        info!("Expanding region {region_id} from {} rows", records.len());

        prepare_dir(&self.cfg.temp_dir, true).map_err(|source| ExpandError::TempDir {
            path: self.cfg.temp_dir.clone(),
            source,
        })?;
        prepare_dir(&self.cfg.results_dir, false).map_err(|source| ExpandError::OutputCreate {
            path: self.cfg.results_dir.clone(),
            source,
        })?;

        let estimated = estimator::estimate_total(&records);
        info!("Estimated total IPs to expand: {estimated}");

        let tasks = task::partition(region_id, records, &self.cfg.temp_dir);
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.cfg.workers)
            .thread_name(|i| format!("expandr-worker-{i}"))
            .build()?;

        reporter.start(estimated);

        let (tx, rx) = mpsc::channel::<ProgressEvent>();
        let task_list = &tasks;
        let files: &dyn TempFileFactory = &*self.files;
        let timeout = self.cfg.task_timeout;

        // Returns only after every spawned task has finished.
        let summary = pool.in_place_scope(move |scope| {
            for task in task_list {
                let tx = tx.clone();
                scope.spawn(move |_| worker::expand(task, files, timeout, tx));
            }
            drop(tx);
            progress::aggregate(&rx, task_list.len(), reporter)
        });

        reporter.finish();

        if summary.completed != tasks.len() {
            warn!("Only {} of {} tasks reported progress", summary.completed, tasks.len());
        }
        info!(
            "Workers finished: {} tasks, {} addresses in {:.2}s",
            summary.completed,
            summary.addresses,
            start.elapsed().as_secs_f64()
        );

        let output = self.output_path(region_id);
        let merged = merge::merge_into(&self.cfg.temp_dir, region_id, &tasks, &output);
        merge::teardown(&self.cfg.temp_dir);
        let merge = merged?;

        Ok(RegionReport {
            region_id: region_id.to_string(),
            tasks: tasks.len(),
            estimated,
            reported: summary.addresses,
            merge,
            elapsed: start.elapsed(),
            output,
        })
    }
}

fn prepare_dir(dir: &Path, fresh: bool) -> io::Result<()> {
    if fresh && dir.exists() {
        warn!("Removing leftover temp directory {}", dir.display());
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
