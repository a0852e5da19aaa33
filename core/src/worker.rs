//! # Worker
//!
//! Expands one [`ExpansionTask`] into its exclusive temp file and reports the
//! number of addresses written. Every generated address is re-checked against
//! the strict dotted-quad pattern before it is written.
//!
//! A worker never propagates failure: invalid rows, write errors and timeouts
//! are logged, the task completes empty and the progress event carries zero.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use expandr_common::network::{address, cidr};
use tracing::{debug, error, warn};

use crate::error::TaskError;
use crate::progress::ProgressEvent;
use crate::task::ExpansionTask;

/// Addresses written between deadline checks.
const DEADLINE_CHECK_INTERVAL: u64 = 4096;

/// Opens the writer behind a task's temp file.
pub trait TempFileFactory: Send + Sync {
    fn create(&self, path: &Path) -> io::Result<Box<dyn Write>>;
}

/// Plain files on the local filesystem.
pub struct FsTempFiles;

impl TempFileFactory for FsTempFiles {
    fn create(&self, path: &Path) -> io::Result<Box<dyn Write>> {
        Ok(Box::new(File::create(path)?))
    }
}

/// Runs `task` to completion and sends exactly one progress event.
pub fn expand(
    task: &ExpansionTask,
    files: &dyn TempFileFactory,
    timeout: Option<Duration>,
    progress: Sender<ProgressEvent>,
) {
    task.mark_running();

    let written = match write_hosts(task, files, timeout) {
        Ok(written) => {
            debug!("Task {} wrote {written} addresses from {}", task.index, task.record.cidr);
            written
        }
        Err(err @ (TaskError::InvalidCidr(_) | TaskError::UnsupportedFamily(_))) => {
            warn!("Skipping row {} of region {}: {err}", task.index, task.record.region_id);
            0
        }
        Err(err) => {
            error!("Task {} ({}) abandoned: {err}", task.index, task.record.cidr);
            0
        }
    };

    task.complete(written);

    if progress.send(ProgressEvent { addresses: written }).is_err() {
        error!("Progress channel closed before task {} could report", task.index);
    }
}

fn write_hosts(
    task: &ExpansionTask,
    files: &dyn TempFileFactory,
    timeout: Option<Duration>,
) -> Result<u64, TaskError> {
    let network = cidr::validate_cidr(&task.record.cidr)
        .ok_or_else(|| TaskError::InvalidCidr(task.record.cidr.clone()))?;
    let hosts = network
        .usable_hosts()
        .ok_or_else(|| TaskError::UnsupportedFamily(network.to_string()))?;

    let write_failure = |source: io::Error| TaskError::WriteFailure {
        path: task.temp_path.clone(),
        source,
    };

    let deadline = timeout.map(|limit| (Instant::now() + limit, limit));
    let mut writer = BufWriter::new(files.create(&task.temp_path).map_err(write_failure)?);
    let mut written: u64 = 0;

    for (generated, addr) in hosts.iter().enumerate() {
        if let Some((deadline, limit)) = deadline {
            if generated as u64 % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() >= deadline {
                return Err(TaskError::TaskTimeout(limit));
            }
        }

        let line = addr.to_string();
        if !address::is_dotted_quad(&line) {
            error!("Invalid IP generated: {line} from CIDR: {}", task.record.cidr);
            continue;
        }

        writeln!(writer, "{line}").map_err(write_failure)?;
        written += 1;
    }

    writer.flush().map_err(write_failure)?;
    Ok(written)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
