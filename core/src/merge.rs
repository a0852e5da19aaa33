//! # Merge & Finalize
//!
//! Runs after the pool has joined. Temp files are collected from the working
//! directory, mapped back to their task through the on-disk naming convention
//! and concatenated in ascending task-index order. Each line is re-validated
//! on the way through.
//!
//! A temp file that cannot be read to the end contributes nothing: whatever
//! it already appended is cut off again before the next file starts.
//!
//! The artifact is assembled under a hidden `.part` name and renamed into
//! place, so `<region>.txt` only ever exists complete.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use expandr_common::network::address;
use tracing::{debug, error, info, warn};

use crate::error::ExpandError;
use crate::task::{self, ExpansionTask, TaskState};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    /// Temp files read into the output.
    pub files: usize,
    pub lines_written: u64,
    /// Lines dropped by re-validation.
    pub lines_rejected: u64,
    /// Temp files of completed tasks that were missing, or could not be
    /// opened or read to the end.
    pub files_failed: usize,
}

/// Concatenates the temp files of `tasks` into `output`, in task-index order.
pub fn merge_into(
    temp_dir: &Path,
    region_id: &str,
    tasks: &[ExpansionTask],
    output: &Path,
) -> Result<MergeStats, ExpandError> {
    let (ordered, missing) = collect_temp_files(temp_dir, region_id, tasks)?;
    let partial = partial_path(output);

    let file = File::create(&partial).map_err(|source| ExpandError::OutputCreate {
        path: partial.clone(),
        source,
    })?;

    let mut stats = MergeStats {
        files_failed: missing,
        ..MergeStats::default()
    };
    if let Err(source) = write_merged(file, &ordered, &mut stats) {
        discard(&partial);
        return Err(ExpandError::OutputCreate {
            path: partial,
            source,
        });
    }

    if let Err(source) = fs::rename(&partial, output) {
        discard(&partial);
        return Err(ExpandError::OutputFinalize {
            path: output.to_path_buf(),
            source,
        });
    }

    if stats.files_failed > 0 {
        warn!("{} temp files could not be merged into {}", stats.files_failed, output.display());
    }
    info!("Saved {} expanded IPs to {}", stats.lines_written, output.display());
    Ok(stats)
}

/// Removes the working directory and everything in it.
pub fn teardown(temp_dir: &Path) {
    match fs::remove_dir_all(temp_dir) {
        Ok(()) => debug!("Removed temp directory {}", temp_dir.display()),
        Err(e) => error!("Failed to remove temp directory {}: {e}", temp_dir.display()),
    }
}

/// Appends every file of `ordered` to `output`.
///
/// Only errors on the output side are returned; a temp file that fails to
/// open or read is counted in `stats.files_failed` and rolled back.
fn write_merged(
    output: File,
    ordered: &[(usize, PathBuf)],
    stats: &mut MergeStats,
) -> io::Result<()> {
    let mut writer = BufWriter::new(output);
    let mut committed: u64 = 0;

    for (index, path) in ordered {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                error!("Failed to open temp file for task {index} ({}): {e}", path.display());
                stats.files_failed += 1;
                continue;
            }
        };

        let mut written = 0u64;
        let mut rejected = 0u64;
        let mut bytes = 0u64;
        let mut read_error = None;

        for line in BufReader::new(file).lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    read_error = Some(e);
                    break;
                }
            };

            let ip = line.trim();
            if !address::is_dotted_quad(ip) {
                error!("Invalid IP found during merging: {ip}");
                rejected += 1;
                continue;
            }

            writeln!(writer, "{ip}")?;
            written += 1;
            bytes += ip.len() as u64 + 1;
        }

        if let Some(e) = read_error {
            error!(
                "Failed to read temp file for task {index} ({}): {e}, dropping {written} lines",
                path.display()
            );
            stats.files_failed += 1;
            if bytes > 0 {
                truncate(&mut writer, committed)?;
            }
            continue;
        }

        committed += bytes;
        stats.files += 1;
        stats.lines_written += written;
        stats.lines_rejected += rejected;
    }

    writer.flush()
}

/// Cuts the output back to `len` bytes and continues writing from there.
fn truncate(writer: &mut BufWriter<File>, len: u64) -> io::Result<()> {
    writer.flush()?;
    let file = writer.get_mut();
    file.set_len(len)?;
    file.seek(SeekFrom::Start(len))?;
    Ok(())
}

fn discard(partial: &Path) {
    if let Err(e) = fs::remove_file(partial) {
        warn!("Failed to remove partial output {}: {e}", partial.display());
    }
}

/// Lists mergeable temp files sorted by task index, along with the number of
/// completed tasks whose file is gone.
///
/// Files whose task ended empty are left out: a failed write may have left
/// a partial file behind.
fn collect_temp_files(
    temp_dir: &Path,
    region_id: &str,
    tasks: &[ExpansionTask],
) -> Result<(Vec<(usize, PathBuf)>, usize), ExpandError> {
    let entries = fs::read_dir(temp_dir).map_err(|source| ExpandError::TempDir {
        path: temp_dir.to_path_buf(),
        source,
    })?;

    let mut ordered: Vec<(usize, PathBuf)> = Vec::with_capacity(tasks.len());
    let mut seen = vec![false; tasks.len()];

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                error!("Failed to list {}: {e}", temp_dir.display());
                continue;
            }
        };

        let name = entry.file_name();
        let Some(index) = name.to_str().and_then(|n| task::parse_task_index(n, region_id)) else {
            warn!("Ignoring unexpected file {:?} in temp directory", name);
            continue;
        };

        match tasks.get(index).map(ExpansionTask::state) {
            Some(TaskState::Completed(_)) => {
                seen[index] = true;
                ordered.push((index, entry.path()));
            }
            Some(state) => debug!("Skipping temp file of task {index} ({state:?})"),
            None => warn!("Temp file {:?} does not belong to any task", name),
        }
    }

    let mut missing = 0;
    for (index, task) in tasks.iter().enumerate() {
        if let TaskState::Completed(n) = task.state() {
            if !seen[index] {
                error!(
                    "Temp file of task {index} is missing ({}), {n} addresses lost",
                    task.temp_path.display()
                );
                missing += 1;
            }
        }
    }

    ordered.sort_unstable_by_key(|(index, _)| *index);
    Ok((ordered, missing))
}

fn partial_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!(".{name}.part"))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
