use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use expandr_common::config::Config;
use expandr_common::dataset::DatasetSource;
use expandr_core::task;
use expandr_core::worker::{FsTempFiles, TempFileFactory};

/// Writes a `network,geoname_id` CSV into `dir` and returns a source for it.
pub fn write_dataset(dir: &Path, rows: &[(&str, &str)]) -> DatasetSource {
    let path: PathBuf = dir.join("blocks.csv");
    let mut body = String::from("network,geoname_id,is_anycast\n");
    for (network, region) in rows {
        body.push_str(&format!("{network},{region},0\n"));
    }
    fs::write(&path, body).unwrap();
    DatasetSource::new(path, "network", "geoname_id")
}

pub fn config(root: &Path, workers: usize) -> Config {
    Config {
        workers,
        results_dir: root.join("extracted"),
        temp_dir: root.join("temp_expanded"),
        task_timeout: None,
        quiet: 0,
    }
}

pub fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

fn task_index(path: &Path, region: &str) -> Option<usize> {
    let name = path.file_name()?.to_str()?;
    task::parse_task_index(name, region)
}

/// Remembers every temp path it was asked to open. Clones share the log.
#[derive(Default, Clone)]
pub struct RecordingFiles {
    opened: Arc<Mutex<Vec<PathBuf>>>,
}

impl RecordingFiles {
    pub fn opened(&self) -> Vec<PathBuf> {
        let mut opened = self.opened.lock().unwrap().clone();
        opened.sort();
        opened
    }
}

impl TempFileFactory for RecordingFiles {
    fn create(&self, path: &Path) -> io::Result<Box<dyn Write>> {
        self.opened.lock().unwrap().push(path.to_path_buf());
        FsTempFiles.create(path)
    }
}

/// Sleeps before opening each temp file, by task index.
pub struct DelayedFiles<F: Fn(usize) -> Duration + Send + Sync> {
    pub region: String,
    pub delay: F,
}

impl<F: Fn(usize) -> Duration + Send + Sync> TempFileFactory for DelayedFiles<F> {
    fn create(&self, path: &Path) -> io::Result<Box<dyn Write>> {
        if let Some(index) = task_index(path, &self.region) {
            std::thread::sleep((self.delay)(index));
        }
        FsTempFiles.create(path)
    }
}

/// Real files, except the task at `failing_index` which fails after a few bytes.
pub struct FailingFiles {
    pub region: String,
    pub failing_index: usize,
}

impl TempFileFactory for FailingFiles {
    fn create(&self, path: &Path) -> io::Result<Box<dyn Write>> {
        let file = FsTempFiles.create(path)?;
        if task_index(path, &self.region) == Some(self.failing_index) {
            return Ok(Box::new(ShortWriter { inner: file, budget: 24 }));
        }
        Ok(file)
    }
}

/// Passes `budget` bytes through, then reports a full disk.
struct ShortWriter {
    inner: Box<dyn Write>,
    budget: usize,
}

impl Write for ShortWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.budget == 0 {
            return Err(io::Error::other("no space left on device"));
        }
        let n = buf.len().min(self.budget);
        let written = self.inner.write(&buf[..n])?;
        self.budget -= written;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
