//! # Settings & Runtime Configuration
//!
//! [`Settings`] is the JSON settings file read once at startup. [`Config`] is
//! the resolved runtime configuration handed to the expansion engine by
//! reference; command-line overrides are applied on top of it by the binary.

use std::fs;
use std::path::{self, Component, Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::dataset::DatasetSource;

pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";
pub const DEFAULT_NETWORK_COLUMN: &str = "network";
pub const DEFAULT_REGION_COLUMN: &str = "geoname_id";
pub const DEFAULT_RESULTS_DIR: &str = "extracted";
pub const DEFAULT_TEMP_DIR: &str = "temp_expanded";
pub const DEFAULT_WORKERS: usize = 4;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("worker pool size must be at least 1")]
    NoWorkers,
    #[error("no region ids configured")]
    NoRegions,
    #[error("temp directory {temp_dir} would wipe results directory {results_dir}")]
    TempDirOverlap {
        temp_dir: PathBuf,
        results_dir: PathBuf,
    },
}

/// Contents of the settings file.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub csv_file: PathBuf,
    #[serde(deserialize_with = "region_ids")]
    pub geoname_ids: Vec<String>,
    #[serde(default = "default_network_column")]
    pub network_column: String,
    #[serde(default = "default_region_column")]
    pub region_column: String,
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub task_timeout_secs: Option<u64>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// The configured region ids, in processing order.
    pub fn regions(&self) -> Result<&[String], ConfigError> {
        if self.geoname_ids.is_empty() {
            return Err(ConfigError::NoRegions);
        }
        Ok(&self.geoname_ids)
    }

    pub fn dataset(&self) -> DatasetSource {
        DatasetSource::new(&self.csv_file, &self.network_column, &self.region_column)
    }

    pub fn runtime_config(&self) -> Config {
        Config {
            workers: self.workers,
            results_dir: self.results_dir.clone(),
            temp_dir: self.temp_dir.clone(),
            task_timeout: self.task_timeout_secs.map(Duration::from_secs),
            quiet: 0,
        }
    }
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Size of the worker pool.
    pub workers: usize,
    /// Directory holding one `<region>.txt` per processed region.
    pub results_dir: PathBuf,
    /// Scratch directory for per-task temp files. Wiped at the start and end
    /// of every region run.
    pub temp_dir: PathBuf,
    /// Per-task deadline. `None` lets a task run for as long as it needs.
    pub task_timeout: Option<Duration>,
    /// 0 = everything, 1 = no headers, 2 = warnings and errors only.
    pub quiet: u8,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        // The temp directory is removed wholesale before every region.
        if comparable(&self.results_dir).starts_with(comparable(&self.temp_dir)) {
            return Err(ConfigError::TempDirOverlap {
                temp_dir: self.temp_dir.clone(),
                results_dir: self.results_dir.clone(),
            });
        }
        Ok(())
    }

    /// Path of the final artifact for `region_id`.
    pub fn output_path(&self, region_id: &str) -> PathBuf {
        self.results_dir.join(format!("{region_id}.txt"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            temp_dir: PathBuf::from(DEFAULT_TEMP_DIR),
            task_timeout: None,
            quiet: 0,
        }
    }
}

/// Absolute form of `p` without `.` components, without touching the disk.
fn comparable(p: &Path) -> PathBuf {
    path::absolute(p)
        .unwrap_or_else(|_| p.to_path_buf())
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn default_network_column() -> String {
    DEFAULT_NETWORK_COLUMN.to_string()
}

fn default_region_column() -> String {
    DEFAULT_REGION_COLUMN.to_string()
}

fn default_results_dir() -> PathBuf {
    PathBuf::from(DEFAULT_RESULTS_DIR)
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from(DEFAULT_TEMP_DIR)
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

/// Region ids may be written as JSON numbers or strings.
fn region_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RegionId {
        Number(u64),
        Text(String),
    }

    let ids: Vec<RegionId> = Vec::deserialize(deserializer)?;
    Ok(ids
        .into_iter()
        .map(|id| match id {
            RegionId::Number(n) => n.to_string(),
            RegionId::Text(s) => s.trim().to_string(),
        })
        .collect())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
