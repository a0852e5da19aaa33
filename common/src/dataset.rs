//! # Dataset Loading
//!
//! Reads the network dataset (CSV with a header row) and filters it down to
//! the rows of one region. Row order is preserved: it becomes the task order
//! and therefore the order of the final artifact.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

/// One dataset row: a CIDR string and the region it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRecord {
    pub cidr: String,
    pub region_id: String,
}

impl NetworkRecord {
    pub fn new(cidr: impl Into<String>, region_id: impl Into<String>) -> Self {
        Self {
            cidr: cidr.into(),
            region_id: region_id.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to open dataset {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("dataset is missing the '{0}' column")]
    MissingColumn(String),
    #[error("failed to read dataset row {row}: {source}")]
    Row {
        row: u64,
        #[source]
        source: csv::Error,
    },
    #[error("failed to read dataset header: {0}")]
    Header(#[source] csv::Error),
}

/// Where the dataset lives and which columns carry the network and region.
#[derive(Debug, Clone)]
pub struct DatasetSource {
    pub path: PathBuf,
    pub network_column: String,
    pub region_column: String,
}

impl DatasetSource {
    pub fn new(
        path: impl Into<PathBuf>,
        network_column: impl Into<String>,
        region_column: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            network_column: network_column.into(),
            region_column: region_column.into(),
        }
    }

    /// Loads every row whose region column equals `region_id`, in file order.
    pub fn load_region(&self, region_id: &str) -> Result<Vec<NetworkRecord>, DatasetError> {
        let file = File::open(&self.path).map_err(|source| DatasetError::Open {
            path: self.path.clone(),
            source,
        })?;
        let records = self.read_region(file, region_id)?;
        info!(
            "{} rows in {} after filtering by region {region_id}",
            records.len(),
            display_name(&self.path)
        );
        Ok(records)
    }

    /// Same as [`Self::load_region`] but over any reader.
    pub fn read_region<R: Read>(
        &self,
        reader: R,
        region_id: &str,
    ) -> Result<Vec<NetworkRecord>, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers().map_err(DatasetError::Header)?.clone();
        let network_idx = column_index(&headers, &self.network_column)?;
        let region_idx = column_index(&headers, &self.region_column)?;

        let wanted = region_id.trim();
        let mut records = Vec::new();

        for (row, result) in csv_reader.records().enumerate() {
            let record = result.map_err(|source| DatasetError::Row {
                row: row as u64 + 1,
                source,
            })?;

            let region = record.get(region_idx).unwrap_or_default();
            if region != wanted {
                continue;
            }

            let cidr = record.get(network_idx).unwrap_or_default();
            records.push(NetworkRecord::new(cidr, region));
        }

        debug!("Matched {} rows for region {wanted}", records.len());
        Ok(records)
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, DatasetError> {
    headers
        .iter()
        .position(|header| header == name)
        .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
