use std::path::PathBuf;

use expandr_common::dataset::DatasetError;
use thiserror::Error;

/// Per-task failures. These are logged and turned into a zero-count
/// completion; they never abort the run.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("invalid CIDR '{0}'")]
    InvalidCidr(String),
    #[error("{0} is not an IPv4 network")]
    UnsupportedFamily(String),
    #[error("failed to write {path}: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("task exceeded its {0:?} deadline")]
    TaskTimeout(std::time::Duration),
}

/// Failures that abort a whole region run.
#[derive(Debug, Error)]
pub enum ExpandError {
    #[error("failed to start worker pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),
    #[error("failed to prepare temp directory {path}: {source}")]
    TempDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write output {path}: {source}")]
    OutputCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to finalize output {path}: {source}")]
    OutputFinalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}
