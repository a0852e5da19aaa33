//! # Expandr Core
//!
//! The parallel expansion engine. A region's rows flow through:
//!
//! * **[`estimator`]**: sums usable-host counts to size the progress display.
//! * **[`task`]**: turns rows into indexed [`task::ExpansionTask`]s.
//! * **[`worker`]**: expands one task into its own temp file.
//! * **[`progress`]**: drains completion events until every task reported.
//! * **[`merge`]**: concatenates temp files in task-index order.
//!
//! [`expander::RegionExpander`] wires the stages together.

pub mod error;
pub mod estimator;
pub mod expander;
pub mod merge;
pub mod progress;
pub mod task;
pub mod worker;

pub use error::{ExpandError, TaskError};
pub use expander::{RegionExpander, RegionOutcome, RegionReport};
pub use progress::{ProgressReporter, SilentProgress};
