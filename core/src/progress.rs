//! # Progress Aggregator
//!
//! Workers each send exactly one [`ProgressEvent`] over an unbounded
//! multi-producer channel. A single consumer on the coordinating thread owns
//! all aggregation state and stops once every submitted task has reported.

use std::sync::mpsc::Receiver;

use tracing::error;

/// Completion notice for one task. Zero on any failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub addresses: u64,
}

/// Sink for the live progress display.
pub trait ProgressReporter {
    /// Called once before dispatch with the estimated total.
    fn start(&self, total: u64);
    fn advance(&self, addresses: u64);
    fn finish(&self);
}

/// Reporter that discards everything.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn start(&self, _total: u64) {}
    fn advance(&self, _addresses: u64) {}
    fn finish(&self) {}
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSummary {
    pub completed: usize,
    pub addresses: u64,
}

/// Drains `events` until `submitted` tasks have reported.
///
/// If every sender hangs up first (a worker died without reporting) the loop
/// ends early and the summary shows the shortfall.
pub fn aggregate(
    events: &Receiver<ProgressEvent>,
    submitted: usize,
    reporter: &dyn ProgressReporter,
) -> ProgressSummary {
    let mut summary = ProgressSummary::default();

    while summary.completed < submitted {
        match events.recv() {
            Ok(event) => {
                summary.addresses += event.addresses;
                summary.completed += 1;
                reporter.advance(event.addresses);
            }
            Err(_) => {
                error!(
                    "Progress channel closed after {} of {submitted} tasks reported",
                    summary.completed
                );
                break;
            }
        }
    }

    summary
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
