//! Output order follows dataset row order no matter how workers are scheduled.

use std::fs;
use std::path::Path;
use std::time::Duration;

use expandr_common::dataset::NetworkRecord;
use expandr_core::{RegionExpander, SilentProgress};
use rand::Rng;

use crate::utils::{self, DelayedFiles};

const REGION: &str = "321";

fn rows() -> Vec<NetworkRecord> {
    (0..16)
        .map(|i| {
            let cidr = match i % 4 {
                0 => format!("10.{i}.0.0/28"),
                1 => format!("10.{i}.0.0/31"),
                2 => format!("10.{i}.0.9/32"),
                _ => format!("10.{i}.4.0/25"),
            };
            NetworkRecord::new(cidr, REGION)
        })
        .collect()
}

fn run(root: &Path, workers: usize, delay: impl Fn(usize) -> Duration + Send + Sync + 'static) -> Vec<u8> {
    let cfg = utils::config(root, workers);
    let files = DelayedFiles {
        region: REGION.to_string(),
        delay,
    };
    let report = RegionExpander::new(&cfg)
        .with_temp_files(Box::new(files))
        .expand_region(REGION, rows(), &SilentProgress)
        .unwrap();
    fs::read(report.output).unwrap()
}

fn sequential_baseline() -> Vec<u8> {
    let tmp = tempfile::tempdir().unwrap();
    run(tmp.path(), 1, |_| Duration::ZERO)
}

#[test]
fn baseline_is_row_order() {
    let output = String::from_utf8(sequential_baseline()).unwrap();
    let mut lines = output.lines();

    // Row 0 is 10.0.0.0/28, row 1 is 10.1.0.0/31.
    assert_eq!(lines.next(), Some("10.0.0.1"));
    assert_eq!(output.lines().nth(14), Some("10.1.0.0"));
    assert_eq!(output.lines().nth(16), Some("10.2.0.9"));
    assert_eq!(output.lines().count(), 4 * (14 + 2 + 1 + 126));
}

#[test]
fn reversed_completion_is_byte_identical() {
    let baseline = sequential_baseline();

    let tmp = tempfile::tempdir().unwrap();
    // Earlier rows sleep longer, so later rows finish first.
    let output = run(tmp.path(), 8, |index| Duration::from_millis(5 * (16 - index as u64)));

    assert_eq!(output, baseline);
}

#[test]
fn random_completion_is_byte_identical() {
    let baseline = sequential_baseline();

    for _ in 0..3 {
        let delays: Vec<u64> = (0..16).map(|_| rand::rng().random_range(0..25)).collect();
        let tmp = tempfile::tempdir().unwrap();
        let output = run(tmp.path(), 6, move |index| Duration::from_millis(delays[index]));
        assert_eq!(output, baseline);
    }
}
