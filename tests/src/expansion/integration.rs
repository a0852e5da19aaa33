use std::cell::Cell;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use expandr_common::network::address;
use expandr_core::estimator;
use expandr_core::{RegionExpander, RegionOutcome, SilentProgress};

use crate::utils::{self, FailingFiles, RecordingFiles};

fn expanded(outcome: RegionOutcome) -> expandr_core::RegionReport {
    match outcome {
        RegionOutcome::Expanded(report) => report,
        RegionOutcome::Skipped(path) => panic!("region unexpectedly skipped: {}", path.display()),
    }
}

/// Valid row followed by garbage: only the valid row's hosts appear, in order.
#[test]
fn invalid_row_is_ignored() {
    let tmp = tempfile::tempdir().unwrap();
    let dataset = utils::write_dataset(
        tmp.path(),
        &[("192.168.1.0/30", "100"), ("not-a-cidr", "100")],
    );
    let cfg = utils::config(tmp.path(), 4);

    let records = dataset.load_region("100").unwrap();
    assert_eq!(estimator::estimate_total(&records), 2);

    let report = expanded(
        RegionExpander::new(&cfg)
            .process_region("100", || dataset.load_region("100"), &SilentProgress)
            .unwrap(),
    );

    assert_eq!(report.output, cfg.results_dir.join("100.txt"));
    assert_eq!(utils::read_lines(&report.output), vec!["192.168.1.1", "192.168.1.2"]);
    assert_eq!(report.estimated, 2);
    assert_eq!(report.reported, 2);
    assert!(!cfg.temp_dir.exists(), "temp directory must be torn down");
}

/// Two regions in one run: independent artifacts, disjoint temp file names.
#[test]
fn regions_do_not_share_temp_files() {
    let tmp = tempfile::tempdir().unwrap();
    let dataset = utils::write_dataset(
        tmp.path(),
        &[
            ("10.0.0.0/30", "100"),
            ("10.1.0.0/30", "200"),
            ("10.0.0.8/31", "100"),
            ("10.1.0.9/32", "200"),
        ],
    );
    let cfg = utils::config(tmp.path(), 3);

    let mut seen: Vec<HashSet<PathBuf>> = Vec::new();

    for region in ["100", "200"] {
        let recorder = RecordingFiles::default();
        RegionExpander::new(&cfg)
            .with_temp_files(Box::new(recorder.clone()))
            .process_region(region, || dataset.load_region(region), &SilentProgress)
            .unwrap();
        seen.push(recorder.opened().into_iter().collect());
    }

    assert_eq!(seen[0].len(), 2);
    assert_eq!(seen[1].len(), 2);
    assert!(seen[0].is_disjoint(&seen[1]));
    assert_eq!(
        utils::read_lines(&cfg.output_path("100")),
        vec!["10.0.0.1", "10.0.0.2", "10.0.0.8", "10.0.0.9"]
    );
    assert_eq!(
        utils::read_lines(&cfg.output_path("200")),
        vec!["10.1.0.1", "10.1.0.2", "10.1.0.9"]
    );
}

/// A worker whose temp file write fails does not stop the run or leak
/// partial data into the artifact.
#[test]
fn write_failure_loses_only_that_task() {
    let tmp = tempfile::tempdir().unwrap();
    let dataset = utils::write_dataset(
        tmp.path(),
        &[("10.0.0.0/29", "7"), ("10.0.1.0/24", "7"), ("10.0.2.0/30", "7")],
    );
    let cfg = utils::config(tmp.path(), 2);
    let files = FailingFiles {
        region: "7".to_string(),
        failing_index: 1,
    };

    let report = expanded(
        RegionExpander::new(&cfg)
            .with_temp_files(Box::new(files))
            .process_region("7", || dataset.load_region("7"), &SilentProgress)
            .unwrap(),
    );

    let mut expected: Vec<String> = (1..=6).map(|i| format!("10.0.0.{i}")).collect();
    expected.extend(["10.0.2.1".to_string(), "10.0.2.2".to_string()]);

    assert_eq!(utils::read_lines(&report.output), expected);
    assert_eq!(report.estimated, 6 + 254 + 2);
    assert_eq!(report.reported, 8);
    assert_eq!(report.merge.files, 2);
}

/// Second invocation finds the artifact and does nothing.
#[test]
fn rerun_is_a_no_op() {
    let tmp = tempfile::tempdir().unwrap();
    let dataset = utils::write_dataset(tmp.path(), &[("172.16.0.0/29", "55")]);
    let cfg = utils::config(tmp.path(), 2);
    let expander = RegionExpander::new(&cfg);

    let first = expanded(
        expander
            .process_region("55", || dataset.load_region("55"), &SilentProgress)
            .unwrap(),
    );
    let before = fs::read(&first.output).unwrap();
    let modified = fs::metadata(&first.output).unwrap().modified().unwrap();

    let loaded = Cell::new(false);
    let second = expander
        .process_region(
            "55",
            || {
                loaded.set(true);
                dataset.load_region("55")
            },
            &SilentProgress,
        )
        .unwrap();

    assert!(matches!(second, RegionOutcome::Skipped(ref p) if *p == first.output));
    assert!(!loaded.get(), "no dataset work on the second run");
    assert!(!cfg.temp_dir.exists());
    assert_eq!(fs::read(&first.output).unwrap(), before);
    assert_eq!(fs::metadata(&first.output).unwrap().modified().unwrap(), modified);
}

/// Every line of the artifact is a dotted quad, and counts match usable hosts.
#[test]
fn artifact_holds_only_dotted_quads() {
    let tmp = tempfile::tempdir().unwrap();
    let dataset = utils::write_dataset(
        tmp.path(),
        &[
            ("192.0.2.77/26", "9"),
            ("2001:db8::/124", "9"),
            ("198.51.100.0/31", "9"),
            ("", "9"),
            ("203.0.113.5", "9"),
        ],
    );
    let cfg = utils::config(tmp.path(), 4);

    let report = expanded(
        RegionExpander::new(&cfg)
            .process_region("9", || dataset.load_region("9"), &SilentProgress)
            .unwrap(),
    );

    let lines = utils::read_lines(&report.output);
    assert!(lines.iter().all(|l| address::is_dotted_quad(l)));
    assert_eq!(lines.len(), 62 + 2 + 1);
    assert_eq!(lines.len() as u64, report.estimated);
    assert_eq!(lines.first().map(String::as_str), Some("192.0.2.65"));
    assert_eq!(lines.last().map(String::as_str), Some("203.0.113.5"));
    assert_eq!(report.tasks, 5);
}

#[test]
fn invalid_rows_open_no_temp_file() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = utils::config(tmp.path(), 2);
    let dataset = utils::write_dataset(
        tmp.path(),
        &[("10.0.0.0/30", "3"), ("junk", "3"), ("10.0.0.4/30", "3")],
    );

    let recorder = RecordingFiles::default();
    RegionExpander::new(&cfg)
        .with_temp_files(Box::new(recorder.clone()))
        .expand_region("3", dataset.load_region("3").unwrap(), &SilentProgress)
        .unwrap();

    assert_eq!(
        recorder.opened(),
        vec![cfg.temp_dir.join("temp_3_0.txt"), cfg.temp_dir.join("temp_3_2.txt")]
    );
}
