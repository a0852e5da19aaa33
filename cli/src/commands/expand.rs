use std::time::{Duration, Instant};

use anyhow::Context;
use colored::*;
use tracing::{info, info_span};

use crate::mprint;
use crate::terminal::{colors, print, progress::SpanProgress};
use expandr_common::config::{Config, Settings};
use expandr_core::{RegionExpander, RegionOutcome, RegionReport};

const REPORT_KEYS: [&str; 7] = ["Region", "Networks", "Estimated", "Written", "Rejected", "Rate", "Output"];

pub fn expand(settings: &Settings, cfg: &Config) -> anyhow::Result<()> {
    let regions = settings.regions()?;
    let dataset = settings.dataset();
    let expander = RegionExpander::new(cfg);

    let start_time: Instant = Instant::now();
    let mut expanded: usize = 0;
    let mut skipped: usize = 0;

    for region in regions {
        let span = info_span!("expand", indicatif.pb_show = true, region = %region);
        let reporter = SpanProgress::new(span.clone(), region);
        let guard = span.enter();

        let outcome = expander
            .process_region(region, || dataset.load_region(region), &reporter)
            .with_context(|| format!("Failed to expand region {region}"))?;

        drop(guard);

        match outcome {
            RegionOutcome::Expanded(report) => {
                print_report(&report, cfg);
                expanded += 1;
            }
            RegionOutcome::Skipped(path) => {
                info!("Region {region} already expanded at {}", path.display());
                skipped += 1;
            }
        }
    }

    print_summary(expanded, skipped, start_time.elapsed(), cfg);
    Ok(())
}

fn print_report(report: &RegionReport, cfg: &Config) {
    if cfg.quiet > 0 {
        info!(
            "Region {}: {} IPs written to {}",
            report.region_id,
            report.merge.lines_written,
            report.output.display()
        );
        return;
    }

    print::header(&format!("region {}", report.region_id), cfg.quiet);
    print::set_key_width(REPORT_KEYS);

    let rejected: ColoredString = if report.merge.lines_rejected > 0 {
        report.merge.lines_rejected.to_string().color(colors::WARNING)
    } else {
        "0".normal()
    };

    print::aligned_line("Region", report.region_id.as_str());
    print::aligned_line("Networks", report.tasks.to_string());
    print::aligned_line("Estimated", report.estimated.to_string());
    print::aligned_line("Written", report.merge.lines_written.to_string().green().bold());
    print::aligned_line("Rejected", rejected);
    print::aligned_line(
        "Rate",
        format!(
            "{:.2} IPs/s over {:.2}s",
            report.addresses_per_second(),
            report.elapsed.as_secs_f64()
        ),
    );
    print::aligned_line("Output", report.output.display().to_string().color(colors::ACCENT));
    mprint!();
}

fn print_summary(expanded: usize, skipped: usize, total_time: Duration, cfg: &Config) {
    let expanded: ColoredString = format!("{expanded} expanded").bold().green();
    let skipped: ColoredString = format!("{skipped} skipped").bold().yellow();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output: &ColoredString =
        &format!("Expansion Complete: {expanded}, {skipped} in {total_time}").color(colors::TEXT_DEFAULT);

    match cfg.quiet {
        0 => {
            print::fat_separator();
            print::centerln(output);
        }
        _ => info!("{}", output),
    }
}
