use anyhow::Context;
use colored::*;

use crate::mprint;
use crate::terminal::{colors, print};
use expandr_common::config::{Config, Settings};
use expandr_common::network::cidr;
use expandr_core::estimator;

const KEYS: [&str; 5] = ["Region", "Networks", "Invalid", "Usable IPs", "Status"];

pub fn estimate(settings: &Settings, only: Option<&str>, cfg: &Config) -> anyhow::Result<()> {
    let regions: Vec<&str> = match only {
        Some(region) => vec![region],
        None => settings.regions()?.iter().map(String::as_str).collect(),
    };
    let dataset = settings.dataset();
    let mut grand_total: u64 = 0;

    print::set_key_width(KEYS);

    for region in regions {
        let records = dataset
            .load_region(region)
            .with_context(|| format!("Failed to load region {region}"))?;

        let invalid: usize = records
            .iter()
            .filter(|record| cidr::validate_cidr(&record.cidr).is_none())
            .count();
        let total: u64 = estimator::estimate_total(&records);
        grand_total += total;

        let status: ColoredString = if cfg.output_path(region).exists() {
            "already expanded".color(colors::WARNING)
        } else {
            "pending".normal()
        };

        print::aligned_line("Region", region);
        print::aligned_line("Networks", records.len().to_string());
        print::aligned_line("Invalid", invalid.to_string());
        print::aligned_line("Usable IPs", total.to_string().green().bold());
        print::aligned_line("Status", status);
        mprint!();
    }

    if cfg.quiet == 0 {
        print::fat_separator();
    }
    print::centerln(&format!("Estimated total IPs to expand: {}", grand_total.to_string().bold().green()));
    Ok(())
}
