pub mod estimate;
pub mod expand;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use expandr_common::config::{Config, DEFAULT_SETTINGS_FILE};

#[derive(Parser)]
#[command(name = "expandr")]
#[command(about = "Expands CIDR blocks into per-region lists of IPv4 hosts.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file with the dataset path and region ids
    #[arg(short, long, global = true, default_value = DEFAULT_SETTINGS_FILE)]
    pub settings: PathBuf,

    /// Number of parallel workers
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// Directory for the per-region output files
    #[arg(long, global = true)]
    pub results_dir: Option<PathBuf>,

    /// Scratch directory for per-task temp files
    #[arg(long, global = true)]
    pub temp_dir: Option<PathBuf>,

    /// Abandon any single network that takes longer than this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub task_timeout: Option<u64>,

    /// Reduce output (-q hides headers, -qq shows only warnings and errors)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub quiet: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Expand every configured region that has no output yet
    #[command(alias = "e")]
    Expand,
    /// Show task counts and address estimates without expanding
    #[command(alias = "est")]
    Estimate {
        /// Only estimate this region
        #[arg(short, long)]
        region: Option<String>,
    },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Applies command-line overrides on top of the settings file.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(workers) = self.workers {
            cfg.workers = workers;
        }
        if let Some(dir) = &self.results_dir {
            cfg.results_dir = dir.clone();
        }
        if let Some(dir) = &self.temp_dir {
            cfg.temp_dir = dir.clone();
        }
        if let Some(secs) = self.task_timeout {
            cfg.task_timeout = Some(std::time::Duration::from_secs(secs));
        }
        cfg.quiet = self.quiet;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn overrides_replace_settings_values() {
        let cli = CommandLine::parse_from([
            "expandr",
            "expand",
            "--workers",
            "9",
            "--results-dir",
            "out",
            "--task-timeout",
            "5",
            "-qq",
        ]);
        let mut cfg = Config::default();
        cli.apply_overrides(&mut cfg);

        assert_eq!(cfg.workers, 9);
        assert_eq!(cfg.results_dir, PathBuf::from("out"));
        assert_eq!(cfg.task_timeout, Some(Duration::from_secs(5)));
        assert_eq!(cfg.quiet, 2);
        assert_eq!(cli.settings, PathBuf::from(DEFAULT_SETTINGS_FILE));
    }

    #[test]
    fn estimate_takes_an_optional_region() {
        let cli = CommandLine::parse_from(["expandr", "est", "--region", "100"]);
        assert!(matches!(cli.command, Commands::Estimate { region: Some(ref r) } if r == "100"));
    }
}
