mod commands;
mod terminal;

use anyhow::Context;
use commands::{CommandLine, Commands, estimate, expand};
use expandr_common::config::Settings;
use terminal::{logging, print};

fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.quiet);
    print::banner(commands.quiet);

    let settings = Settings::load(&commands.settings)
        .with_context(|| format!("Could not load {}", commands.settings.display()))?;
    let mut cfg = settings.runtime_config();
    commands.apply_overrides(&mut cfg);
    cfg.validate()?;

    let result = match commands.command {
        Commands::Expand => {
            print::header("expanding regions", cfg.quiet);
            expand::expand(&settings, &cfg)
        }
        Commands::Estimate { ref region } => {
            print::header("estimating work", cfg.quiet);
            estimate::estimate(&settings, region.as_deref(), &cfg)
        }
    };

    if cfg.quiet == 0 {
        print::end_of_program();
    }
    result
}
