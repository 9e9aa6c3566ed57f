//! lucy-live - live-reload runner for Lua scripts.

mod cli;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use lucy_live::{LiveConfig, logger};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = LiveConfig::load_or_default(&cli.config)
        .with_context(|| format!("failed to load `{}`", cli.config.display()))?;
    logger::set_verbose(cli.verbose || config.log.verbose);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    match &cli.command {
        Commands::Run { script, watch } => {
            runtime.block_on(cli::run::run_script(config, script, watch))
        }
        Commands::Check { script } => runtime.block_on(cli::check::check_script(config, script)),
    }
}
