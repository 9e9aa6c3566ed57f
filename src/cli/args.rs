//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Live-reload runner for Lua scripts
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: live.toml)
    #[arg(short = 'C', long, global = true, default_value = lucy_live::config::CONFIG_FILE, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Print debug messages
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Evaluate a script and keep reloading it on change
    #[command(visible_alias = "r")]
    Run {
        /// Script to run (relative to the current directory)
        #[arg(value_hint = clap::ValueHint::FilePath)]
        script: PathBuf,

        /// Extra directories to watch
        #[arg(short, long, value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
        watch: Vec<PathBuf>,
    },

    /// Evaluate a script once and report the result
    #[command(visible_alias = "c")]
    Check {
        /// Script to evaluate
        #[arg(value_hint = clap::ValueHint::FilePath)]
        script: PathBuf,
    },
}
