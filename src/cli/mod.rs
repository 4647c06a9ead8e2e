//! CLI interface for pairs-screener
//!
//! Provides subcommands for:
//! - `run`: select pairs, backtest each, write result files
//! - `select`: pair selection only
//! - `config`: show the effective configuration

mod run;
mod select;

pub use run::RunArgs;
pub use select::SelectArgs;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "pairs-screener")]
#[command(about = "Distance-method pair selection and mean-reversion backtesting")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Select pairs, backtest them and write the result files
    Run(RunArgs),
    /// Select pairs and print them
    Select(SelectArgs),
    /// Show configuration
    Config,
}

/// Console output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}
