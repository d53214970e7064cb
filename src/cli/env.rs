use clap::Parser;
use std::path::PathBuf;

use super::commands::Commands;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level (overrides the configuration file)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long)]
    pub debug: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Run against an in-memory catalog seeded from this YAML fixture
    #[arg(long, value_name = "FILE")]
    pub fixture: Option<PathBuf>,

    /// Print Prometheus metrics to stderr when the command finishes
    #[arg(long)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}
