use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tagsync_cli::{load_config, LoadedConfig};
use tracing::{error, info};

use super::bootstrap::cmd_bootstrap;
use super::commands::Commands;
use super::context::CliContext;
use super::env::CliArgs;
use super::labels::cmd_labels;
use super::push::cmd_push;
use super::runtime::{init_logging, metrics_registry, render_metrics};
use super::sync::cmd_sync;

pub async fn run() -> Result<ExitCode> {
    let cli = CliArgs::parse();

    let LoadedConfig { config, path } = load_config(cli.config.as_deref())?;
    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    init_logging(&level, cli.debug, cli.json_logs)?;
    let registry = metrics_registry();

    info!("Starting tagsync v{}", env!("CARGO_PKG_VERSION"));
    match &path {
        Some(path) => info!(path = %path.display(), "configuration loaded"),
        None => info!("using default configuration"),
    }

    let ctx = CliContext::new(config, cli.fixture.as_deref())?;
    let result = match cli.command.clone() {
        Commands::Sync(args) => cmd_sync(args, &ctx).await,
        Commands::Bootstrap(args) => cmd_bootstrap(args, &ctx).await,
        Commands::Labels => cmd_labels(&ctx).await,
        Commands::Push(args) => cmd_push(args, &ctx).await,
    };

    if cli.metrics {
        eprintln!("{}", render_metrics(&registry)?);
    }

    match result {
        Ok(code) => {
            info!(region = %ctx.config().catalog.region, "Command completed");
            Ok(code)
        }
        Err(err) => {
            error!("Command failed: {:#}", err);
            Err(err)
        }
    }
}
