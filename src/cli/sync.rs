use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use tagsync_reconciler::PassStatus;

use super::context::CliContext;
use super::io::{print_json, read_event};

#[derive(Args, Clone, Debug)]
pub struct SyncArgs {
    /// Change batch JSON (`-` reads stdin)
    #[arg(long, value_name = "FILE")]
    pub event: PathBuf,
}

pub async fn cmd_sync(args: SyncArgs, ctx: &CliContext) -> Result<ExitCode> {
    let raw = read_event(&args.event).await?;
    let report = ctx
        .handler()
        .handle_raw(&raw)
        .await
        .context("handling change batch")?;
    print_json(&report)?;

    Ok(match report.status {
        PassStatus::Completed => ExitCode::SUCCESS,
        PassStatus::Partial => ExitCode::from(2),
        PassStatus::Aborted => ExitCode::from(1),
    })
}
