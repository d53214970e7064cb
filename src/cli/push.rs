use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use tagsync_core_types::LabelId;

use super::context::CliContext;
use super::io::print_json;

#[derive(Args, Clone, Debug)]
pub struct PushArgs {
    /// Label id to associate with every container
    #[arg(long, value_name = "ID")]
    pub label: String,
}

pub async fn cmd_push(args: PushArgs, ctx: &CliContext) -> Result<ExitCode> {
    let label = LabelId(args.label);
    let summary = ctx
        .handler()
        .reconciler()
        .propagator()
        .push_to_all(&label)
        .await?;
    print_json(&summary)?;
    Ok(if summary.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}
