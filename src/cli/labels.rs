use std::process::ExitCode;

use anyhow::Result;

use super::context::CliContext;
use super::io::print_json;

pub async fn cmd_labels(ctx: &CliContext) -> Result<ExitCode> {
    let labels = ctx.handler().reconciler().reader().current_labels().await?;
    print_json(&labels)?;
    Ok(ExitCode::SUCCESS)
}
