use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Args};
use tagsync_core_types::ContainerId;
use tagsync_reconciler::decode_container_created;
use tracing::info;

use super::context::CliContext;
use super::io::{print_json, read_event};

#[derive(Args, Clone, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["event", "container"])))]
pub struct BootstrapArgs {
    /// Container-creation event JSON (`-` reads stdin)
    #[arg(long, value_name = "FILE")]
    pub event: Option<PathBuf>,

    /// Container id to bootstrap directly
    #[arg(long, value_name = "ID")]
    pub container: Option<String>,
}

pub async fn cmd_bootstrap(args: BootstrapArgs, ctx: &CliContext) -> Result<ExitCode> {
    let container = match (args.container, args.event) {
        (Some(id), _) => ContainerId(id),
        (None, Some(path)) => {
            let raw = read_event(&path).await?;
            let created =
                decode_container_created(&raw).context("decoding container-created event")?;
            info!(
                container = %created.container,
                region = created.region.as_deref().unwrap_or("unknown"),
                "container created"
            );
            created.container
        }
        (None, None) => bail!("either --event or --container is required"),
    };

    let report = ctx.bootstrap().attach_all(&container).await?;
    print_json(&report)?;
    Ok(if report.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}
