use std::process::ExitCode;

use anyhow::Result;

mod cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    cli::app::run().await
}
