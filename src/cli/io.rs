use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::fs;
use tokio::io::{self, AsyncReadExt};

/// Reads a whole event document from a file, or stdin when the path is `-`.
pub async fn read_event(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .await
            .context("reading event from stdin")?;
        return Ok(buffer);
    }
    fs::read_to_string(path)
        .await
        .with_context(|| format!("reading event {}", path.display()))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{rendered}");
    Ok(())
}
