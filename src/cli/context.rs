use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tagsync_catalog_client::{CatalogClient, HttpCatalogClient};
use tagsync_cli::{load_fixture, TagSyncConfig};
use tagsync_reconciler::{ContainerBootstrap, SyncHandler, SyncOptions};
use tracing::info;

pub struct CliContext {
    config: TagSyncConfig,
    handler: SyncHandler,
}

impl CliContext {
    pub fn new(config: TagSyncConfig, fixture: Option<&Path>) -> Result<Self> {
        let client: Arc<dyn CatalogClient> = match fixture {
            Some(path) => {
                let fixture = load_fixture(path)?;
                info!(path = %path.display(), "using in-memory catalog fixture");
                Arc::new(fixture.into_catalog())
            }
            None => {
                let client = HttpCatalogClient::new(config.http_client_config()?)
                    .context("building catalog client")?;
                info!(endpoint = %client.endpoint(), "using catalog endpoint");
                Arc::new(client)
            }
        };
        let handler = SyncHandler::new(
            client,
            SyncOptions {
                concurrency: config.propagation.concurrency,
            },
        );
        Ok(Self { config, handler })
    }

    pub fn config(&self) -> &TagSyncConfig {
        &self.config
    }

    pub fn handler(&self) -> &SyncHandler {
        &self.handler
    }

    pub fn bootstrap(&self) -> ContainerBootstrap {
        ContainerBootstrap::from_reconciler(self.handler.reconciler())
    }
}
