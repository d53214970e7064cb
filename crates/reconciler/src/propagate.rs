use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tagsync_catalog_client::{list_all_containers, CatalogClient, CatalogError, CatalogOperation};
use tagsync_core_types::{ContainerId, LabelId};
use tracing::{debug, info, warn};

use crate::errors::SyncError;
use crate::metrics;
use crate::report::FailureRecord;

/// Outcome of an associate/disassociate fan-out.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PropagationSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<FailureRecord>,
}

impl PropagationSummary {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Pushes a label onto every container, or pulls it off a set of resources.
///
/// Calls fan out with bounded concurrency. Individual failures are collected
/// and never stop the remaining calls.
#[derive(Clone)]
pub struct AssociationPropagator {
    client: Arc<dyn CatalogClient>,
    concurrency: usize,
}

impl AssociationPropagator {
    pub fn new(client: Arc<dyn CatalogClient>, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
        }
    }

    /// Every container currently known to the catalog.
    pub async fn containers(&self) -> Result<Vec<ContainerId>, SyncError> {
        let containers = list_all_containers(self.client.as_ref())
            .await
            .map_err(|err| SyncError::catalog_read(CatalogOperation::ListContainers, err))?;
        Ok(containers.into_iter().map(|container| container.id).collect())
    }

    pub async fn push_to_all(&self, label: &LabelId) -> Result<PropagationSummary, SyncError> {
        let containers = self.containers().await?;
        Ok(self.push(label, &containers).await)
    }

    pub async fn push(&self, label: &LabelId, containers: &[ContainerId]) -> PropagationSummary {
        info!(%label, containers = containers.len(), "associating label");
        self.fan_out(label, containers, CatalogOperation::Associate)
            .await
    }

    pub async fn pull(&self, label: &LabelId, resources: &[ContainerId]) -> PropagationSummary {
        info!(%label, resources = resources.len(), "disassociating label");
        self.fan_out(label, resources, CatalogOperation::Disassociate)
            .await
    }

    /// Associates one label with one resource. An existing association counts as success.
    pub async fn associate_one(
        &self,
        label: &LabelId,
        resource: &ContainerId,
    ) -> Result<(), CatalogError> {
        match self.client.associate(label, resource).await {
            Err(err) if err.is_duplicate() => {
                debug!(%label, %resource, "association already present");
                Ok(())
            }
            other => other,
        }
    }

    /// Removes one association. A missing association counts as success.
    pub async fn disassociate_one(
        &self,
        label: &LabelId,
        resource: &ContainerId,
    ) -> Result<(), CatalogError> {
        match self.client.disassociate(label, resource).await {
            Err(err) if err.is_not_found() => {
                debug!(%label, %resource, "association already absent");
                Ok(())
            }
            other => other,
        }
    }

    async fn fan_out(
        &self,
        label: &LabelId,
        resources: &[ContainerId],
        operation: CatalogOperation,
    ) -> PropagationSummary {
        let results: Vec<(ContainerId, Result<(), CatalogError>)> =
            stream::iter(resources.iter().cloned())
                .map(|resource| async move {
                    let result = match operation {
                        CatalogOperation::Disassociate => {
                            self.disassociate_one(label, &resource).await
                        }
                        _ => self.associate_one(label, &resource).await,
                    };
                    (resource, result)
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

        let mut summary = PropagationSummary {
            attempted: results.len(),
            ..PropagationSummary::default()
        };
        for (resource, result) in results {
            match result {
                Ok(()) => summary.succeeded += 1,
                Err(err) => {
                    warn!(%label, %resource, %operation, error = %err, "association call failed");
                    metrics::record_item_failure(operation.as_str());
                    summary
                        .failures
                        .push(FailureRecord::new(resource.0, operation, err.to_string()));
                }
            }
        }
        summary.failures.sort_by(|a, b| a.target.cmp(&b.target));
        summary
    }
}
