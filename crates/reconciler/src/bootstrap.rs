use tagsync_catalog_client::CatalogOperation;
use tagsync_core_types::ContainerId;
use tracing::{info, warn};

use crate::errors::SyncError;
use crate::metrics;
use crate::propagate::AssociationPropagator;
use crate::reader::TagCatalogReader;
use crate::reconcile::Reconciler;
use crate::report::{BootstrapReport, BootstrapStatus, FailureRecord};

/// Attaches the already reconciled label set to a newly created container.
#[derive(Clone)]
pub struct ContainerBootstrap {
    reader: TagCatalogReader,
    propagator: AssociationPropagator,
}

impl ContainerBootstrap {
    pub fn new(reader: TagCatalogReader, propagator: AssociationPropagator) -> Self {
        Self { reader, propagator }
    }

    pub fn from_reconciler(reconciler: &Reconciler) -> Self {
        Self::new(reconciler.reader().clone(), reconciler.propagator().clone())
    }

    pub async fn attach_all(&self, container: &ContainerId) -> Result<BootstrapReport, SyncError> {
        let labels = self.reader.active_labels().await?;
        let mut report = BootstrapReport {
            container: container.clone(),
            status: BootstrapStatus::Completed,
            associated: Vec::new(),
            failures: Vec::new(),
        };
        if labels.is_empty() {
            warn!(%container, "no active labels to associate");
            report.status = BootstrapStatus::NoLabels;
            return Ok(report);
        }

        for label in labels {
            match self.propagator.associate_one(&label.id, container).await {
                Ok(()) => {
                    info!(%container, %label, "label associated");
                    report.associated.push(label.id);
                }
                Err(err) => {
                    warn!(%container, %label, error = %err, "label association failed");
                    metrics::record_item_failure(CatalogOperation::Associate.as_str());
                    report.failures.push(FailureRecord::new(
                        label.id.0,
                        CatalogOperation::Associate,
                        err.to_string(),
                    ));
                }
            }
        }
        if !report.failures.is_empty() {
            report.status = BootstrapStatus::Partial;
        }
        Ok(report)
    }
}
