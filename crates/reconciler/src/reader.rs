use std::sync::Arc;

use tagsync_catalog_client::{list_all_labels, CatalogClient, CatalogOperation};
use tagsync_core_types::{group_active, Label, LabelMap};
use tracing::{debug, warn};

use crate::errors::SyncError;

/// Reads the registered label set. Every listing is drained to the last page;
/// a failure on any page fails the read.
#[derive(Clone)]
pub struct TagCatalogReader {
    client: Arc<dyn CatalogClient>,
}

impl TagCatalogReader {
    pub fn new(client: Arc<dyn CatalogClient>) -> Self {
        Self { client }
    }

    /// Active label values grouped by key.
    pub async fn current_labels(&self) -> Result<LabelMap, SyncError> {
        let labels = list_all_labels(self.client.as_ref(), false)
            .await
            .map_err(|err| SyncError::catalog_read(CatalogOperation::ListLabels, err))?;
        let map = group_active(&labels);
        if map.is_empty() {
            warn!(listed = labels.len(), "no active labels registered in catalog");
        } else {
            debug!(keys = map.len(), listed = labels.len(), "read label catalog");
        }
        Ok(map)
    }

    /// Active labels sorted by `(key, value, id)`.
    ///
    /// The catalog does not promise a stable listing order, so the sort is
    /// what makes pair lookups deterministic.
    pub async fn active_labels(&self) -> Result<Vec<Label>, SyncError> {
        let mut labels = list_all_labels(self.client.as_ref(), true)
            .await
            .map_err(|err| SyncError::catalog_read(CatalogOperation::ListLabels, err))?;
        labels.retain(|label| label.active);
        labels.sort_by(|a, b| {
            (a.key.as_str(), a.value.as_str(), a.id.as_str()).cmp(&(
                b.key.as_str(),
                b.value.as_str(),
                b.id.as_str(),
            ))
        });
        Ok(labels)
    }

    /// Resolves the active label registered for `(key, value)`.
    pub async fn resolve(&self, key: &str, value: &str) -> Result<Option<Label>, SyncError> {
        Ok(self
            .active_labels()
            .await?
            .into_iter()
            .find(|label| label.matches(key, value)))
    }
}
