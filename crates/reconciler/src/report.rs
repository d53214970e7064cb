use serde::Serialize;
use tagsync_catalog_client::CatalogOperation;
use tagsync_core_types::{ChangeNotification, ContainerId, LabelId};

use crate::reconcile::Action;

/// A single failed catalog call, recorded instead of raised.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    /// Label or resource id, or `key=value` when no id exists yet.
    pub target: String,
    pub operation: CatalogOperation,
    pub message: String,
}

impl FailureRecord {
    pub fn new(
        target: impl Into<String>,
        operation: CatalogOperation,
        message: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            operation,
            message: message.into(),
        }
    }
}

/// A label id that could not be resolved from `(key, value)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LookupMissRecord {
    pub key: String,
    pub value: String,
    pub operation: CatalogOperation,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionRecord {
    pub notification: ChangeNotification,
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<LabelId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassStatus {
    Completed,
    Partial,
    Aborted,
}

/// Result of handling one notification batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub status: PassStatus,
    pub processed: usize,
    pub actions: Vec<ActionRecord>,
    pub failures: Vec<FailureRecord>,
    pub lookup_misses: Vec<LookupMissRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncReport {
    pub(crate) fn empty() -> Self {
        Self {
            status: PassStatus::Completed,
            processed: 0,
            actions: Vec::new(),
            failures: Vec::new(),
            lookup_misses: Vec::new(),
            error: None,
        }
    }

    pub(crate) fn finish(mut self) -> Self {
        if self.status != PassStatus::Aborted {
            self.status = if self.failures.is_empty() {
                PassStatus::Completed
            } else {
                PassStatus::Partial
            };
        }
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapStatus {
    Completed,
    Partial,
    NoLabels,
}

/// Result of attaching every active label to one new container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub container: ContainerId,
    pub status: BootstrapStatus,
    pub associated: Vec<LabelId>,
    pub failures: Vec<FailureRecord>,
}

impl BootstrapReport {
    pub fn succeeded(&self) -> bool {
        self.status == BootstrapStatus::Completed
    }
}
