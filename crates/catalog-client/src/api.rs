use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tagsync_core_types::{Container, ContainerId, Label, LabelId};

use crate::errors::CatalogError;

/// One page of a paginated listing. `next` is the token for the following page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

/// Capability surface of the external catalog service.
///
/// Resources handed to `associate`/`disassociate` are containers in practice,
/// but `list_resources_for_label` may also report other catalog resources that
/// carry the label.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn list_labels(
        &self,
        active_only: bool,
        page_token: Option<String>,
    ) -> Result<Page<Label>, CatalogError>;

    async fn list_containers(
        &self,
        page_token: Option<String>,
    ) -> Result<Page<Container>, CatalogError>;

    async fn list_resources_for_label(
        &self,
        label: &LabelId,
        page_token: Option<String>,
    ) -> Result<Page<ContainerId>, CatalogError>;

    async fn create_label(&self, key: &str, value: &str) -> Result<LabelId, CatalogError>;

    /// Replaces the value of an existing label, keeping its id.
    async fn update_label(&self, label: &LabelId, value: &str) -> Result<(), CatalogError>;

    async fn delete_label(&self, label: &LabelId) -> Result<(), CatalogError>;

    async fn associate(&self, label: &LabelId, resource: &ContainerId)
        -> Result<(), CatalogError>;

    async fn disassociate(
        &self,
        label: &LabelId,
        resource: &ContainerId,
    ) -> Result<(), CatalogError>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogOperation {
    ListLabels,
    ListContainers,
    ListResources,
    CreateLabel,
    UpdateLabel,
    DeleteLabel,
    Associate,
    Disassociate,
}

impl CatalogOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            CatalogOperation::ListLabels => "list_labels",
            CatalogOperation::ListContainers => "list_containers",
            CatalogOperation::ListResources => "list_resources",
            CatalogOperation::CreateLabel => "create_label",
            CatalogOperation::UpdateLabel => "update_label",
            CatalogOperation::DeleteLabel => "delete_label",
            CatalogOperation::Associate => "associate",
            CatalogOperation::Disassociate => "disassociate",
        }
    }

    pub fn is_mutation(self) -> bool {
        !matches!(
            self,
            CatalogOperation::ListLabels
                | CatalogOperation::ListContainers
                | CatalogOperation::ListResources
        )
    }
}

impl fmt::Display for CatalogOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mutating call observed by a client double.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CatalogCall {
    pub operation: CatalogOperation,
    pub target: String,
}
