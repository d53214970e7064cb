use tagsync_catalog_client::{CatalogError, CatalogOperation};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed batch: {0}")]
    Malformed(String),
    #[error("record {index}: {message}")]
    Record { index: usize, message: String },
    #[error("record {index}: unknown action {action:?}")]
    UnknownAction { index: usize, action: String },
}

/// Errors that abort a whole pass. Per-item failures never surface here.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("catalog read failed during {operation}: {source}")]
    CatalogRead {
        operation: CatalogOperation,
        #[source]
        source: CatalogError,
    },
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl SyncError {
    pub fn catalog_read(operation: CatalogOperation, source: CatalogError) -> Self {
        SyncError::CatalogRead { operation, source }
    }
}
