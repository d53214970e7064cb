use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("resource not found: {0}")]
    ResourceNotFound(String),
    #[error("duplicate resource: {0}")]
    DuplicateResource(String),
    #[error("resource in use: {0}")]
    ResourceInUse(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("rejected by catalog ({kind}): {message}")]
    Rejected { kind: String, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("pagination error: {0}")]
    Pagination(String),
}

impl CatalogError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, CatalogError::DuplicateResource(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::ResourceNotFound(_))
    }

    /// Maps the `__type` of a catalog error reply onto a variant.
    pub fn from_service(kind: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let short = kind.rsplit('#').next().unwrap_or(kind);
        match short {
            "DuplicateResourceException" => CatalogError::DuplicateResource(message),
            "ResourceNotFoundException" => CatalogError::ResourceNotFound(message),
            "ResourceInUseException" => CatalogError::ResourceInUse(message),
            "InvalidParametersException" => CatalogError::InvalidRequest(message),
            other => CatalogError::Rejected {
                kind: other.to_string(),
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_kinds_map_to_variants() {
        assert!(CatalogError::from_service(
            "com.amazonaws.servicecatalog#DuplicateResourceException",
            "exists"
        )
        .is_duplicate());
        assert!(CatalogError::from_service("ResourceNotFoundException", "gone").is_not_found());
        assert_eq!(
            CatalogError::from_service("TagOptionNotMigratedException", "legacy"),
            CatalogError::Rejected {
                kind: "TagOptionNotMigratedException".into(),
                message: "legacy".into(),
            }
        );
    }
}
