pub mod api;
pub mod errors;
pub mod http;
pub mod memory;
pub mod paginate;

pub use api::{CatalogCall, CatalogClient, CatalogOperation, Page};
pub use errors::CatalogError;
pub use http::{HttpCatalogClient, HttpCatalogConfig};
pub use memory::InMemoryCatalog;
pub use paginate::{drain, list_all_containers, list_all_labels, list_all_resources_for_label};
