pub mod bootstrap;
pub mod decoder;
pub mod errors;
pub mod handler;
pub mod locks;
pub mod metrics;
pub mod propagate;
pub mod reader;
pub mod reconcile;
pub mod report;

pub use bootstrap::ContainerBootstrap;
pub use decoder::{decode_batch, decode_container_created, ContainerCreated, DecodedBatch};
pub use errors::{DecodeError, SyncError};
pub use handler::{SyncHandler, SyncOptions};
pub use locks::{KeyGuard, KeyLocks};
pub use propagate::{AssociationPropagator, PropagationSummary};
pub use reader::TagCatalogReader;
pub use reconcile::{decide, Action, PassOutcome, Reconciler};
pub use report::{
    ActionRecord, BootstrapReport, BootstrapStatus, FailureRecord, LookupMissRecord, PassStatus,
    SyncReport,
};
