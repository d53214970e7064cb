use clap::Subcommand;

use super::bootstrap::BootstrapArgs;
use super::push::PushArgs;
use super::sync::SyncArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Reconcile a batch of change notifications against the catalog
    Sync(SyncArgs),
    /// Attach every active label to a newly created container
    Bootstrap(BootstrapArgs),
    /// Print the active label set grouped by key
    Labels,
    /// Re-associate one label with every container
    Push(PushArgs),
}
