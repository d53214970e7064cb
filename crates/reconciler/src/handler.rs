use std::sync::Arc;

use tagsync_catalog_client::CatalogClient;
use tagsync_core_types::ChangeNotification;
use tracing::{debug, error, info};

use crate::decoder::{decode_batch, DecodedBatch};
use crate::errors::SyncError;
use crate::locks::KeyLocks;
use crate::metrics;
use crate::reconcile::{PassOutcome, Reconciler};
use crate::report::{ActionRecord, PassStatus, SyncReport};

#[derive(Clone, Debug)]
pub struct SyncOptions {
    /// Upper bound on concurrent associate/disassociate calls.
    pub concurrency: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self { concurrency: 8 }
    }
}

/// Entry point for change batches. One instance is shared by every
/// concurrently running batch so per-key serialization holds across them.
#[derive(Clone)]
pub struct SyncHandler {
    reconciler: Reconciler,
    locks: KeyLocks,
}

impl SyncHandler {
    pub fn new(client: Arc<dyn CatalogClient>, options: SyncOptions) -> Self {
        Self {
            reconciler: Reconciler::new(client, options.concurrency),
            locks: KeyLocks::new(),
        }
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Runs one reconciliation pass while holding the lock for its key.
    pub async fn handle(
        &self,
        notification: &ChangeNotification,
    ) -> Result<PassOutcome, SyncError> {
        let _guard = self.locks.lock(&notification.key).await;
        metrics::record_notification();
        let outcome = self.reconciler.reconcile(notification).await?;
        metrics::record_action(outcome.action.name());
        Ok(outcome)
    }

    /// Decodes a raw change batch and processes it. A batch that fails to
    /// decode is rejected whole, before any catalog call.
    pub async fn handle_raw(&self, raw: &str) -> Result<SyncReport, SyncError> {
        let batch = decode_batch(raw)?;
        if batch.is_empty() {
            debug!("change batch has no records");
        } else {
            info!(records = batch.len(), "decoded change batch");
        }
        Ok(self.handle_batch(&batch).await)
    }

    /// Processes a batch in record order. Per-item failures are collected;
    /// a catalog read failure stops the batch.
    pub async fn handle_batch(&self, batch: &DecodedBatch) -> SyncReport {
        let mut report = SyncReport::empty();
        for notification in batch.notifications() {
            match self.handle(notification).await {
                Ok(outcome) => {
                    report.processed += 1;
                    report.failures.extend(outcome.failures);
                    report.lookup_misses.extend(outcome.lookup_miss);
                    report.actions.push(ActionRecord {
                        notification: notification.clone(),
                        action: outcome.action,
                        label: outcome.label,
                    });
                }
                Err(err) => {
                    error!(%notification, error = %err, "aborting batch");
                    metrics::record_aborted_pass();
                    report.status = PassStatus::Aborted;
                    report.error = Some(err.to_string());
                    break;
                }
            }
        }
        let report = report.finish();
        info!(
            status = ?report.status,
            processed = report.processed,
            total = batch.len(),
            failures = report.failures.len(),
            lookup_misses = report.lookup_misses.len(),
            "batch finished"
        );
        report
    }
}
