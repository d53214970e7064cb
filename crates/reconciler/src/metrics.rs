use lazy_static::lazy_static;
use prometheus::{core::Collector, opts, IntCounter, IntCounterVec, Registry};
use tracing::error;

lazy_static! {
    static ref NOTIFICATIONS_TOTAL: IntCounter = IntCounter::new(
        "tagsync_notifications_total",
        "Change notifications reconciled"
    )
    .unwrap();
    static ref ACTIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        opts!("tagsync_actions_total", "Reconciliation decisions grouped by action"),
        &["action"]
    )
    .unwrap();
    static ref ITEM_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        opts!(
            "tagsync_item_failures_total",
            "Per-item catalog call failures grouped by operation"
        ),
        &["operation"]
    )
    .unwrap();
    static ref LOOKUP_MISS_TOTAL: IntCounterVec = IntCounterVec::new(
        opts!(
            "tagsync_lookup_miss_total",
            "Label id lookups that found no match grouped by operation"
        ),
        &["operation"]
    )
    .unwrap();
    static ref PASSES_ABORTED_TOTAL: IntCounter = IntCounter::new(
        "tagsync_passes_aborted_total",
        "Batches aborted on a catalog read failure"
    )
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register tagsync metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, NOTIFICATIONS_TOTAL.clone());
    register(registry, ACTIONS_TOTAL.clone());
    register(registry, ITEM_FAILURES_TOTAL.clone());
    register(registry, LOOKUP_MISS_TOTAL.clone());
    register(registry, PASSES_ABORTED_TOTAL.clone());
}

pub fn record_notification() {
    NOTIFICATIONS_TOTAL.inc();
}

pub fn record_action(action: &str) {
    ACTIONS_TOTAL.with_label_values(&[action]).inc();
}

pub fn record_item_failure(operation: &str) {
    ITEM_FAILURES_TOTAL.with_label_values(&[operation]).inc();
}

pub fn record_lookup_miss(operation: &str) {
    LOOKUP_MISS_TOTAL.with_label_values(&[operation]).inc();
}

pub fn record_aborted_pass() {
    PASSES_ABORTED_TOTAL.inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registering_twice_is_harmless() {
        let registry = Registry::new();
        register_metrics(&registry);
        register_metrics(&registry);
        record_lookup_miss("delete_label");
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|family| family.get_name() == "tagsync_lookup_miss_total"));
    }
}
