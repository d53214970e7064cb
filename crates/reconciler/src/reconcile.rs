use std::sync::Arc;

use serde::Serialize;
use tagsync_catalog_client::{
    list_all_labels, list_all_resources_for_label, CatalogClient, CatalogOperation,
};
use tagsync_core_types::{ChangeAction, ChangeNotification, LabelId, LabelMap};
use tracing::{info, warn};

use crate::errors::SyncError;
use crate::metrics;
use crate::propagate::AssociationPropagator;
use crate::reader::TagCatalogReader;
use crate::report::{FailureRecord, LookupMissRecord};

/// Decision taken for one notification against the current label set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    NoOp,
    Create {
        key: String,
        value: String,
    },
    /// Replaces the value of the label registered as `(key, replaces)`.
    Update {
        key: String,
        value: String,
        replaces: Option<String>,
    },
    Delete {
        key: String,
        value: String,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::NoOp => "noop",
            Action::Create { .. } => "create",
            Action::Update { .. } => "update",
            Action::Delete { .. } => "delete",
        }
    }
}

/// Pure decision step.
///
/// * key unknown and Insert/Modify: create.
/// * value already registered under the key and Insert/Modify: nothing to do.
/// * new value under a known key: Insert creates a sibling label, Modify
///   replaces a registered value (the old image's value, or the sole value
///   under the key).
/// * Remove of a registered value: delete; anything else is a no-op.
pub fn decide(notification: &ChangeNotification, current: &LabelMap) -> Action {
    let key = notification.key.clone();
    let value = notification.value.clone();
    let registered = current.get(&notification.key);

    if !notification.action.is_upsert() {
        return match registered {
            Some(values) if values.contains(&notification.value) => Action::Delete { key, value },
            _ => Action::NoOp,
        };
    }

    match registered {
        None => Action::Create { key, value },
        Some(values) if values.contains(&notification.value) => Action::NoOp,
        Some(_) if notification.action == ChangeAction::Insert => Action::Create { key, value },
        Some(values) => {
            let replaces = match &notification.previous_value {
                Some(previous) => Some(previous.clone()),
                None if values.len() == 1 => values.iter().next().cloned(),
                None => None,
            };
            Action::Update {
                key,
                value,
                replaces,
            }
        }
    }
}

/// What executing one action did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassOutcome {
    pub action: Action,
    pub label: Option<LabelId>,
    pub failures: Vec<FailureRecord>,
    pub lookup_miss: Option<LookupMissRecord>,
}

impl PassOutcome {
    fn new(action: Action) -> Self {
        Self {
            action,
            label: None,
            failures: Vec::new(),
            lookup_miss: None,
        }
    }

    fn fail(&mut self, target: impl Into<String>, operation: CatalogOperation, message: String) {
        metrics::record_item_failure(operation.as_str());
        self.failures
            .push(FailureRecord::new(target, operation, message));
    }

    fn miss(&mut self, key: &str, value: &str, operation: CatalogOperation, reason: &str) {
        warn!(key, value, %operation, reason, "label lookup miss");
        metrics::record_lookup_miss(operation.as_str());
        self.lookup_miss = Some(LookupMissRecord {
            key: key.to_string(),
            value: value.to_string(),
            operation,
            reason: reason.to_string(),
        });
    }
}

/// Applies decided actions to the catalog.
#[derive(Clone)]
pub struct Reconciler {
    client: Arc<dyn CatalogClient>,
    reader: TagCatalogReader,
    propagator: AssociationPropagator,
}

impl Reconciler {
    pub fn new(client: Arc<dyn CatalogClient>, concurrency: usize) -> Self {
        Self {
            reader: TagCatalogReader::new(Arc::clone(&client)),
            propagator: AssociationPropagator::new(Arc::clone(&client), concurrency),
            client,
        }
    }

    pub fn reader(&self) -> &TagCatalogReader {
        &self.reader
    }

    pub fn propagator(&self) -> &AssociationPropagator {
        &self.propagator
    }

    /// Reads the current label set, decides and executes.
    pub async fn reconcile(
        &self,
        notification: &ChangeNotification,
    ) -> Result<PassOutcome, SyncError> {
        let current = self.reader.current_labels().await?;
        let action = decide(notification, &current);
        info!(%notification, action = action.name(), "reconciling");
        self.execute(action).await
    }

    pub async fn execute(&self, action: Action) -> Result<PassOutcome, SyncError> {
        match action.clone() {
            Action::NoOp => Ok(PassOutcome::new(action)),
            Action::Create { key, value } => self.create(action, &key, &value).await,
            Action::Update {
                key,
                value,
                replaces,
            } => {
                self.update(action, &key, &value, replaces.as_deref())
                    .await
            }
            Action::Delete { key, value } => self.delete(action, &key, &value).await,
        }
    }

    async fn create(
        &self,
        action: Action,
        key: &str,
        value: &str,
    ) -> Result<PassOutcome, SyncError> {
        // Containers are listed before anything is written so a read failure
        // aborts without leaving an unpropagated label behind.
        let containers = self.propagator.containers().await?;
        let mut outcome = PassOutcome::new(action);

        let label = match self.client.create_label(key, value).await {
            Ok(label) => label,
            Err(err) if err.is_duplicate() => {
                self.settle_duplicate(&mut outcome, key, value).await;
                return Ok(outcome);
            }
            Err(err) => {
                warn!(key, value, error = %err, "label create failed");
                outcome.fail(
                    format!("{key}={value}"),
                    CatalogOperation::CreateLabel,
                    err.to_string(),
                );
                return Ok(outcome);
            }
        };
        info!(key, value, %label, "label created");

        let summary = self.propagator.push(&label, &containers).await;
        outcome.failures.extend(summary.failures);
        outcome.label = Some(label);
        Ok(outcome)
    }

    /// The pair already exists. An active label means another pass created
    /// it; an inactive one cannot be created or propagated and is reported.
    async fn settle_duplicate(&self, outcome: &mut PassOutcome, key: &str, value: &str) {
        let target = format!("{key}={value}");
        match list_all_labels(self.client.as_ref(), false).await {
            Ok(labels) => {
                let existing: Vec<_> = labels
                    .iter()
                    .filter(|label| label.matches(key, value))
                    .collect();
                if existing.iter().any(|label| label.active) {
                    info!(key, value, "label registered concurrently; skipping");
                    outcome.action = Action::NoOp;
                } else {
                    warn!(key, value, "label exists but is inactive");
                    outcome.label = existing.first().map(|label| label.id.clone());
                    outcome.fail(
                        target,
                        CatalogOperation::CreateLabel,
                        "label exists but is inactive".to_string(),
                    );
                }
            }
            Err(err) => {
                warn!(key, value, error = %err, "re-checking duplicate label failed");
                outcome.fail(target, CatalogOperation::ListLabels, err.to_string());
            }
        }
    }

    async fn update(
        &self,
        action: Action,
        key: &str,
        value: &str,
        replaces: Option<&str>,
    ) -> Result<PassOutcome, SyncError> {
        let mut outcome = PassOutcome::new(action);
        let Some(previous) = replaces else {
            outcome.miss(
                key,
                value,
                CatalogOperation::UpdateLabel,
                "key maps to several values and no previous value was given",
            );
            return Ok(outcome);
        };
        let Some(target) = self.reader.resolve(key, previous).await? else {
            outcome.miss(
                key,
                previous,
                CatalogOperation::UpdateLabel,
                "no active label for the value being replaced",
            );
            return Ok(outcome);
        };

        match self.client.update_label(&target.id, value).await {
            Ok(()) => info!(key, from = previous, to = value, label = %target.id, "label updated"),
            Err(err) => {
                warn!(key, value, label = %target.id, error = %err, "label update failed");
                outcome.fail(
                    target.id.to_string(),
                    CatalogOperation::UpdateLabel,
                    err.to_string(),
                );
            }
        }
        outcome.label = Some(target.id);
        Ok(outcome)
    }

    async fn delete(
        &self,
        action: Action,
        key: &str,
        value: &str,
    ) -> Result<PassOutcome, SyncError> {
        let mut outcome = PassOutcome::new(action);
        let Some(target) = self.reader.resolve(key, value).await? else {
            outcome.miss(
                key,
                value,
                CatalogOperation::DeleteLabel,
                "no active label for key and value",
            );
            return Ok(outcome);
        };
        let label = target.id;
        outcome.label = Some(label.clone());

        let resources = match list_all_resources_for_label(self.client.as_ref(), &label).await {
            Ok(resources) => resources,
            Err(err) => {
                warn!(%label, error = %err, "listing associated resources failed");
                outcome.fail(
                    label.to_string(),
                    CatalogOperation::ListResources,
                    err.to_string(),
                );
                return Ok(outcome);
            }
        };

        let summary = self.propagator.pull(&label, &resources).await;
        if !summary.is_complete() {
            let remaining = summary.failures.len();
            outcome.failures.extend(summary.failures);
            outcome.fail(
                label.to_string(),
                CatalogOperation::DeleteLabel,
                format!("{remaining} associations remain; label kept"),
            );
            return Ok(outcome);
        }

        match self.client.delete_label(&label).await {
            Ok(()) => info!(key, value, %label, "label deleted"),
            Err(err) if err.is_not_found() => info!(%label, "label already deleted"),
            Err(err) => {
                warn!(%label, error = %err, "label delete failed");
                outcome.fail(
                    label.to_string(),
                    CatalogOperation::DeleteLabel,
                    err.to_string(),
                );
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(entries: &[(&str, &[&str])]) -> LabelMap {
        entries
            .iter()
            .map(|(key, values)| {
                (
                    key.to_string(),
                    values.iter().map(|value| value.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn unknown_key_creates() {
        let current = labels(&[("env", &["prod"])]);
        for action in [ChangeAction::Insert, ChangeAction::Modify] {
            let note = ChangeNotification::new("team", "infra", action);
            assert_eq!(
                decide(&note, &current),
                Action::Create {
                    key: "team".into(),
                    value: "infra".into()
                }
            );
        }
    }

    #[test]
    fn registered_value_is_noop() {
        let current = labels(&[("env", &["prod", "stage"])]);
        for action in [ChangeAction::Insert, ChangeAction::Modify] {
            let note = ChangeNotification::new("env", "stage", action);
            assert_eq!(decide(&note, &current), Action::NoOp);
        }
    }

    #[test]
    fn insert_of_new_value_under_known_key_creates_sibling() {
        let current = labels(&[("env", &["prod"])]);
        let note = ChangeNotification::new("env", "stage", ChangeAction::Insert);
        assert_eq!(
            decide(&note, &current),
            Action::Create {
                key: "env".into(),
                value: "stage".into()
            }
        );
    }

    #[test]
    fn modify_resolves_replaced_value() {
        let single = labels(&[("env", &["prod"])]);
        let note = ChangeNotification::new("env", "production", ChangeAction::Modify);
        assert_eq!(
            decide(&note, &single),
            Action::Update {
                key: "env".into(),
                value: "production".into(),
                replaces: Some("prod".into()),
            }
        );

        let several = labels(&[("env", &["prod", "stage"])]);
        assert_eq!(
            decide(&note, &several),
            Action::Update {
                key: "env".into(),
                value: "production".into(),
                replaces: None,
            }
        );

        let with_old = note.clone().with_previous_value("stage");
        assert_eq!(
            decide(&with_old, &several),
            Action::Update {
                key: "env".into(),
                value: "production".into(),
                replaces: Some("stage".into()),
            }
        );
    }

    #[test]
    fn remove_only_deletes_registered_values() {
        let current = labels(&[("team", &["infra"])]);
        let hit = ChangeNotification::new("team", "infra", ChangeAction::Remove);
        assert_eq!(
            decide(&hit, &current),
            Action::Delete {
                key: "team".into(),
                value: "infra".into()
            }
        );
        let other_value = ChangeNotification::new("team", "data", ChangeAction::Remove);
        assert_eq!(decide(&other_value, &current), Action::NoOp);
        let other_key = ChangeNotification::new("env", "prod", ChangeAction::Remove);
        assert_eq!(decide(&other_key, &current), Action::NoOp);
    }
}
