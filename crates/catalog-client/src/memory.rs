use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tagsync_core_types::{Container, ContainerId, Label, LabelId};

use crate::api::{CatalogCall, CatalogClient, CatalogOperation, Page};
use crate::errors::CatalogError;

const ANY_TARGET: &str = "*";

#[derive(Default)]
struct CatalogState {
    labels: Vec<Label>,
    containers: Vec<ContainerId>,
    associations: BTreeMap<LabelId, BTreeSet<ContainerId>>,
    next_id: u64,
    faults: HashSet<(CatalogOperation, String)>,
    calls: Vec<CatalogCall>,
}

impl CatalogState {
    fn label_index(&self, id: &LabelId) -> Option<usize> {
        self.labels.iter().position(|label| &label.id == id)
    }

    fn has_active_pair(&self, key: &str, value: &str, except: Option<&LabelId>) -> bool {
        self.labels
            .iter()
            .any(|label| label.active && label.matches(key, value) && Some(&label.id) != except)
    }

    /// Logs mutating calls, then fails the call if a fault was injected for it.
    fn observe(&mut self, operation: CatalogOperation, target: &str) -> Result<(), CatalogError> {
        if operation.is_mutation() {
            self.calls.push(CatalogCall {
                operation,
                target: target.to_string(),
            });
        }
        if self.faults.contains(&(operation, target.to_string()))
            || self.faults.contains(&(operation, ANY_TARGET.to_string()))
        {
            return Err(CatalogError::Rejected {
                kind: "InjectedFault".into(),
                message: format!("{operation} failed for {target}"),
            });
        }
        Ok(())
    }
}

fn paginate<T: Clone>(
    items: &[T],
    page_size: usize,
    token: Option<String>,
) -> Result<Page<T>, CatalogError> {
    let start = match token {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| CatalogError::InvalidRequest(format!("bad page token {raw}")))?,
        None => 0,
    };
    let end = start.saturating_add(page_size).min(items.len());
    let slice = items.get(start..end).unwrap_or_default().to_vec();
    let next = (end < items.len()).then(|| end.to_string());
    Ok(Page { items: slice, next })
}

/// In-memory catalog mirroring the observable behaviour of the catalog service.
///
/// Clones share state, so a test can keep a handle for inspection while the
/// reconciler owns another.
#[derive(Clone)]
pub struct InMemoryCatalog {
    state: Arc<Mutex<CatalogState>>,
    page_size: usize,
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(CatalogState::default())),
            page_size: 20,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn add_container(&self, id: impl Into<String>) -> ContainerId {
        let id = ContainerId(id.into());
        let mut state = self.state.lock();
        if !state.containers.contains(&id) {
            state.containers.push(id.clone());
        }
        id
    }

    /// Registers a label directly, bypassing the call log.
    pub fn seed_label(&self, key: &str, value: &str) -> LabelId {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = LabelId(format!("tag-{:06}", state.next_id));
        state.labels.push(Label {
            id: id.clone(),
            key: key.to_string(),
            value: value.to_string(),
            active: true,
        });
        id
    }

    pub fn seed_association(&self, label: &LabelId, container: &ContainerId) {
        self.state
            .lock()
            .associations
            .entry(label.clone())
            .or_default()
            .insert(container.clone());
    }

    pub fn set_active(&self, label: &LabelId, active: bool) {
        let mut state = self.state.lock();
        if let Some(idx) = state.label_index(label) {
            state.labels[idx].active = active;
        }
    }

    /// Makes `operation` fail for `target` (use `"*"` for every target).
    ///
    /// Targets are label ids for update/delete/list-resources, resource ids
    /// for associate/disassociate and `key=value` for create.
    pub fn fail_on(&self, operation: CatalogOperation, target: impl Into<String>) {
        self.state.lock().faults.insert((operation, target.into()));
    }

    pub fn clear_faults(&self) {
        self.state.lock().faults.clear();
    }

    pub fn labels(&self) -> Vec<Label> {
        self.state.lock().labels.clone()
    }

    pub fn containers(&self) -> Vec<ContainerId> {
        self.state.lock().containers.clone()
    }

    pub fn find_label(&self, key: &str, value: &str) -> Option<Label> {
        self.state
            .lock()
            .labels
            .iter()
            .find(|label| label.matches(key, value))
            .cloned()
    }

    pub fn associations_of(&self, label: &LabelId) -> BTreeSet<ContainerId> {
        self.state
            .lock()
            .associations
            .get(label)
            .cloned()
            .unwrap_or_default()
    }

    /// Mutating calls received so far, in order.
    pub fn call_log(&self) -> Vec<CatalogCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_call_log(&self) {
        self.state.lock().calls.clear();
    }
}

#[async_trait]
impl CatalogClient for InMemoryCatalog {
    async fn list_labels(
        &self,
        active_only: bool,
        page_token: Option<String>,
    ) -> Result<Page<Label>, CatalogError> {
        let mut state = self.state.lock();
        state.observe(CatalogOperation::ListLabels, ANY_TARGET)?;
        let labels: Vec<Label> = state
            .labels
            .iter()
            .filter(|label| !active_only || label.active)
            .cloned()
            .collect();
        paginate(&labels, self.page_size, page_token)
    }

    async fn list_containers(
        &self,
        page_token: Option<String>,
    ) -> Result<Page<Container>, CatalogError> {
        let mut state = self.state.lock();
        state.observe(CatalogOperation::ListContainers, ANY_TARGET)?;
        let containers: Vec<Container> = state
            .containers
            .iter()
            .map(|id| Container { id: id.clone() })
            .collect();
        paginate(&containers, self.page_size, page_token)
    }

    async fn list_resources_for_label(
        &self,
        label: &LabelId,
        page_token: Option<String>,
    ) -> Result<Page<ContainerId>, CatalogError> {
        let mut state = self.state.lock();
        state.observe(CatalogOperation::ListResources, label.as_str())?;
        if state.label_index(label).is_none() {
            return Err(CatalogError::ResourceNotFound(format!("label {label}")));
        }
        let resources: Vec<ContainerId> = state
            .associations
            .get(label)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        paginate(&resources, self.page_size, page_token)
    }

    async fn create_label(&self, key: &str, value: &str) -> Result<LabelId, CatalogError> {
        let mut state = self.state.lock();
        let target = format!("{key}={value}");
        state.observe(CatalogOperation::CreateLabel, &target)?;
        if state.labels.iter().any(|label| label.matches(key, value)) {
            return Err(CatalogError::DuplicateResource(target));
        }
        state.next_id += 1;
        let id = LabelId(format!("tag-{:06}", state.next_id));
        state.labels.push(Label {
            id: id.clone(),
            key: key.to_string(),
            value: value.to_string(),
            active: true,
        });
        Ok(id)
    }

    async fn update_label(&self, label: &LabelId, value: &str) -> Result<(), CatalogError> {
        let mut state = self.state.lock();
        state.observe(CatalogOperation::UpdateLabel, label.as_str())?;
        let idx = state
            .label_index(label)
            .ok_or_else(|| CatalogError::ResourceNotFound(format!("label {label}")))?;
        let key = state.labels[idx].key.clone();
        if state.has_active_pair(&key, value, Some(label)) {
            return Err(CatalogError::DuplicateResource(format!("{key}={value}")));
        }
        state.labels[idx].value = value.to_string();
        Ok(())
    }

    async fn delete_label(&self, label: &LabelId) -> Result<(), CatalogError> {
        let mut state = self.state.lock();
        state.observe(CatalogOperation::DeleteLabel, label.as_str())?;
        let idx = state
            .label_index(label)
            .ok_or_else(|| CatalogError::ResourceNotFound(format!("label {label}")))?;
        if state
            .associations
            .get(label)
            .is_some_and(|set| !set.is_empty())
        {
            return Err(CatalogError::ResourceInUse(format!(
                "label {label} is still associated"
            )));
        }
        state.labels.remove(idx);
        state.associations.remove(label);
        Ok(())
    }

    async fn associate(
        &self,
        label: &LabelId,
        resource: &ContainerId,
    ) -> Result<(), CatalogError> {
        let mut state = self.state.lock();
        state.observe(CatalogOperation::Associate, resource.as_str())?;
        match state.label_index(label) {
            Some(idx) if state.labels[idx].active => {}
            _ => return Err(CatalogError::ResourceNotFound(format!("label {label}"))),
        }
        if !state.containers.contains(resource) {
            return Err(CatalogError::ResourceNotFound(format!("resource {resource}")));
        }
        let inserted = state
            .associations
            .entry(label.clone())
            .or_default()
            .insert(resource.clone());
        if inserted {
            Ok(())
        } else {
            Err(CatalogError::DuplicateResource(format!(
                "{label} already on {resource}"
            )))
        }
    }

    async fn disassociate(
        &self,
        label: &LabelId,
        resource: &ContainerId,
    ) -> Result<(), CatalogError> {
        let mut state = self.state.lock();
        state.observe(CatalogOperation::Disassociate, resource.as_str())?;
        let removed = state
            .associations
            .get_mut(label)
            .is_some_and(|set| set.remove(resource));
        if removed {
            Ok(())
        } else {
            Err(CatalogError::ResourceNotFound(format!(
                "{label} not on {resource}"
            )))
        }
    }
}
