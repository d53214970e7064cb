use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier assigned by the catalog service when a label is created.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelId(pub String);

impl LabelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a catalog container (portfolio).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(pub String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A key/value classification entry registered in the catalog.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub key: String,
    pub value: String,
    pub active: bool,
}

impl Label {
    pub fn matches(&self, key: &str, value: &str) -> bool {
        self.key == key && self.value == value
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.key, self.value, self.id)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub id: ContainerId,
}

/// Kind of edit carried by a change notification.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ChangeAction {
    Insert,
    Modify,
    Remove,
}

impl ChangeAction {
    /// Insert and Modify both describe a row that is present after the change.
    pub fn is_upsert(self) -> bool {
        matches!(self, ChangeAction::Insert | ChangeAction::Modify)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "insert" => Some(ChangeAction::Insert),
            "modify" => Some(ChangeAction::Modify),
            "remove" => Some(ChangeAction::Remove),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChangeAction::Insert => "insert",
            ChangeAction::Modify => "modify",
            ChangeAction::Remove => "remove",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One key/value edit driving a single reconciliation pass.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub key: String,
    pub value: String,
    pub action: ChangeAction,
    /// Value carried by the record's old image, when the feed provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_value: Option<String>,
}

impl ChangeNotification {
    pub fn new(key: impl Into<String>, value: impl Into<String>, action: ChangeAction) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            action,
            previous_value: None,
        }
    }

    pub fn with_previous_value(mut self, previous: impl Into<String>) -> Self {
        self.previous_value = Some(previous.into());
        self
    }
}

impl fmt::Display for ChangeNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}={}", self.action, self.key, self.value)
    }
}

/// Active label values grouped by key.
pub type LabelMap = BTreeMap<String, BTreeSet<String>>;

/// Folds labels into a [`LabelMap`], skipping inactive entries.
pub fn group_active<'a, I>(labels: I) -> LabelMap
where
    I: IntoIterator<Item = &'a Label>,
{
    labels
        .into_iter()
        .filter(|label| label.active)
        .fold(LabelMap::new(), |mut map, label| {
            map.entry(label.key.clone())
                .or_default()
                .insert(label.value.clone());
            map
        })
}
