//! Normalizes raw change-feed batches into [`ChangeNotification`]s.
//!
//! Two record shapes are accepted: the record-store stream form
//! (`eventName` + `dynamodb.Keys`) and a flat `{key, value, action}` form.

use serde::Deserialize;
use serde_json::Value;
use tagsync_core_types::{ChangeAction, ChangeNotification, ContainerId};

use crate::errors::DecodeError;

#[derive(Deserialize)]
struct RawBatch {
    #[serde(rename = "Records")]
    records: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRecord {
    Stream(StreamRecord),
    Flat(FlatRecord),
}

#[derive(Deserialize)]
struct StreamRecord {
    #[serde(rename = "eventName")]
    event_name: String,
    dynamodb: StreamImage,
}

#[derive(Deserialize)]
struct StreamImage {
    #[serde(rename = "Keys")]
    keys: KeyImage,
    #[serde(rename = "OldImage", default)]
    old_image: Option<OldImage>,
}

#[derive(Deserialize)]
struct KeyImage {
    #[serde(rename = "Key")]
    key: StringAttr,
    #[serde(rename = "Value")]
    value: StringAttr,
}

#[derive(Deserialize)]
struct OldImage {
    #[serde(rename = "Value", default)]
    value: Option<StringAttr>,
}

#[derive(Deserialize)]
struct StringAttr {
    #[serde(rename = "S")]
    s: String,
}

#[derive(Deserialize)]
struct FlatRecord {
    key: String,
    value: String,
    action: String,
    #[serde(default)]
    previous_value: Option<String>,
}

/// A fully decoded batch. Decoding is all-or-nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodedBatch {
    notifications: Vec<ChangeNotification>,
}

impl DecodedBatch {
    pub fn new(notifications: Vec<ChangeNotification>) -> Self {
        Self { notifications }
    }

    /// Notifications in record order.
    pub fn notifications(&self) -> impl Iterator<Item = &ChangeNotification> + '_ {
        self.notifications.iter()
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }
}

pub fn decode_batch(raw: &str) -> Result<DecodedBatch, DecodeError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|err| DecodeError::Malformed(err.to_string()))?;
    decode_value(value)
}

fn decode_value(value: Value) -> Result<DecodedBatch, DecodeError> {
    let batch: RawBatch =
        serde_json::from_value(value).map_err(|err| DecodeError::Malformed(err.to_string()))?;
    batch
        .records
        .into_iter()
        .enumerate()
        .map(|(index, record)| decode_record(index, record))
        .collect::<Result<Vec<_>, _>>()
        .map(DecodedBatch::new)
}

fn decode_record(index: usize, record: Value) -> Result<ChangeNotification, DecodeError> {
    let raw: RawRecord = serde_json::from_value(record).map_err(|_| DecodeError::Record {
        index,
        message: "record is missing key, value or action".into(),
    })?;
    let (key, value, action, previous_value) = match raw {
        RawRecord::Stream(record) => (
            record.dynamodb.keys.key.s,
            record.dynamodb.keys.value.s,
            record.event_name,
            record
                .dynamodb
                .old_image
                .and_then(|image| image.value)
                .map(|attr| attr.s),
        ),
        RawRecord::Flat(record) => (
            record.key,
            record.value,
            record.action,
            record.previous_value,
        ),
    };
    let action =
        ChangeAction::parse(&action).ok_or(DecodeError::UnknownAction { index, action })?;
    Ok(ChangeNotification {
        key,
        value,
        action,
        previous_value,
    })
}

/// A container-creation event consumed by the bootstrap flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerCreated {
    pub container: ContainerId,
    pub region: Option<String>,
}

#[derive(Deserialize)]
struct CreatedEvent {
    #[serde(default)]
    region: Option<String>,
    detail: CreatedDetail,
}

#[derive(Deserialize)]
struct CreatedDetail {
    #[serde(rename = "responseElements")]
    response_elements: CreatedElements,
}

#[derive(Deserialize)]
struct CreatedElements {
    #[serde(rename = "portfolioDetail")]
    portfolio_detail: CreatedPortfolio,
}

#[derive(Deserialize)]
struct CreatedPortfolio {
    id: String,
}

pub fn decode_container_created(raw: &str) -> Result<ContainerCreated, DecodeError> {
    let event: CreatedEvent =
        serde_json::from_str(raw).map_err(|err| DecodeError::Malformed(err.to_string()))?;
    Ok(ContainerCreated {
        container: ContainerId(event.detail.response_elements.portfolio_detail.id),
        region: event.region,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_stream_records_in_order() {
        let raw = r#"{"Records": [
            {"eventName": "INSERT", "dynamodb": {"Keys": {"Key": {"S": "env"}, "Value": {"S": "prod"}}}},
            {"eventName": "MODIFY", "dynamodb": {
                "Keys": {"Key": {"S": "env"}, "Value": {"S": "stage"}},
                "OldImage": {"Key": {"S": "env"}, "Value": {"S": "qa"}}
            }},
            {"eventName": "REMOVE", "dynamodb": {"Keys": {"Key": {"S": "team"}, "Value": {"S": "infra"}}}}
        ]}"#;
        let batch = decode_batch(raw).unwrap();
        let items: Vec<_> = batch.notifications().cloned().collect();
        assert_eq!(
            items,
            vec![
                ChangeNotification::new("env", "prod", ChangeAction::Insert),
                ChangeNotification::new("env", "stage", ChangeAction::Modify)
                    .with_previous_value("qa"),
                ChangeNotification::new("team", "infra", ChangeAction::Remove),
            ]
        );
    }

    #[test]
    fn decodes_flat_records() {
        let raw = r#"{"Records": [{"key": "env", "value": "prod", "action": "Insert"}]}"#;
        let batch = decode_batch(raw).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(
            batch.notifications().next().unwrap().action,
            ChangeAction::Insert
        );
    }

    #[test]
    fn missing_value_fails_whole_batch() {
        let raw = r#"{"Records": [
            {"key": "env", "value": "prod", "action": "Insert"},
            {"eventName": "INSERT", "dynamodb": {"Keys": {"Key": {"S": "env"}}}}
        ]}"#;
        let err = decode_batch(raw).unwrap_err();
        assert!(matches!(err, DecodeError::Record { index: 1, .. }));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let raw = r#"{"Records": [{"key": "env", "value": "prod", "action": "Upsert"}]}"#;
        let err = decode_batch(raw).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownAction { index: 0, .. }));
    }

    #[test]
    fn decodes_container_created_event() {
        let raw = r#"{"region": "us-east-1", "detail": {"responseElements": {
            "portfolioDetail": {"id": "port-abc", "displayName": "Team"}
        }}}"#;
        let created = decode_container_created(raw).unwrap();
        assert_eq!(created.container, ContainerId::new("port-abc"));
        assert_eq!(created.region.as_deref(), Some("us-east-1"));
    }
}
