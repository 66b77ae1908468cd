//! The resource interface consumed by the aggregator.
//!
//! A resource is a push-updated data source owned by some transport: either a
//! collection of records or a single model record. This crate only reads its
//! current value and consumes its notification stream.

use futures::stream::BoxStream;

use crate::sanitize::sanitize_record;
use crate::value::{Record, Value};

/// Errors reported through a resource's notification stream.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResourceError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request rejected ({code}): {message}")]
    Rejected { code: String, message: String },
}

/// Collection or model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Collection,
    Model,
}

/// A single change notification.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// `true` when the write came from a peer, `false` for this process's own write.
    pub is_remote: bool,
    /// Which record changed (collections).
    pub resource_id: Option<String>,
    /// Which field changed (models).
    pub resource_field: Option<String>,
}

impl ChangeEvent {
    /// The batch key for a resource of the given kind.
    pub fn key(&self, kind: ResourceKind) -> Option<&str> {
        match kind {
            ResourceKind::Collection => self.resource_id.as_deref(),
            ResourceKind::Model => self.resource_field.as_deref(),
        }
    }
}

/// A tagged notification.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceEvent {
    Load,
    Change(ChangeEvent),
    Error(ResourceError),
}

/// A resource's current value.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceValue {
    Collection(Vec<Record>),
    Model(Record),
}

impl ResourceValue {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceValue::Collection(_) => ResourceKind::Collection,
            ResourceValue::Model(_) => ResourceKind::Model,
        }
    }

    /// Whether there are no records (collections) or no fields (models).
    pub fn is_empty(&self) -> bool {
        match self {
            ResourceValue::Collection(records) => records.is_empty(),
            ResourceValue::Model(record) => record.is_empty(),
        }
    }
}

/// A push-updated data source.
///
/// Events for one resource arrive in a single sequence. `listen` registers a
/// new subscriber immediately; events emitted before the call are not replayed.
pub trait Resource: Send + Sync + 'static {
    fn kind(&self) -> ResourceKind;

    /// The current value.
    fn value(&self) -> ResourceValue;

    /// Whether the initial load has completed. Models are always loaded.
    fn is_loaded(&self) -> bool;

    /// Subscribe to notifications.
    fn listen(&self) -> BoxStream<'static, ResourceEvent>;
}

/// A resource value with every record field escaped.
///
/// Recomputed in full per flush and shared as an immutable `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub enum SafeSnapshot {
    Collection(Vec<Record>),
    Model(Record),
}

impl SafeSnapshot {
    /// The empty snapshot for a resource kind.
    pub fn empty(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Collection => SafeSnapshot::Collection(Vec::new()),
            ResourceKind::Model => SafeSnapshot::Model(Record::new()),
        }
    }

    /// Escape every field of every record.
    pub fn of(value: &ResourceValue) -> Self {
        match value {
            ResourceValue::Collection(records) => {
                SafeSnapshot::Collection(records.iter().map(sanitize_record).collect())
            }
            ResourceValue::Model(record) => SafeSnapshot::Model(sanitize_record(record)),
        }
    }

    /// Records of a collection snapshot; empty for models.
    pub fn records(&self) -> &[Record] {
        match self {
            SafeSnapshot::Collection(records) => records,
            SafeSnapshot::Model(_) => &[],
        }
    }

    /// The record of a model snapshot.
    pub fn record(&self) -> Option<&Record> {
        match self {
            SafeSnapshot::Model(record) => Some(record),
            SafeSnapshot::Collection(_) => None,
        }
    }

    /// The snapshot as a template value: a list of maps or a single map.
    pub fn to_value(&self) -> Value {
        match self {
            SafeSnapshot::Collection(records) => {
                Value::List(records.iter().cloned().map(Value::Map).collect())
            }
            SafeSnapshot::Model(record) => Value::Map(record.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::record_from_json;
    use serde_json::json;

    #[test]
    fn change_key_depends_on_kind() {
        let change = ChangeEvent {
            is_remote: true,
            resource_id: Some("r1".into()),
            resource_field: Some("title".into()),
        };
        assert_eq!(change.key(ResourceKind::Collection), Some("r1"));
        assert_eq!(change.key(ResourceKind::Model), Some("title"));
    }

    #[test]
    fn snapshot_escapes_each_record() {
        let value = ResourceValue::Collection(vec![
            record_from_json(json!({"id": "1", "title": "<a>"})),
            record_from_json(json!({"id": "2", "title": "b & c"})),
        ]);
        let snapshot = SafeSnapshot::of(&value);
        assert_eq!(snapshot.records()[0]["title"], Value::from("&lt;a&gt;"));
        assert_eq!(snapshot.records()[1]["title"], Value::from("b &amp; c"));
        assert!(snapshot.record().is_none());
    }

    #[test]
    fn model_snapshot_to_value() {
        let snapshot = SafeSnapshot::of(&ResourceValue::Model(record_from_json(json!({"n": "'"}))));
        assert_eq!(snapshot.to_value(), Value::from(json!({"n": "&#039;"})));
        assert!(snapshot.records().is_empty());
    }

    #[test]
    fn empty_snapshots() {
        assert_eq!(
            SafeSnapshot::empty(ResourceKind::Collection).to_value(),
            Value::List(vec![])
        );
        assert_eq!(
            SafeSnapshot::empty(ResourceKind::Model).record(),
            Some(&Record::new())
        );
    }

    #[test]
    fn value_emptiness() {
        assert!(ResourceValue::Collection(vec![]).is_empty());
        assert!(!ResourceValue::Model(record_from_json(json!({"a": 1}))).is_empty());
        assert_eq!(ResourceValue::Model(Record::new()).kind(), ResourceKind::Model);
    }
}
