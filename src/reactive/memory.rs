//! An in-process [`Resource`] whose writes are made by the caller.
//!
//! Useful as a test double and for wiring local state through the same
//! aggregation path as transport-backed resources. Each write is tagged with
//! an [`Origin`] so callers can simulate peer updates.

use std::sync::{Arc, Mutex, MutexGuard};

use futures::channel::mpsc;
use futures::stream::BoxStream;
use futures::StreamExt;

use super::resource::{
    ChangeEvent, Resource, ResourceError, ResourceEvent, ResourceKind, ResourceValue,
};
use crate::value::{Record, Value};

/// Field holding a collection record's id.
pub const ID_FIELD: &str = "id";

/// Who made a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Local,
    Remote,
}

impl Origin {
    fn is_remote(self) -> bool {
        self == Origin::Remote
    }
}

struct State {
    value: ResourceValue,
    loaded: bool,
    listeners: Vec<mpsc::UnboundedSender<ResourceEvent>>,
}

/// A collection or model held in memory.
pub struct MemoryResource {
    kind: ResourceKind,
    state: Mutex<State>,
}

impl std::fmt::Debug for MemoryResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("MemoryResource")
            .field("kind", &self.kind)
            .field("loaded", &state.loaded)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

impl MemoryResource {
    /// An empty, not-yet-loaded collection.
    pub fn collection() -> Arc<Self> {
        Arc::new(Self {
            kind: ResourceKind::Collection,
            state: Mutex::new(State {
                value: ResourceValue::Collection(Vec::new()),
                loaded: false,
                listeners: Vec::new(),
            }),
        })
    }

    /// A model holding `record`. Models count as loaded from the start.
    pub fn model(record: Record) -> Arc<Self> {
        Arc::new(Self {
            kind: ResourceKind::Model,
            state: Mutex::new(State {
                value: ResourceValue::Model(record),
                loaded: true,
                listeners: Vec::new(),
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the collection's records and mark it loaded.
    ///
    /// Emits `Load`, then a remote change for each record carrying an id.
    pub fn load(&self, records: Vec<Record>) {
        let mut state = self.state();
        let ids: Vec<String> = records.iter().filter_map(record_id).collect();
        state.value = ResourceValue::Collection(records);
        state.loaded = true;
        emit(&mut state, ResourceEvent::Load);
        for id in ids {
            emit(&mut state, change(Some(id), None, Origin::Remote));
        }
    }

    /// Append a record to the collection.
    pub fn insert(&self, record: Record, origin: Origin) {
        let mut state = self.state();
        let id = record_id(&record);
        if let ResourceValue::Collection(records) = &mut state.value {
            records.push(record);
            emit(&mut state, change(id, None, origin));
        }
    }

    /// Set one field of the collection record with id `id`. Returns `false`
    /// when no such record exists.
    pub fn update(&self, id: &str, field: &str, value: Value, origin: Origin) -> bool {
        let mut state = self.state();
        let ResourceValue::Collection(records) = &mut state.value else {
            return false;
        };
        let Some(record) = records
            .iter_mut()
            .find(|record| record_id(record).as_deref() == Some(id))
        else {
            return false;
        };
        record.insert(field.to_owned(), value);
        emit(&mut state, change(Some(id.to_owned()), None, origin));
        true
    }

    /// Remove the collection record with id `id`. Returns `false` when no
    /// such record exists.
    pub fn remove(&self, id: &str, origin: Origin) -> bool {
        let mut state = self.state();
        let ResourceValue::Collection(records) = &mut state.value else {
            return false;
        };
        let before = records.len();
        records.retain(|record| record_id(record).as_deref() != Some(id));
        if records.len() == before {
            return false;
        }
        emit(&mut state, change(Some(id.to_owned()), None, origin));
        true
    }

    /// Set a field of the model.
    pub fn set_field(&self, field: &str, value: Value, origin: Origin) {
        let mut state = self.state();
        if let ResourceValue::Model(record) = &mut state.value {
            record.insert(field.to_owned(), value);
            emit(&mut state, change(None, Some(field.to_owned()), origin));
        }
    }

    /// Report an error to every listener.
    pub fn fail(&self, error: ResourceError) {
        emit(&mut self.state(), ResourceEvent::Error(error));
    }

    /// Number of open listeners, as of the last emitted event.
    pub fn listener_count(&self) -> usize {
        self.state().listeners.len()
    }
}

impl Resource for MemoryResource {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn value(&self) -> ResourceValue {
        self.state().value.clone()
    }

    fn is_loaded(&self) -> bool {
        self.state().loaded
    }

    fn listen(&self) -> BoxStream<'static, ResourceEvent> {
        let (tx, rx) = mpsc::unbounded();
        self.state().listeners.push(tx);
        rx.boxed()
    }
}

fn record_id(record: &Record) -> Option<String> {
    match record.get(ID_FIELD)? {
        Value::String(id) => Some(id.clone()),
        number @ Value::Number(_) => Some(number.to_js_string()),
        _ => None,
    }
}

fn change(id: Option<String>, field: Option<String>, origin: Origin) -> ResourceEvent {
    ResourceEvent::Change(ChangeEvent {
        is_remote: origin.is_remote(),
        resource_id: id,
        resource_field: field,
    })
}

/// Send to every listener, pruning the ones whose receiver is gone.
fn emit(state: &mut State, event: ResourceEvent) {
    state
        .listeners
        .retain(|tx| tx.unbounded_send(event.clone()).is_ok());
}
