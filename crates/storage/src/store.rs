// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Store` trait and transactions

use crate::{MaterializedState, StoreError};
use chrono::{DateTime, Utc};
use evr_core::{ChangeNotifier, Event, NewEvent, Operation, Resource, EVENTS_CHANNEL};

/// Pending resource writes and event appends, committed atomically
#[derive(Debug, Default, Clone)]
pub struct Transaction {
    writes: Vec<Write>,
}

#[derive(Debug, Clone)]
enum Write {
    Put(Resource),
    Delete { kind: String, id: String },
    Event(NewEvent),
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a resource
    pub fn put_resource(mut self, resource: Resource) -> Self {
        self.writes.push(Write::Put(resource));
        self
    }

    /// Soft-delete a resource; the commit fails if it does not exist
    pub fn delete_resource(mut self, kind: impl Into<String>, id: impl Into<String>) -> Self {
        self.writes.push(Write::Delete {
            kind: kind.into(),
            id: id.into(),
        });
        self
    }

    /// Append an event; id and `created_at` are assigned at commit
    pub fn append_event(mut self, event: NewEvent) -> Self {
        self.writes.push(Write::Event(event));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Resolve into operations against the current state
    pub(crate) fn into_operations(
        self,
        state: &MaterializedState,
        now: DateTime<Utc>,
        mut next_id: impl FnMut() -> String,
    ) -> Result<(Vec<Operation>, Vec<Event>), StoreError> {
        let mut ops = Vec::with_capacity(self.writes.len());
        let mut events = Vec::new();

        for write in self.writes {
            match write {
                Write::Put(resource) => ops.push(Operation::ResourcePut { resource }),
                Write::Delete { kind, id } => {
                    let live = state.resource(&kind, &id).is_some_and(|r| !r.is_deleted());
                    if !live {
                        return Err(StoreError::not_found(kind, id));
                    }
                    ops.push(Operation::ResourceDelete { kind, id, at: now });
                }
                Write::Event(new) => {
                    let event = Event::from_new(next_id(), new, now);
                    events.push(event.clone());
                    ops.push(Operation::EventAppend { event });
                }
            }
        }

        Ok((ops, events))
    }
}

/// Result of a successful commit
#[derive(Debug, Clone, Default)]
pub struct Committed {
    /// Events created by the commit, in transaction order
    pub events: Vec<Event>,
}

/// Durable store for resources and their event log.
///
/// Implementations are cheap handles; clones share the same backing state.
/// Backends only need [`Store::apply`] and [`Store::read`]; the rest is
/// derived from them.
pub trait Store: Clone + Send + Sync + 'static {
    /// Current time used for `created_at` and similar stamps
    fn now(&self) -> DateTime<Utc>;

    /// Fresh opaque identifier
    fn next_id(&self) -> String;

    /// Notifier the store publishes to after appending events
    fn notifier(&self) -> &ChangeNotifier;

    /// Run `f` against the latest state and persist the operations it
    /// returns, atomically with respect to every other writer.
    fn apply<R>(
        &self,
        f: impl FnOnce(&MaterializedState) -> Result<(Vec<Operation>, R), StoreError>,
    ) -> Result<R, StoreError>;

    /// Run `f` against the latest state
    fn read<R>(&self, f: impl FnOnce(&MaterializedState) -> R) -> Result<R, StoreError>;

    /// Commit a transaction. Publishes on [`EVENTS_CHANNEL`] when events were appended.
    fn commit(&self, tx: Transaction) -> Result<Committed, StoreError> {
        let now = self.now();
        let events = self.apply(|state| tx.into_operations(state, now, || self.next_id()))?;
        if !events.is_empty() {
            self.notifier().publish(EVENTS_CHANNEL);
        }
        Ok(Committed { events })
    }

    /// Append a single event in its own transaction
    fn append(&self, event: NewEvent) -> Result<Event, StoreError> {
        let source_id = event.source_id.clone();
        self.commit(Transaction::new().append_event(event))?
            .events
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found("Event", source_id))
    }

    /// Set `reconciled_at` if still unset. Returns false if it already was.
    fn mark_reconciled(&self, event_id: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
        self.apply(|state| {
            let event = state
                .event(event_id)
                .ok_or_else(|| StoreError::not_found("Event", event_id))?;
            if event.is_reconciled() {
                return Ok((Vec::new(), false));
            }
            let op = Operation::EventReconciled {
                id: event_id.to_string(),
                at,
            };
            Ok((vec![op], true))
        })
    }

    fn get_event(&self, id: &str) -> Result<Option<Event>, StoreError> {
        self.read(|state| state.event(id).cloned())
    }

    /// All events in append order
    fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        self.read(|state| state.events().to_vec())
    }

    /// Events with the given ids; unknown ids are skipped
    fn find_events_by_ids(&self, ids: &[String]) -> Result<Vec<Event>, StoreError> {
        self.read(|state| ids.iter().filter_map(|id| state.event(id).cloned()).collect())
    }

    /// Pending events ordered by `created_at` ascending
    fn list_unreconciled(&self, source: Option<&str>) -> Result<Vec<Event>, StoreError> {
        self.read(|state| state.unreconciled(source))
    }

    /// Live (not soft-deleted) resource
    fn get_resource(&self, kind: &str, id: &str) -> Result<Option<Resource>, StoreError> {
        self.read(|state| state.resource(kind, id).filter(|r| !r.is_deleted()).cloned())
    }

    fn list_resources(&self, kind: &str) -> Result<Vec<Resource>, StoreError> {
        self.read(|state| state.resources_of(kind))
    }
}
