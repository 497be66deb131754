// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state built by applying operations in log order

use evr_core::{Event, Operation, Resource};
use std::collections::HashMap;

/// Resources and events as of the last applied operation
#[derive(Debug, Default, Clone)]
pub struct MaterializedState {
    /// Keyed by (kind, id)
    resources: HashMap<(String, String), Resource>,
    /// In append order
    events: Vec<Event>,
    /// Event id -> position in `events`
    event_index: HashMap<String, usize>,
}

impl MaterializedState {
    /// Apply an operation to update the state
    pub fn apply(&mut self, op: &Operation) {
        match op {
            Operation::ResourcePut { resource } => {
                self.resources.insert(
                    (resource.kind.clone(), resource.id.clone()),
                    resource.clone(),
                );
            }

            Operation::ResourceDelete { kind, id, at } => {
                if let Some(resource) = self.resources.get_mut(&(kind.clone(), id.clone())) {
                    if resource.deleted_at.is_none() {
                        resource.deleted_at = Some(*at);
                        resource.updated_at = *at;
                    }
                }
            }

            Operation::EventAppend { event } => {
                if self.event_index.contains_key(&event.id) {
                    tracing::warn!(event_id = %event.id, "duplicate event append ignored");
                    return;
                }
                self.event_index.insert(event.id.clone(), self.events.len());
                self.events.push(event.clone());
            }

            Operation::EventReconciled { id, at } => {
                if let Some(event) = self.event_mut(id) {
                    event.reconcile(*at);
                }
            }
        }
    }

    pub fn event(&self, id: &str) -> Option<&Event> {
        self.event_index.get(id).and_then(|&i| self.events.get(i))
    }

    fn event_mut(&mut self, id: &str) -> Option<&mut Event> {
        let i = *self.event_index.get(id)?;
        self.events.get_mut(i)
    }

    /// All events in append order
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Pending events ordered by `created_at`, ties in append order
    pub fn unreconciled(&self, source: Option<&str>) -> Vec<Event> {
        let mut pending: Vec<Event> = self
            .events
            .iter()
            .filter(|e| e.reconciled_at.is_none())
            .filter(|e| source.map_or(true, |s| e.source == s))
            .cloned()
            .collect();
        pending.sort_by_key(|e| e.created_at);
        pending
    }

    /// Resource by kind and id, including soft-deleted ones
    pub fn resource(&self, kind: &str, id: &str) -> Option<&Resource> {
        self.resources.get(&(kind.to_string(), id.to_string()))
    }

    /// Live resources of a kind, oldest first
    pub fn resources_of(&self, kind: &str) -> Vec<Resource> {
        let mut found: Vec<Resource> = self
            .resources
            .values()
            .filter(|r| r.kind == kind && !r.is_deleted())
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        found
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
