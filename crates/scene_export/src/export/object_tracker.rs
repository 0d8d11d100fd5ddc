//! Plugin ownership per scene entity
//!
//! Every plugin an exporter emits is tracked under the entity it was
//! derived from. Comparing the set produced by a pass with the set owned
//! before it yields the stale plugins that must be deleted.

use super::error::{ExportError, ExportResult};
use crate::scene::TrackId;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Maps entities to the plugin names they own
///
/// Each plugin name has exactly one owner.
#[derive(Debug, Default)]
pub struct ObjectTracker {
    owned: BTreeMap<TrackId, BTreeSet<String>>,
    owner_of: HashMap<String, TrackId>,
    /// Ownership snapshot taken when a full pass or entity rebuild began
    previous: BTreeMap<TrackId, BTreeSet<String>>,
}

impl ObjectTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `id` owns `name`; tracking the same pair again is a no-op
    pub fn track_plugin(&mut self, id: TrackId, name: &str) -> ExportResult<()> {
        match self.owner_of.get(name) {
            Some(owner) if *owner == id => return Ok(()),
            Some(owner) => {
                return Err(ExportError::OwnershipConflict {
                    plugin: name.to_string(),
                    owner: *owner,
                    claimant: id,
                })
            }
            None => {}
        }
        self.owner_of.insert(name.to_string(), id);
        self.owned.entry(id).or_default().insert(name.to_string());
        Ok(())
    }

    /// Plugins currently owned by `id`, sorted
    pub fn owned_plugins(&self, id: TrackId) -> Vec<&str> {
        self.owned
            .get(&id)
            .into_iter()
            .flat_map(|names| names.iter().map(String::as_str))
            .collect()
    }

    /// Owner of a plugin name
    pub fn owner_of(&self, name: &str) -> Option<TrackId> {
        self.owner_of.get(name).copied()
    }

    /// Entities owning at least one plugin
    pub fn tracked_entities(&self) -> Vec<TrackId> {
        self.owned
            .iter()
            .filter(|(_, names)| !names.is_empty())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Start a full pass: current ownership becomes the baseline to diff against
    pub fn begin_full_pass(&mut self) {
        self.previous = std::mem::take(&mut self.owned);
        self.owner_of.clear();
    }

    /// Finish a full pass, returning the sorted names that were owned before
    /// and were not produced again
    pub fn end_full_pass(&mut self) -> Vec<String> {
        let previous = std::mem::take(&mut self.previous);
        self.collect_stale(previous.into_values().flatten())
    }

    /// Start rebuilding one entity's plugins during a partial pass
    pub fn begin_entity(&mut self, id: TrackId) {
        if let Some(names) = self.owned.remove(&id) {
            for name in &names {
                self.owner_of.remove(name);
            }
            self.previous.entry(id).or_default().extend(names);
        }
    }

    /// Finish rebuilding one entity, returning the names it no longer produces
    pub fn end_entity(&mut self, id: TrackId) -> Vec<String> {
        let previous = self.previous.remove(&id).unwrap_or_default();
        self.collect_stale(previous.into_iter())
    }

    /// Drop an entity that left the scene, returning every name it owned
    pub fn forget(&mut self, id: TrackId) -> Vec<String> {
        let names = self.owned.remove(&id).unwrap_or_default();
        for name in &names {
            self.owner_of.remove(name);
        }
        names.into_iter().collect()
    }

    /// Drop all ownership records
    pub fn clear(&mut self) {
        self.owned.clear();
        self.owner_of.clear();
        self.previous.clear();
    }

    fn collect_stale(&self, names: impl Iterator<Item = String>) -> Vec<String> {
        let stale: BTreeSet<String> = names.filter(|name| !self.owner_of.contains_key(name)).collect();
        stale.into_iter().collect()
    }
}
