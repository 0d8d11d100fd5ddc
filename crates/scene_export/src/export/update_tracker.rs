//! Change log between export passes
//!
//! Scene-mutation callbacks tag what changed; exporters read the log to
//! choose between a cheap value refresh and a full rebuild.

use crate::scene::TrackId;
use bitflags::bitflags;
use std::collections::BTreeMap;

bitflags! {
    /// Kind of change recorded for one entity
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UpdateFlags: u8 {
        /// Property values changed
        const DATA = 1 << 0;
        /// Structure changed (links, node set, payload kind)
        const TOPOLOGY = 1 << 1;
        /// Both kinds of change
        const BOTH = Self::DATA.bits() | Self::TOPOLOGY.bits();
    }
}

/// Class of entity a change applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UpdateTarget {
    /// Material shading tree
    Material,
    /// Object transform or payload
    Object,
    /// Object material slot assignment
    ObjectMaterialOptions,
    /// Light setup tree
    Light,
}

/// Accumulated change flags per (target, entity)
///
/// Flags only accumulate until the whole log is cleared.
#[derive(Debug, Default)]
pub struct UpdateTracker {
    records: BTreeMap<UpdateTarget, BTreeMap<TrackId, UpdateFlags>>,
}

impl UpdateTracker {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// OR `flags` into the record for `(target, id)`
    pub fn tag_update(&mut self, id: TrackId, target: UpdateTarget, flags: UpdateFlags) {
        if flags.is_empty() {
            return;
        }
        *self.records.entry(target).or_default().entry(id).or_default() |= flags;
    }

    /// Entries of `target` whose flags intersect `mask`, ordered by identity
    pub fn get_updates_of_type(&self, target: UpdateTarget, mask: UpdateFlags) -> Vec<(TrackId, UpdateFlags)> {
        self.records
            .get(&target)
            .into_iter()
            .flat_map(|entries| entries.iter())
            .filter(|(_, flags)| flags.intersects(mask))
            .map(|(id, flags)| (*id, *flags))
            .collect()
    }

    /// Flags recorded for one entity; empty when absent
    pub fn flags(&self, target: UpdateTarget, id: TrackId) -> UpdateFlags {
        self.records
            .get(&target)
            .and_then(|entries| entries.get(&id))
            .copied()
            .unwrap_or_default()
    }

    /// Whether nothing was tagged since the last clear
    pub fn is_empty(&self) -> bool {
        self.records.values().all(BTreeMap::is_empty)
    }

    /// Drop every record
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
