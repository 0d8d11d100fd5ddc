//! Deterministic plugin instance names
//!
//! Names are derived from stable entity identities and node names, never
//! from display names of entities, so renaming an object does not rename
//! its plugins.
//!
//! | Source                 | Name                         |
//! |------------------------|------------------------------|
//! | object                 | `OB{id}`                     |
//! | object data            | `DA{id}`                     |
//! | object-owned synthetic | `OB{id}#{type}`              |
//! | tree node              | `NT{owner}@{node}`           |
//! | tree synthetic         | `NT{owner}@{node}#{type}`    |
//! | per-scene default      | `Default{type}`              |
//! | singleton              | `{type}`                     |
//!
//! Identities print as hexadecimal. Synthetic names with a slot append
//! `:{slot}`. Node names are escaped so that `@`, `#`, `:` and `%` inside
//! them never read as separators.

use super::error::{ExportError, ExportResult};
use crate::scene::{NodeKey, TrackId};
use log::error;
use std::borrow::Cow;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct VirtualKey {
    owner: TrackId,
    node: NodeKey,
    plugin_type: String,
    slot: Option<usize>,
}

/// Mints plugin names and guards them against collisions within a pass
#[derive(Debug)]
pub struct NamingService {
    claimed: HashMap<String, String>,
    virtuals: HashMap<VirtualKey, String>,
    strict: bool,
}

impl Default for NamingService {
    fn default() -> Self {
        Self::new(true)
    }
}

impl NamingService {
    /// Create a naming service; `strict` makes collisions fatal
    pub fn new(strict: bool) -> Self {
        Self {
            claimed: HashMap::new(),
            virtuals: HashMap::new(),
            strict,
        }
    }

    /// Forget claims and synthetic names from the previous pass
    pub fn begin_pass(&mut self) {
        self.claimed.clear();
        self.virtuals.clear();
    }

    /// Canonical name of an object's instance plugin
    pub fn object(&self, id: TrackId) -> String {
        format!("OB{id}")
    }

    /// Canonical name of an object's data plugin (geometry)
    pub fn object_data(&self, data: TrackId) -> String {
        format!("DA{data}")
    }

    /// Name of a synthetic plugin owned directly by an object
    pub fn object_virtual(&self, id: TrackId, plugin_type: &str) -> String {
        format!("OB{id}#{plugin_type}")
    }

    /// Name of the plugin exported from a user-authored tree node
    pub fn tree_node(&self, owner: TrackId, node_name: &str) -> String {
        format!("NT{owner}@{}", escape_segment(node_name))
    }

    /// Name of a synthetic sub-plugin inserted for a tree node
    ///
    /// Repeated calls with the same owner node, type and slot return the
    /// same name until the next pass begins.
    pub fn next_virtual_node(
        &mut self,
        owner: TrackId,
        node: NodeKey,
        node_name: &str,
        plugin_type: &str,
        slot: Option<usize>,
    ) -> String {
        let key = VirtualKey {
            owner,
            node,
            plugin_type: plugin_type.to_string(),
            slot,
        };
        if let Some(name) = self.virtuals.get(&key) {
            return name.clone();
        }

        let base = self.tree_node(owner, node_name);
        let name = match slot {
            Some(slot) => format!("{base}#{plugin_type}:{slot}"),
            None => format!("{base}#{plugin_type}"),
        };
        self.virtuals.insert(key, name.clone());
        name
    }

    /// Fixed name of a plugin type that exists at most once per scene
    pub fn singleton_plugin(&self, plugin_type: &str) -> String {
        plugin_type.to_string()
    }

    /// Name of the shared default instance of a plugin type
    pub fn default_plugin(&self, plugin_type: &str) -> String {
        format!("Default{plugin_type}")
    }

    /// Claim `name` for `claimant`, an opaque description of the identity
    /// that minted it
    ///
    /// Claiming a name again for the same identity is a no-op.
    pub fn claim(&mut self, name: &str, claimant: &str) -> ExportResult<()> {
        match self.claimed.get(name) {
            Some(existing) if existing == claimant => Ok(()),
            Some(existing) => {
                let collision = ExportError::NamingCollision {
                    name: name.to_string(),
                    existing: existing.clone(),
                    claimant: claimant.to_string(),
                };
                if self.strict {
                    Err(collision)
                } else {
                    error!("{collision}");
                    Ok(())
                }
            }
            None => {
                self.claimed.insert(name.to_string(), claimant.to_string());
                Ok(())
            }
        }
    }

    /// Number of names claimed in the current pass
    pub fn claimed_count(&self) -> usize {
        self.claimed.len()
    }
}

/// Percent-encode the separator characters of a name segment
fn escape_segment(segment: &str) -> Cow<'_, str> {
    if !segment.contains(['@', '#', ':', '%']) {
        return Cow::Borrowed(segment);
    }
    let mut escaped = String::with_capacity(segment.len() + 6);
    for c in segment.chars() {
        match c {
            '@' => escaped.push_str("%40"),
            '#' => escaped.push_str("%23"),
            ':' => escaped.push_str("%3A"),
            '%' => escaped.push_str("%25"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn keys() -> (NodeKey, NodeKey) {
        let mut arena: SlotMap<NodeKey, ()> = SlotMap::with_key();
        (arena.insert(()), arena.insert(()))
    }

    #[test]
    fn test_virtual_names_are_memoized() {
        let (a, _) = keys();
        let mut naming = NamingService::default();
        let owner = TrackId::new(0x1f);

        let first = naming.next_virtual_node(owner, a, "Bitmap", "UVWGenChannel", None);
        let second = naming.next_virtual_node(owner, a, "Bitmap", "UVWGenChannel", None);
        assert_eq!(first, second);
        assert_eq!(first, "NT1f@Bitmap#UVWGenChannel");
    }

    #[test]
    fn test_virtual_names_differ_per_owner_node() {
        let (a, b) = keys();
        let mut naming = NamingService::default();
        let owner = TrackId::new(1);

        let first = naming.next_virtual_node(owner, a, "A", "TexAColor", None);
        let second = naming.next_virtual_node(owner, b, "B", "TexAColor", None);
        assert_ne!(first, second);
    }

    #[test]
    fn test_virtual_slots_are_distinct() {
        let (a, _) = keys();
        let mut naming = NamingService::default();
        let owner = TrackId::new(1);
        let slot0 = naming.next_virtual_node(owner, a, "Layered", "TexAColor", Some(0));
        let slot1 = naming.next_virtual_node(owner, a, "Layered", "TexAColor", Some(1));
        assert_ne!(slot0, slot1);
        assert_eq!(slot1, "NT1@Layered#TexAColor:1");
    }

    #[test]
    fn test_separators_in_node_names_are_escaped() {
        let (a, b) = keys();
        let mut naming = NamingService::default();
        let owner = TrackId::new(2);

        let synthetic = naming.next_virtual_node(owner, a, "Bitmap", "BitmapBuffer", None);
        let authored = naming.tree_node(owner, "Bitmap#BitmapBuffer");
        assert_eq!(synthetic, "NT2@Bitmap#BitmapBuffer");
        assert_eq!(authored, "NT2@Bitmap%23BitmapBuffer");
        assert_eq!(naming.tree_node(owner, "Bitmap%23BitmapBuffer"), "NT2@Bitmap%2523BitmapBuffer");
        assert_eq!(naming.tree_node(owner, "a@b:c"), "NT2@a%40b%3Ac");

        let slotted = naming.next_virtual_node(owner, b, "Layered#TexAColor", "TexAColor", Some(1));
        assert_eq!(slotted, "NT2@Layered%23TexAColor#TexAColor:1");
    }

    #[test]
    fn test_entity_names() {
        let naming = NamingService::default();
        assert_eq!(naming.object(TrackId::new(10)), "OBa");
        assert_eq!(naming.object_data(TrackId::new(11)), "DAb");
        assert_eq!(naming.object_virtual(TrackId::new(10), "MtlMulti"), "OBa#MtlMulti");
        assert_eq!(naming.singleton_plugin("SettingsOutput"), "SettingsOutput");
        assert_eq!(naming.default_plugin("UVWGenChannel"), "DefaultUVWGenChannel");
    }

    #[test]
    fn test_collision_is_fatal_when_strict() {
        let mut naming = NamingService::new(true);
        naming.claim("X", "first").unwrap();
        naming.claim("X", "first").unwrap();
        assert!(matches!(naming.claim("X", "second"), Err(ExportError::NamingCollision { .. })));
    }

    #[test]
    fn test_collision_is_logged_when_lenient() {
        let mut naming = NamingService::new(false);
        naming.claim("X", "first").unwrap();
        assert!(naming.claim("X", "second").is_ok());
    }

    #[test]
    fn test_begin_pass_resets_claims() {
        let mut naming = NamingService::default();
        naming.claim("X", "first").unwrap();
        naming.begin_pass();
        assert_eq!(naming.claimed_count(), 0);
        assert!(naming.claim("X", "second").is_ok());
    }
}
