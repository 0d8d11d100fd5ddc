//! Per-plugin-type export hooks
//!
//! Plugin types that need more than copying socket values into attributes
//! register a [`PluginHooks`] implementation. The registry is built once
//! and looked up by plugin type string.

use super::descriptor::PluginDesc;
use super::value::AttrPlugin;
use crate::export::{ExportResult, NodeContext, TreeExporter, UpdateFlags};
use std::collections::HashMap;

/// Optional callbacks for one plugin type
pub trait PluginHooks: Send + Sync {
    /// Take full control of exporting a tree node
    ///
    /// Return `None` to fall back to the generic path: populate from schema
    /// defaults and sockets, then [`export_custom`](Self::export_custom).
    fn export_tree_node(
        &self,
        _exporter: &mut TreeExporter<'_, '_>,
        _node: NodeContext<'_>,
    ) -> Option<ExportResult<AttrPlugin>> {
        None
    }

    /// Post-process a populated descriptor before it is sent
    fn export_custom(
        &self,
        _exporter: &mut TreeExporter<'_, '_>,
        _node: NodeContext<'_>,
        _desc: &mut PluginDesc,
    ) -> ExportResult<()> {
        Ok(())
    }

    /// Classify an edit of `property` on a node of this type
    fn node_update(&self, _property: &str) -> UpdateFlags {
        UpdateFlags::DATA
    }
}

/// Plugin type to hook set
#[derive(Default)]
pub struct HookRegistry {
    hooks: HashMap<String, Box<dyn PluginHooks>>,
}

impl HookRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated with the built-in hooks
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        super::builtin::register_hooks(&mut registry);
        registry
    }

    /// Register or replace the hooks of a plugin type
    pub fn register(&mut self, plugin_type: impl Into<String>, hooks: impl PluginHooks + 'static) {
        self.hooks.insert(plugin_type.into(), Box::new(hooks));
    }

    /// Hooks of a plugin type
    pub fn get(&self, plugin_type: &str) -> Option<&dyn PluginHooks> {
        self.hooks.get(plugin_type).map(|hooks| hooks.as_ref())
    }

    /// Whether a plugin type has hooks
    pub fn contains(&self, plugin_type: &str) -> bool {
        self.hooks.contains_key(plugin_type)
    }

    /// Number of plugin types with hooks
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether no hooks are registered
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<&str> = self.hooks.keys().map(String::as_str).collect();
        types.sort_unstable();
        f.debug_struct("HookRegistry").field("types", &types).finish()
    }
}
