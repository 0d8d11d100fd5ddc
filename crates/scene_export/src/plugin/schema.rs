//! Per-plugin-type attribute schemas and the skip registry

use super::value::{AttrKind, AttrValue};
use std::collections::{BTreeMap, BTreeSet};

/// Broad class of a plugin type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginCategory {
    /// Surface scattering functions
    Brdf,
    /// Materials wrapping BRDFs
    Material,
    /// Textures
    Texture,
    /// UVW coordinate generators
    Uvwgen,
    /// Lights
    Light,
    /// Geometry sources
    Geometry,
    /// Scene instances
    Node,
    /// Global settings; at most one instance per scene
    Settings,
}

/// Declaration of one attribute in a plugin schema
#[derive(Debug, Clone, PartialEq)]
pub struct AttrDef {
    /// Attribute name
    pub name: String,
    /// Declared type
    pub kind: AttrKind,
    /// Default value, if the schema declares one
    pub default: Option<AttrValue>,
}

impl AttrDef {
    /// Declare an attribute without a default
    pub fn new(name: impl Into<String>, kind: AttrKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    /// Attach a default value
    pub fn with_default(mut self, default: impl Into<AttrValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// The schema default, or the kind's zero value when none is declared
    pub fn default_or_zero(&self) -> AttrValue {
        self.default.clone().unwrap_or_else(|| self.kind.zero_value())
    }
}

/// Declared attributes of one plugin type
#[derive(Debug, Clone, PartialEq)]
pub struct PluginSchema {
    plugin_type: String,
    category: PluginCategory,
    attributes: Vec<AttrDef>,
}

impl PluginSchema {
    /// Create an empty schema
    pub fn new(plugin_type: impl Into<String>, category: PluginCategory) -> Self {
        Self {
            plugin_type: plugin_type.into(),
            category,
            attributes: Vec::new(),
        }
    }

    /// Declare an attribute (builder pattern)
    pub fn with_attr(mut self, def: AttrDef) -> Self {
        self.attributes.push(def);
        self
    }

    /// Plugin type name
    pub fn plugin_type(&self) -> &str {
        &self.plugin_type
    }

    /// Plugin category
    pub fn category(&self) -> PluginCategory {
        self.category
    }

    /// Whether at most one instance of this type exists per scene
    pub fn is_singleton(&self) -> bool {
        self.category == PluginCategory::Settings
    }

    /// Declared attributes in declaration order
    pub fn attributes(&self) -> &[AttrDef] {
        &self.attributes
    }

    /// Look up one attribute declaration
    pub fn attr(&self, name: &str) -> Option<&AttrDef> {
        self.attributes.iter().find(|def| def.name == name)
    }
}

/// Registry of plugin schemas, resolved once at startup
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, PluginSchema>,
    skipped: BTreeSet<String>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated with the built-in plugin set
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        super::builtin::register_schemas(&mut registry);
        registry
    }

    /// Register or replace a schema
    pub fn register(&mut self, schema: PluginSchema) {
        self.schemas.insert(schema.plugin_type().to_string(), schema);
    }

    /// Schema for a plugin type
    pub fn get(&self, plugin_type: &str) -> Option<&PluginSchema> {
        self.schemas.get(plugin_type)
    }

    /// Whether a plugin type has a schema
    pub fn contains(&self, plugin_type: &str) -> bool {
        self.schemas.contains_key(plugin_type)
    }

    /// Exclude a plugin type from node-tree generation
    pub fn skip(&mut self, plugin_type: impl Into<String>) {
        self.skipped.insert(plugin_type.into());
    }

    /// Whether a plugin type must never be generated from node-tree traversal
    pub fn is_skipped(&self, plugin_type: &str) -> bool {
        self.skipped.contains(plugin_type)
    }

    /// All settings-category schemas, ordered by type name
    pub fn settings(&self) -> impl Iterator<Item = &PluginSchema> {
        self.schemas.values().filter(|schema| schema.is_singleton())
    }

    /// Number of registered schemas
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
