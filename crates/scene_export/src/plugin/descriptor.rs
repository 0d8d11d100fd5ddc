//! In-memory description of one renderer plugin instance
//!
//! A descriptor is built by an exporter function, mutated only while that
//! function runs, and consumed when it is handed to the renderer boundary.

use super::schema::PluginSchema;
use super::value::{AttrPlugin, AttrValue};
use crate::scene::NodeHandle;
use std::collections::BTreeMap;

/// One renderer plugin instance: name, type and attribute values
#[derive(Debug, Clone, PartialEq)]
pub struct PluginDesc {
    name: String,
    plugin_type: String,
    attributes: BTreeMap<String, AttrValue>,
    /// Values the descriptor was seeded with, restored by `reset_attribute`
    seeded: BTreeMap<String, AttrValue>,
    source_node: Option<NodeHandle>,
}

impl PluginDesc {
    /// Create an empty descriptor
    pub fn new(name: impl Into<String>, plugin_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plugin_type: plugin_type.into(),
            attributes: BTreeMap::new(),
            seeded: BTreeMap::new(),
            source_node: None,
        }
    }

    /// Create a descriptor pre-populated with the schema's declared defaults
    pub fn from_schema(name: impl Into<String>, schema: &PluginSchema) -> Self {
        let mut desc = Self::new(name, schema.plugin_type());
        for def in schema.attributes() {
            if let Some(default) = &def.default {
                desc.attributes.insert(def.name.clone(), default.clone());
            }
        }
        desc.seeded = desc.attributes.clone();
        desc
    }

    /// Record the scene node this plugin was exported from
    pub fn with_source_node(mut self, node: NodeHandle) -> Self {
        self.source_node = Some(node);
        self
    }

    /// Plugin instance name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Plugin type understood by the renderer
    pub fn plugin_type(&self) -> &str {
        &self.plugin_type
    }

    /// Scene node this plugin originates from, valid for the current pass only
    pub fn source_node(&self) -> Option<NodeHandle> {
        self.source_node
    }

    /// Reference to this plugin's default output
    pub fn as_plugin(&self) -> AttrPlugin {
        AttrPlugin::new(self.name.clone())
    }

    /// Set an attribute value, replacing any previous one
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Restore an attribute to the value it was seeded with
    ///
    /// Attributes without a seeded value are removed.
    pub fn reset_attribute(&mut self, name: &str) {
        match self.seeded.get(name) {
            Some(value) => {
                self.attributes.insert(name.to_string(), value.clone());
            }
            None => {
                self.attributes.remove(name);
            }
        }
    }

    /// Remove an attribute, returning its value
    pub fn remove_attribute(&mut self, name: &str) -> Option<AttrValue> {
        self.attributes.remove(name)
    }

    /// Current value of an attribute
    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    /// Whether an attribute is set
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Attributes in key order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Names of all plugins referenced by attribute values
    pub fn referenced_plugins(&self) -> Vec<&str> {
        self.attributes
            .values()
            .flat_map(AttrValue::plugin_refs)
            .map(|p| p.plugin.as_str())
            .collect()
    }

    /// Convert to the wire form handed to the renderer
    pub fn into_parts(self) -> (String, String, Vec<(String, AttrValue)>) {
        (self.name, self.plugin_type, self.attributes.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::schema::{AttrDef, PluginCategory};
    use crate::plugin::value::AttrKind;

    fn test_schema() -> PluginSchema {
        PluginSchema::new("BRDFDiffuse", PluginCategory::Brdf)
            .with_attr(AttrDef::new("color", AttrKind::Color).with_default(AttrValue::Color(
                crate::foundation::math::Vec3::new(0.8, 0.8, 0.8),
            )))
            .with_attr(AttrDef::new("roughness", AttrKind::Float).with_default(0.0_f32))
            .with_attr(AttrDef::new("color_tex", AttrKind::Plugin))
    }

    #[test]
    fn test_from_schema_seeds_defaults() {
        let desc = PluginDesc::from_schema("diffuse", &test_schema());
        assert_eq!(desc.plugin_type(), "BRDFDiffuse");
        assert!(desc.has_attribute("color"));
        assert_eq!(desc.attribute("roughness"), Some(&AttrValue::Float(0.0)));
        assert!(!desc.has_attribute("color_tex"));
    }

    #[test]
    fn test_reset_restores_seeded_value() {
        let mut desc = PluginDesc::from_schema("diffuse", &test_schema());
        desc.set_attribute("roughness", 0.7_f32);
        desc.set_attribute("color_tex", AttrPlugin::new("tex"));

        desc.reset_attribute("roughness");
        desc.reset_attribute("color_tex");

        assert_eq!(desc.attribute("roughness"), Some(&AttrValue::Float(0.0)));
        assert!(!desc.has_attribute("color_tex"));
    }

    #[test]
    fn test_into_parts_is_key_ordered() {
        let mut desc = PluginDesc::new("n", "Node");
        desc.set_attribute("visible", true);
        desc.set_attribute("geometry", AttrPlugin::new("geom"));
        desc.set_attribute("material", AttrPlugin::new("mtl"));

        let (name, plugin_type, attrs) = desc.into_parts();
        let keys: Vec<&str> = attrs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(name, "n");
        assert_eq!(plugin_type, "Node");
        assert_eq!(keys, vec!["geometry", "material", "visible"]);
    }

    #[test]
    fn test_remove_attribute() {
        let mut desc = PluginDesc::new("n", "Node");
        desc.set_attribute("visible", true);
        assert_eq!(desc.remove_attribute("visible"), Some(AttrValue::Bool(true)));
        assert_eq!(desc.remove_attribute("visible"), None);
    }
}
