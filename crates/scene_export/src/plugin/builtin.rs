//! Built-in plugin schemas and hooks
//!
//! Covers the shipped node set: BRDFs, materials, textures, UVW
//! generators, lights, scene instances and the global settings plugins.

use super::descriptor::PluginDesc;
use super::hooks::{HookRegistry, PluginHooks};
use super::schema::{AttrDef, PluginCategory, PluginSchema, SchemaRegistry};
use super::value::{AttrKind, AttrPlugin, AttrValue};
use crate::export::{ExportResult, NodeContext, TreeExporter, UpdateFlags};
use crate::foundation::math::{Vec3, Vec4};

/// Types only ever created by hand, never from node-tree traversal
pub const SKIPPED_PLUGINS: [&str; 5] = ["BitmapBuffer", "GeomStaticMesh", "MtlMulti", "Node", "TexAColor"];

/// Register every built-in schema and the skip registry
pub fn register_schemas(registry: &mut SchemaRegistry) {
    use AttrKind::*;

    let grey = |v: f32| AttrValue::Color(Vec3::new(v, v, v));
    let opaque = |v: f32| AttrValue::AColor(Vec4::new(v, v, v, 1.0));

    // BRDFs and materials
    registry.register(
        PluginSchema::new("BRDFDiffuse", PluginCategory::Brdf)
            .with_attr(AttrDef::new("color", Color).with_default(grey(0.8)))
            .with_attr(AttrDef::new("color_tex", Plugin))
            .with_attr(AttrDef::new("roughness", Float).with_default(0.0_f32))
            .with_attr(AttrDef::new("transparency", Color).with_default(grey(0.0))),
    );
    registry.register(
        PluginSchema::new("BRDFVRayMtl", PluginCategory::Brdf)
            .with_attr(AttrDef::new("diffuse", Color).with_default(grey(0.5)))
            .with_attr(AttrDef::new("diffuse_tex", Plugin))
            .with_attr(AttrDef::new("reflect", Color).with_default(grey(0.0)))
            .with_attr(AttrDef::new("reflect_glossiness", Float).with_default(1.0_f32))
            .with_attr(AttrDef::new("fresnel", Bool).with_default(true))
            .with_attr(AttrDef::new("fresnel_ior", Float).with_default(1.6_f32))
            .with_attr(AttrDef::new("refract", Color).with_default(grey(0.0)))
            .with_attr(AttrDef::new("refract_ior", Float).with_default(1.6_f32))
            .with_attr(AttrDef::new("opacity", Float).with_default(1.0_f32)),
    );
    registry.register(
        PluginSchema::new("MtlSingleBRDF", PluginCategory::Material)
            .with_attr(AttrDef::new("brdf", Plugin))
            .with_attr(AttrDef::new("double_sided", Bool).with_default(true)),
    );
    registry.register(
        PluginSchema::new("MtlMulti", PluginCategory::Material)
            .with_attr(AttrDef::new("mtls_list", List))
            .with_attr(AttrDef::new("ids_list", List)),
    );

    // Textures
    registry.register(
        PluginSchema::new("BitmapBuffer", PluginCategory::Texture)
            .with_attr(AttrDef::new("file", String))
            .with_attr(AttrDef::new("filter_type", Int).with_default(1))
            .with_attr(AttrDef::new("gamma", Float).with_default(1.0_f32)),
    );
    registry.register(
        PluginSchema::new("TexBitmap", PluginCategory::Texture)
            .with_attr(AttrDef::new("bitmap", Plugin))
            .with_attr(AttrDef::new("uvwgen", Plugin))
            .with_attr(AttrDef::new("tile", Int).with_default(1))
            .with_attr(AttrDef::new("color_mult", AColor).with_default(opaque(1.0))),
    );
    registry.register(
        PluginSchema::new("TexAColor", PluginCategory::Texture)
            .with_attr(AttrDef::new("texture", AColor).with_default(opaque(1.0))),
    );
    registry.register(
        PluginSchema::new("TexLayered", PluginCategory::Texture)
            .with_attr(AttrDef::new("textures", List))
            .with_attr(AttrDef::new("blend_modes", List))
            .with_attr(AttrDef::new("alpha_from_intensity", Bool).with_default(false)),
    );
    registry.register(
        PluginSchema::new("TexChecker", PluginCategory::Texture)
            .with_attr(AttrDef::new("white_color", AColor).with_default(opaque(1.0)))
            .with_attr(AttrDef::new("black_color", AColor).with_default(opaque(0.0)))
            .with_attr(AttrDef::new("uvwgen", Plugin)),
    );
    registry.register(
        PluginSchema::new("UVWGenChannel", PluginCategory::Uvwgen)
            .with_attr(AttrDef::new("uvw_channel", Int).with_default(1))
            .with_attr(AttrDef::new("uvw_transform", Matrix))
            .with_attr(AttrDef::new("wrap_u", Int).with_default(1))
            .with_attr(AttrDef::new("wrap_v", Int).with_default(1)),
    );

    // Lights
    registry.register(
        PluginSchema::new("LightOmni", PluginCategory::Light)
            .with_attr(AttrDef::new("color", Color).with_default(grey(1.0)))
            .with_attr(AttrDef::new("intensity", Float).with_default(1.0_f32))
            .with_attr(AttrDef::new("transform", Matrix))
            .with_attr(AttrDef::new("enabled", Bool).with_default(true))
            .with_attr(AttrDef::new("shadows", Bool).with_default(true))
            .with_attr(AttrDef::new("decay", Float).with_default(2.0_f32)),
    );
    registry.register(
        PluginSchema::new("LightRectangle", PluginCategory::Light)
            .with_attr(AttrDef::new("color", Color).with_default(grey(1.0)))
            .with_attr(AttrDef::new("intensity", Float).with_default(1.0_f32))
            .with_attr(AttrDef::new("transform", Matrix))
            .with_attr(AttrDef::new("enabled", Bool).with_default(true))
            .with_attr(AttrDef::new("u_size", Float).with_default(1.0_f32))
            .with_attr(AttrDef::new("v_size", Float).with_default(1.0_f32))
            .with_attr(AttrDef::new("is_disc", Bool).with_default(false))
            .with_attr(AttrDef::new("invisible", Bool).with_default(false)),
    );

    // Instances and geometry
    registry.register(
        PluginSchema::new("Node", PluginCategory::Node)
            .with_attr(AttrDef::new("transform", Matrix))
            .with_attr(AttrDef::new("geometry", Plugin))
            .with_attr(AttrDef::new("material", Plugin))
            .with_attr(AttrDef::new("visible", Bool).with_default(true))
            .with_attr(AttrDef::new("objectID", Int).with_default(0)),
    );
    registry.register(
        PluginSchema::new("GeomStaticMesh", PluginCategory::Geometry)
            .with_attr(AttrDef::new("vertices", List))
            .with_attr(AttrDef::new("faces", List))
            .with_attr(AttrDef::new("normals", List))
            .with_attr(AttrDef::new("dynamic_geometry", Bool).with_default(false)),
    );

    // Settings
    registry.register(
        PluginSchema::new("SettingsOutput", PluginCategory::Settings)
            .with_attr(AttrDef::new("img_width", Int).with_default(640))
            .with_attr(AttrDef::new("img_height", Int).with_default(480))
            .with_attr(AttrDef::new("img_file", String))
            .with_attr(AttrDef::new("anim_start", Int).with_default(1))
            .with_attr(AttrDef::new("anim_end", Int).with_default(1))
            .with_attr(AttrDef::new("frame_step", Int).with_default(1)),
    );
    registry.register(
        PluginSchema::new("SettingsMotionBlur", PluginCategory::Settings)
            .with_attr(AttrDef::new("on", Bool).with_default(false))
            .with_attr(AttrDef::new("duration", Float).with_default(1.0_f32))
            .with_attr(AttrDef::new("interval_center", Float).with_default(0.5_f32))
            .with_attr(AttrDef::new("geom_samples", Int).with_default(2)),
    );
    registry.register(
        PluginSchema::new("SettingsEnvironment", PluginCategory::Settings)
            .with_attr(AttrDef::new("bg_color", Color).with_default(grey(0.0)))
            .with_attr(AttrDef::new("bg_tex", Plugin))
            .with_attr(AttrDef::new("gi_tex", Plugin)),
    );
    registry.register(
        PluginSchema::new("SettingsUnitsInfo", PluginCategory::Settings)
            .with_attr(AttrDef::new("meters_scale", Float).with_default(1.0_f32))
            .with_attr(AttrDef::new("photometric_scale", Float).with_default(0.002_f32)),
    );

    for plugin_type in SKIPPED_PLUGINS {
        registry.skip(plugin_type);
    }
}

/// Register every built-in hook set
pub fn register_hooks(registry: &mut HookRegistry) {
    registry.register("TexBitmap", TexBitmapHooks);
    registry.register("TexLayered", TexLayeredHooks);
    registry.register("TexChecker", TexCheckerHooks);
    registry.register("BRDFVRayMtl", VRayMtlHooks);
    registry.register("LightOmni", LightHooks { rectangle: false });
    registry.register("LightRectangle", LightHooks { rectangle: true });
}

/// Replace an unset `uvwgen` with the shared default generator
fn ensure_uvwgen(exporter: &mut TreeExporter<'_, '_>, desc: &mut PluginDesc) -> ExportResult<()> {
    let unset = desc
        .attribute("uvwgen")
        .and_then(AttrValue::as_plugin)
        .map_or(true, AttrPlugin::is_empty);
    if unset {
        let uvwgen = exporter.default_plugin("UVWGenChannel")?;
        desc.set_attribute("uvwgen", uvwgen);
    }
    Ok(())
}

/// Bitmap texture: synthesizes a `BitmapBuffer` for the image file and a
/// default UVW generator when nothing is linked into the mapping socket
struct TexBitmapHooks;

impl TexBitmapHooks {
    fn export(&self, exporter: &mut TreeExporter<'_, '_>, node: NodeContext<'_>) -> ExportResult<AttrPlugin> {
        let file = node.property("file").and_then(AttrValue::as_str).unwrap_or_default();
        if file.is_empty() {
            return Err(exporter.hook_failure(node, "no image file set"));
        }

        let mut buffer = exporter.virtual_descriptor(node, "BitmapBuffer", None)?;
        buffer.set_attribute("file", file);
        for attr in ["filter_type", "gamma"] {
            if let Some(value) = node.property(attr) {
                buffer.set_attribute(attr, value.clone());
            }
        }
        let buffer = exporter.emit(buffer)?;

        let mut desc = exporter.descriptor(node, "TexBitmap")?;
        desc.set_attribute("bitmap", buffer);
        if let Some(uvwgen) = exporter.export_optional_socket(node, "Mapping")? {
            desc.set_attribute("uvwgen", uvwgen);
        }
        ensure_uvwgen(exporter, &mut desc)?;

        exporter.export_node_tree(node, &mut desc, &["Mapping"])?;
        exporter.export_custom(node, &mut desc)?;
        exporter.emit(desc)
    }
}

impl PluginHooks for TexBitmapHooks {
    fn export_tree_node(
        &self,
        exporter: &mut TreeExporter<'_, '_>,
        node: NodeContext<'_>,
    ) -> Option<ExportResult<AttrPlugin>> {
        Some(self.export(exporter, node))
    }

    fn node_update(&self, property: &str) -> UpdateFlags {
        // a new file means a new buffer plugin
        if property == "file" {
            UpdateFlags::BOTH
        } else {
            UpdateFlags::DATA
        }
    }
}

/// Layered texture: every socket feeding `textures` becomes one list item;
/// unlinked items are wrapped in a synthetic `TexAColor`
struct TexLayeredHooks;

impl TexLayeredHooks {
    fn export(&self, exporter: &mut TreeExporter<'_, '_>, node: NodeContext<'_>) -> ExportResult<AttrPlugin> {
        let mut desc = exporter.descriptor(node, "TexLayered")?;
        let mut textures = Vec::new();
        let mut layer_sockets = Vec::new();

        for (slot, socket) in node.node.inputs.iter().enumerate().filter(|(_, s)| s.attr == "textures") {
            layer_sockets.push(socket.name.as_str());

            let texture = match exporter.export_optional_socket(node, &socket.name)? {
                Some(texture) => texture,
                None => {
                    let mut wrapper = exporter.virtual_descriptor(node, "TexAColor", Some(slot))?;
                    if let Some(value) = &socket.value {
                        wrapper.set_attribute("texture", value.clone());
                    }
                    exporter.emit(wrapper)?
                }
            };
            textures.push(AttrValue::Plugin(texture));
        }

        desc.set_attribute("textures", AttrValue::List(textures));
        exporter.export_node_tree(node, &mut desc, &layer_sockets)?;
        exporter.export_custom(node, &mut desc)?;
        exporter.emit(desc)
    }
}

impl PluginHooks for TexLayeredHooks {
    fn export_tree_node(
        &self,
        exporter: &mut TreeExporter<'_, '_>,
        node: NodeContext<'_>,
    ) -> Option<ExportResult<AttrPlugin>> {
        Some(self.export(exporter, node))
    }

    fn node_update(&self, property: &str) -> UpdateFlags {
        if property == "layers" {
            UpdateFlags::TOPOLOGY
        } else {
            UpdateFlags::DATA
        }
    }
}

struct TexCheckerHooks;

impl PluginHooks for TexCheckerHooks {
    fn export_custom(
        &self,
        exporter: &mut TreeExporter<'_, '_>,
        _node: NodeContext<'_>,
        desc: &mut PluginDesc,
    ) -> ExportResult<()> {
        ensure_uvwgen(exporter, desc)
    }
}

/// Clamps glossiness and opacity; drops the IOR when fresnel is off
struct VRayMtlHooks;

impl PluginHooks for VRayMtlHooks {
    fn export_custom(
        &self,
        _exporter: &mut TreeExporter<'_, '_>,
        _node: NodeContext<'_>,
        desc: &mut PluginDesc,
    ) -> ExportResult<()> {
        for attr in ["reflect_glossiness", "opacity"] {
            if let Some(value) = desc.attribute(attr).and_then(AttrValue::as_float) {
                desc.set_attribute(attr, value.clamp(0.0, 1.0));
            }
        }
        if desc.attribute("fresnel").and_then(AttrValue::as_bool) == Some(false) {
            desc.remove_attribute("fresnel_ior");
        }
        Ok(())
    }
}

/// Lights take their transform and visibility from the owning object
struct LightHooks {
    rectangle: bool,
}

impl PluginHooks for LightHooks {
    fn export_custom(
        &self,
        exporter: &mut TreeExporter<'_, '_>,
        node: NodeContext<'_>,
        desc: &mut PluginDesc,
    ) -> ExportResult<()> {
        let object = exporter
            .owner_object()
            .ok_or_else(|| exporter.hook_failure(node, "light tree has no owning object"))?;
        desc.set_attribute("transform", object.transform.matrix_at(exporter.frame()));
        desc.set_attribute("enabled", object.visible);

        if self.rectangle {
            let u_size = desc.attribute("u_size").and_then(AttrValue::as_float).unwrap_or(1.0).abs();
            let v_size = desc.attribute("v_size").and_then(AttrValue::as_float).unwrap_or(1.0).abs();
            let is_disc = desc.attribute("is_disc").and_then(AttrValue::as_bool).unwrap_or(false);
            desc.set_attribute("u_size", u_size);
            desc.set_attribute("v_size", if is_disc { u_size } else { v_size });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_schemas() {
        let registry = SchemaRegistry::with_builtin();
        assert_eq!(registry.len(), 18);
        assert!(registry.get("TexBitmap").is_some_and(|s| s.attr("uvwgen").is_some()));
        assert!(registry.is_skipped("MtlMulti"));
        assert!(!registry.is_skipped("MtlSingleBRDF"));
    }

    #[test]
    fn test_builtin_settings_are_singletons() {
        let registry = SchemaRegistry::with_builtin();
        let settings: Vec<&str> = registry.settings().map(PluginSchema::plugin_type).collect();
        assert_eq!(
            settings,
            vec!["SettingsEnvironment", "SettingsMotionBlur", "SettingsOutput", "SettingsUnitsInfo"]
        );
    }

    #[test]
    fn test_bitmap_file_change_is_topology() {
        let registry = HookRegistry::with_builtin();
        let hooks = registry.get("TexBitmap").unwrap();
        assert!(hooks.node_update("file").contains(UpdateFlags::TOPOLOGY));
        assert_eq!(hooks.node_update("tile"), UpdateFlags::DATA);
    }
}
