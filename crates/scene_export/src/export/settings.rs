//! Global settings plugins
//!
//! Settings are not node trees: each settings-category schema is exported
//! once per pass under its singleton name. Values derived from the export
//! configuration come first, scene overrides are applied on top.

use super::context::ExportContext;
use super::error::ExportResult;
use crate::core::config::ExportConfig;
use crate::plugin::{AttrPlugin, PluginDesc};
use crate::scene::TrackId;
use log::{debug, warn};

/// Export every settings plugin
///
/// `world` is the root plugin of the world tree, bound as the environment
/// background and GI texture when present.
pub fn export_settings(
    ctx: &mut ExportContext<'_>,
    config: &ExportConfig,
    world: Option<&AttrPlugin>,
) -> ExportResult<Vec<AttrPlugin>> {
    let schemas = ctx.schemas();
    let mut exported = Vec::new();

    for schema in schemas.settings() {
        let plugin_type = schema.plugin_type();
        let name = ctx.state().naming.singleton_plugin(plugin_type);
        let mut desc = PluginDesc::from_schema(name, schema);

        derive_from_config(&mut desc, config, world);

        for (attr, value) in ctx.scene().settings_for(plugin_type) {
            if schema.attr(attr).is_some() {
                desc.set_attribute(attr, value.clone());
            } else {
                warn!("Ignoring override {attr} on {plugin_type}: no such attribute");
            }
        }

        debug!("Export settings {plugin_type}");
        exported.push(ctx.emit(TrackId::SCENE, desc)?);
    }
    Ok(exported)
}

fn derive_from_config(desc: &mut PluginDesc, config: &ExportConfig, world: Option<&AttrPlugin>) {
    match desc.plugin_type() {
        "SettingsOutput" => {
            let animation = &config.animation;
            desc.set_attribute("anim_start", animation.frame_start);
            desc.set_attribute("anim_end", animation.frame_end);
            desc.set_attribute("frame_step", animation.frame_step);
        }
        "SettingsMotionBlur" => {
            let blur = &config.motion_blur;
            desc.set_attribute("on", !blur.is_degenerate());
            desc.set_attribute("duration", blur.duration as f32);
            desc.set_attribute("interval_center", blur.interval_center as f32);
            desc.set_attribute("geom_samples", i64::from(blur.geom_samples));
        }
        "SettingsEnvironment" => {
            if let Some(world) = world {
                desc.set_attribute("bg_tex", world.clone());
                desc.set_attribute("gi_tex", world.clone());
            }
        }
        _ => {}
    }
}
