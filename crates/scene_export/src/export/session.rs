//! # Export Session
//!
//! Owns everything that outlives a single pass: configuration, registries,
//! naming, trackers, the change log and the motion blur schedule. Passes
//! borrow the scene and the renderer for their duration only.
//!
//! ## Passes
//!
//! - **Full**: regenerate every plugin, then delete what was owned before
//!   and not produced again
//! - **Partial**: re-derive only what the change log names
//! - **Animation**: a full pass per motion blur sample, exporting only the
//!   objects scheduled at each sample
//!
//! A fatal error leaves the trackers mid-pass; call
//! [`ExportSession::reset`] before the next pass in that case.

use super::context::{ExportContext, ExportState};
use super::error::{ExportError, ExportResult};
use super::motion_blur::MotionBlurBuilder;
use super::report::ExportReport;
use super::scene_exporter::SceneExporter;
use super::settings::export_settings;
use super::update_tracker::{UpdateFlags, UpdateTarget};
use crate::core::config::ExportConfig;
use crate::plugin::{HookRegistry, SchemaRegistry};
use crate::renderer::RendererBoundary;
use crate::scene::{ObjectKind, Scene, TrackId};
use log::{debug, info};
use std::cell::Cell;
use std::collections::{BTreeSet, HashSet};

/// Marks a pass as running for as long as it is alive
pub struct PassGuard<'s> {
    flag: &'s Cell<bool>,
}

impl<'s> PassGuard<'s> {
    /// Mark the pass started, failing if one is already running
    pub fn acquire(flag: &'s Cell<bool>) -> ExportResult<Self> {
        if flag.replace(true) {
            return Err(ExportError::PassInProgress);
        }
        Ok(Self { flag })
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// Long-lived exporter state for one renderer session
pub struct ExportSession {
    config: ExportConfig,
    schemas: SchemaRegistry,
    hooks: HookRegistry,
    state: ExportState,
    motion_blur: MotionBlurBuilder,
    in_pass: Cell<bool>,
}

impl ExportSession {
    /// Create a session with the built-in plugin set
    pub fn new(config: ExportConfig) -> Self {
        Self::with_registries(config, SchemaRegistry::with_builtin(), HookRegistry::with_builtin())
    }

    /// Create a session with custom registries
    ///
    /// Plugin types listed in the configuration are added to the skip
    /// registry.
    pub fn with_registries(config: ExportConfig, mut schemas: SchemaRegistry, hooks: HookRegistry) -> Self {
        for plugin_type in &config.exporter.skip_plugins {
            schemas.skip(plugin_type.clone());
        }
        let state = ExportState::new(config.exporter.strict_naming);
        Self {
            config,
            schemas,
            hooks,
            state,
            motion_blur: MotionBlurBuilder::new(),
            in_pass: Cell::new(false),
        }
    }

    /// Session configuration
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Plugin schemas
    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    /// Plugin hooks
    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Exporter state
    pub fn state(&self) -> &ExportState {
        &self.state
    }

    /// Motion blur schedule of the last animation export
    pub fn motion_blur(&self) -> &MotionBlurBuilder {
        &self.motion_blur
    }

    /// Record a change for the next partial pass
    pub fn tag_update(&mut self, id: TrackId, target: UpdateTarget, flags: UpdateFlags) {
        self.state.updates.tag_update(id, target, flags);
    }

    /// Record an edit of `property` on a node of `plugin_type`, letting the
    /// type's hooks decide whether it is a value or a structure change
    pub fn notify_node_changed(
        &mut self,
        id: TrackId,
        target: UpdateTarget,
        plugin_type: &str,
        property: &str,
    ) -> UpdateFlags {
        let flags = self
            .hooks
            .get(plugin_type)
            .map_or(UpdateFlags::DATA, |hooks| hooks.node_update(property));
        debug!("{plugin_type}.{property} changed on {id}: {flags:?}");
        self.state.updates.tag_update(id, target, flags);
        flags
    }

    fn validate_config(&self) -> ExportResult<()> {
        self.config
            .validate()
            .map_err(|e| ExportError::InvalidConfig(e.to_string()))
    }

    /// Forget everything, as when the renderer session restarts
    pub fn reset(&mut self) {
        info!("Resetting export session");
        self.state.clear();
        self.motion_blur = MotionBlurBuilder::new();
    }

    /// Export the whole scene
    pub fn export_full(&mut self, scene: &Scene, renderer: &mut dyn RendererBoundary) -> ExportResult<ExportReport> {
        let _guard = PassGuard::acquire(&self.in_pass)?;
        self.validate_config()?;
        let mut report = ExportReport::default();

        self.state.updates.clear();
        self.state.objects.begin_full_pass();
        self.state.begin_pass(scene.frame());

        let mut ctx = ExportContext::new(&self.schemas, &self.hooks, scene, &mut self.state, renderer);
        {
            let mut exporter = SceneExporter::new(&mut ctx, &mut report);
            let world = exporter.export_world()?;
            export_settings(exporter.context(), &self.config, world.as_ref())?;
            exporter.export_materials()?;
            exporter.export_objects()?;
        }

        let stale = ctx.state_mut().objects.end_full_pass();
        ctx.delete_plugins(&stale)?;
        report.deleted = stale;

        info!("Full export: {report}");
        Ok(report)
    }

    /// Re-export what changed since the last pass
    pub fn export_partial(&mut self, scene: &Scene, renderer: &mut dyn RendererBoundary) -> ExportResult<ExportReport> {
        let _guard = PassGuard::acquire(&self.in_pass)?;
        self.validate_config()?;
        let mut report = ExportReport::default();

        let updates = &self.state.updates;
        let materials = updates.get_updates_of_type(UpdateTarget::Material, UpdateFlags::BOTH);
        let lights = updates.get_updates_of_type(UpdateTarget::Light, UpdateFlags::BOTH);
        let objects = updates.get_updates_of_type(UpdateTarget::Object, UpdateFlags::BOTH);
        let bindings = updates.get_updates_of_type(UpdateTarget::ObjectMaterialOptions, UpdateFlags::BOTH);

        self.state.begin_pass(scene.frame());
        let mut ctx = ExportContext::new(&self.schemas, &self.hooks, scene, &mut self.state, renderer);
        let mut rebuilt = HashSet::new();
        let mut rebind = BTreeSet::new();

        {
            let mut exporter = SceneExporter::new(&mut ctx, &mut report);

            for (id, _) in &materials {
                let before = exporter.context().state().material_plugin(*id).cloned();
                rebuild_entity(&mut exporter, *id, |exporter| exporter.export_material(*id).map(drop))?;
                let after = exporter.context().state().material_plugin(*id).cloned();
                if before != after {
                    rebind.extend(scene.objects_using_material(*id));
                }
            }

            for (id, _) in &lights {
                rebuild_entity(&mut exporter, *id, |exporter| exporter.export_object(*id))?;
                rebuilt.insert(*id);
            }

            for (id, flags) in &objects {
                if flags.contains(UpdateFlags::TOPOLOGY) {
                    if rebuilt.insert(*id) {
                        rebuild_entity(&mut exporter, *id, |exporter| exporter.export_object(*id))?;
                    }
                } else if !rebuilt.contains(id) {
                    exporter.refresh_transform(*id)?;
                }
            }

            rebind.extend(bindings.iter().map(|(id, _)| *id));
            for id in rebind {
                if rebuilt.contains(&id) {
                    continue;
                }
                let is_mesh = scene
                    .object(id)
                    .is_some_and(|object| matches!(object.kind, ObjectKind::Mesh(_)));
                if is_mesh {
                    rebuild_entity(&mut exporter, id, |exporter| exporter.rebind_materials(id))?;
                }
            }
        }

        // Entities that left the scene without an update record
        for id in ctx.state().objects.tracked_entities() {
            if id == TrackId::SCENE || scene.contains(id) {
                continue;
            }
            let names = ctx.state_mut().objects.forget(id);
            ctx.state_mut().forget_material(id);
            ctx.delete_plugins(&names)?;
            report.deleted.extend(names);
        }

        ctx.state_mut().updates.clear();
        info!("Partial export: {report}");
        Ok(report)
    }

    /// Export the animation range with motion blur sampling
    ///
    /// Shared plugins are exported once; objects are exported at every
    /// sample the schedule includes them in, and the renderer is told when
    /// the last sample of a frame interval was sent.
    pub fn export_animation(&mut self, scene: &Scene, renderer: &mut dyn RendererBoundary) -> ExportResult<ExportReport> {
        let _guard = PassGuard::acquire(&self.in_pass)?;
        self.validate_config()?;
        let mut report = ExportReport::default();

        self.motion_blur
            .initialize(&self.config.motion_blur, scene, &self.config.animation);
        self.state.updates.clear();
        self.state.objects.begin_full_pass();
        self.state.begin_pass(scene.frame());

        let object_ids = scene.object_ids();
        let mut ctx = ExportContext::new(&self.schemas, &self.hooks, scene, &mut self.state, renderer);
        {
            let mut exporter = SceneExporter::new(&mut ctx, &mut report);
            let world = exporter.export_world()?;
            export_settings(exporter.context(), &self.config, world.as_ref())?;
            exporter.export_materials()?;

            let mut exported = HashSet::new();
            let mut samples = 0;
            let mut committed = 0;
            for time in self.motion_blur.frames() {
                let frame = self.motion_blur.scene_frame(time);
                exporter.context().state_mut().set_frame(frame);
                exporter.context().renderer().set_current_time(frame)?;

                for id in self.motion_blur.objects_for_export(&object_ids) {
                    if exported.insert(id) {
                        exporter.export_object(id)?;
                    } else {
                        exporter.refresh_transform(id)?;
                    }
                }
                samples += 1;

                if self.motion_blur.current_data().is_some_and(|data| data.last_in_interval) {
                    exporter.context().renderer().commit_frame(frame)?;
                    committed += 1;
                }
            }
            // objects never scheduled still need their plugins
            for id in &object_ids {
                if exported.insert(*id) {
                    exporter.export_object(*id)?;
                }
            }
            drop(exporter);
            report.samples = samples;
            report.committed = committed;
        }

        let stale = ctx.state_mut().objects.end_full_pass();
        ctx.delete_plugins(&stale)?;
        report.deleted = stale;

        info!("Animation export: {report}");
        Ok(report)
    }
}

/// Rebuild one entity's plugins, deleting those it no longer produces
fn rebuild_entity<'c, 'a>(
    exporter: &mut SceneExporter<'c, 'a>,
    id: TrackId,
    rebuild: impl FnOnce(&mut SceneExporter<'c, 'a>) -> ExportResult<()>,
) -> ExportResult<()> {
    exporter.context().state_mut().objects.begin_entity(id);
    rebuild(exporter)?;
    let stale = exporter.context().state_mut().objects.end_entity(id);
    exporter.context().delete_plugins(&stale)?;
    exporter.record_deleted(stale);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::MotionBlurSettings;
    use crate::renderer::RecordingRenderer;

    #[test]
    fn test_pass_guard_rejects_reentry() {
        let flag = Cell::new(false);
        let guard = PassGuard::acquire(&flag).unwrap();
        assert_eq!(PassGuard::acquire(&flag).err(), Some(ExportError::PassInProgress));
        drop(guard);
        assert!(PassGuard::acquire(&flag).is_ok());
    }

    #[test]
    fn test_skip_plugins_from_config() {
        let mut config = ExportConfig::new();
        config.exporter.skip_plugins.push("TexChecker".to_string());
        let session = ExportSession::new(config);
        assert!(session.schemas().is_skipped("TexChecker"));
        assert!(session.schemas().is_skipped("BitmapBuffer"));
    }

    #[test]
    fn test_notify_uses_node_update_hook() {
        let mut session = ExportSession::new(ExportConfig::new());
        let id = TrackId::new(3);
        let flags = session.notify_node_changed(id, UpdateTarget::Material, "TexBitmap", "file");
        assert_eq!(flags, UpdateFlags::BOTH);
        let flags = session.notify_node_changed(TrackId::new(4), UpdateTarget::Material, "BRDFDiffuse", "color");
        assert_eq!(flags, UpdateFlags::DATA);
        assert_eq!(session.state().updates.flags(UpdateTarget::Material, id), UpdateFlags::BOTH);
    }

    #[test]
    fn test_empty_scene_exports_settings_only() {
        let mut session = ExportSession::new(ExportConfig::new());
        let mut renderer = RecordingRenderer::new();
        let report = session.export_full(&Scene::new(), &mut renderer).unwrap();

        assert!(report.is_clean());
        assert_eq!(report.exported_entities, 0);
        assert_eq!(
            renderer.plugin_names(),
            vec!["SettingsEnvironment", "SettingsMotionBlur", "SettingsOutput", "SettingsUnitsInfo"]
        );
    }

    #[test]
    fn test_invalid_config_rejected_before_export() {
        let config = ExportConfig::new().with_motion_blur(MotionBlurSettings::new(f64::NAN, 0.0, 2));
        let mut session = ExportSession::new(config);
        let mut renderer = RecordingRenderer::new();

        let result = session.export_animation(&Scene::new(), &mut renderer);
        assert!(matches!(result, Err(ExportError::InvalidConfig(_))));
        assert!(matches!(
            session.export_full(&Scene::new(), &mut renderer),
            Err(ExportError::InvalidConfig(_))
        ));
        assert!(renderer.plugin_names().is_empty());
        assert!(session.motion_blur().is_empty());
    }

    #[test]
    fn test_reset_clears_trackers() {
        let mut session = ExportSession::new(ExportConfig::new());
        let mut renderer = RecordingRenderer::new();
        session.export_full(&Scene::new(), &mut renderer).unwrap();
        assert!(!session.state().objects.tracked_entities().is_empty());

        session.tag_update(TrackId::new(1), UpdateTarget::Object, UpdateFlags::DATA);
        session.reset();
        assert!(session.state().objects.tracked_entities().is_empty());
        assert!(session.state().updates.is_empty());
    }
}
