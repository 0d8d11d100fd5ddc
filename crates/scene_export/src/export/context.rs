//! State shared by every exporter of one session

use super::error::{ExportError, ExportResult};
use super::naming::NamingService;
use super::object_tracker::ObjectTracker;
use super::update_tracker::UpdateTracker;
use crate::plugin::{AttrPlugin, HookRegistry, PluginDesc, SchemaRegistry};
use crate::renderer::RendererBoundary;
use crate::scene::{Scene, TrackId};
use log::{debug, trace};
use std::collections::{BTreeMap, HashMap};

/// Mutable export state carried across passes
///
/// Owned by the export session; never global.
#[derive(Debug, Default)]
pub struct ExportState {
    /// Name minting and collision guard
    pub naming: NamingService,
    /// Plugin ownership per entity
    pub objects: ObjectTracker,
    /// Changes since the last pass
    pub updates: UpdateTracker,
    /// Shared default plugins created in the current pass, by type
    defaults: HashMap<String, AttrPlugin>,
    /// Root plugin of every successfully exported material
    materials: BTreeMap<TrackId, AttrPlugin>,
    /// Scene frame transforms are sampled at
    frame: f64,
}

impl ExportState {
    /// Create state with the given naming strictness
    pub fn new(strict_naming: bool) -> Self {
        Self {
            naming: NamingService::new(strict_naming),
            ..Default::default()
        }
    }

    /// Reset per-pass caches; trackers are left alone
    pub fn begin_pass(&mut self, frame: f64) {
        self.naming.begin_pass();
        self.defaults.clear();
        self.frame = frame;
    }

    /// Scene frame of the current pass or sample
    pub fn frame(&self) -> f64 {
        self.frame
    }

    /// Move to another sample time without starting a new pass
    pub fn set_frame(&mut self, frame: f64) {
        self.frame = frame;
    }

    /// Remember the root plugin of a material
    pub fn set_material_plugin(&mut self, material: TrackId, plugin: AttrPlugin) {
        self.materials.insert(material, plugin);
    }

    /// Root plugin of a material, if it was exported
    pub fn material_plugin(&self, material: TrackId) -> Option<&AttrPlugin> {
        self.materials.get(&material)
    }

    /// Forget a material's root plugin
    pub fn forget_material(&mut self, material: TrackId) {
        self.materials.remove(&material);
    }

    /// Drop everything, as when the renderer session restarts
    pub fn clear(&mut self) {
        self.naming.begin_pass();
        self.objects.clear();
        self.updates.clear();
        self.defaults.clear();
        self.materials.clear();
    }
}

/// Everything an exporter needs during one pass
pub struct ExportContext<'a> {
    schemas: &'a SchemaRegistry,
    hooks: &'a HookRegistry,
    scene: &'a Scene,
    state: &'a mut ExportState,
    renderer: &'a mut dyn RendererBoundary,
}

impl<'a> ExportContext<'a> {
    /// Bundle the registries, the scene and the session state for a pass
    pub fn new(
        schemas: &'a SchemaRegistry,
        hooks: &'a HookRegistry,
        scene: &'a Scene,
        state: &'a mut ExportState,
        renderer: &'a mut dyn RendererBoundary,
    ) -> Self {
        Self {
            schemas,
            hooks,
            scene,
            state,
            renderer,
        }
    }

    /// Scene being exported
    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    /// Plugin schemas
    pub fn schemas(&self) -> &'a SchemaRegistry {
        self.schemas
    }

    /// Plugin hooks
    pub fn hooks(&self) -> &'a HookRegistry {
        self.hooks
    }

    /// Session state
    pub fn state(&self) -> &ExportState {
        &*self.state
    }

    /// Mutable session state
    pub fn state_mut(&mut self) -> &mut ExportState {
        &mut *self.state
    }

    /// Renderer boundary
    pub fn renderer(&mut self) -> &mut dyn RendererBoundary {
        &mut *self.renderer
    }

    /// Scene frame transforms are sampled at
    pub fn frame(&self) -> f64 {
        self.state.frame()
    }

    /// Descriptor seeded from the schema of `plugin_type`
    pub fn descriptor(&self, name: impl Into<String>, plugin_type: &str) -> ExportResult<PluginDesc> {
        let name = name.into();
        let schema = self
            .schemas
            .get(plugin_type)
            .ok_or_else(|| ExportError::UnresolvedReference {
                plugin_type: plugin_type.to_string(),
                attribute: name.clone(),
            })?;
        Ok(PluginDesc::from_schema(name, schema))
    }

    /// Claim, track and send a finalized descriptor
    pub fn emit(&mut self, owner: TrackId, desc: PluginDesc) -> ExportResult<AttrPlugin> {
        let claimant = match desc.source_node() {
            Some(handle) => format!("{}:{:?}:{}", handle.owner, handle.node, desc.plugin_type()),
            None => format!("{}:{}", owner, desc.plugin_type()),
        };
        self.state.naming.claim(desc.name(), &claimant)?;
        self.state.objects.track_plugin(owner, desc.name())?;

        trace!("Export {} [{}] for {}", desc.name(), desc.plugin_type(), owner);
        let plugin = desc.as_plugin();
        self.renderer.send(desc)?;
        Ok(plugin)
    }

    /// Shared default instance of a plugin type, created on first use in a pass
    pub fn default_plugin(&mut self, plugin_type: &str) -> ExportResult<AttrPlugin> {
        self.default_plugin_with(plugin_type, |_| {})
    }

    /// Like [`default_plugin`](Self::default_plugin), letting the caller
    /// adjust the descriptor when it is first created
    pub fn default_plugin_with(
        &mut self,
        plugin_type: &str,
        configure: impl FnOnce(&mut PluginDesc),
    ) -> ExportResult<AttrPlugin> {
        if let Some(plugin) = self.state.defaults.get(plugin_type) {
            return Ok(plugin.clone());
        }

        let name = self.state.naming.default_plugin(plugin_type);
        let mut desc = self.descriptor(name, plugin_type)?;
        configure(&mut desc);
        let plugin = self.emit(TrackId::SCENE, desc)?;
        self.state.defaults.insert(plugin_type.to_string(), plugin.clone());
        Ok(plugin)
    }

    /// Delete plugins from the renderer
    pub fn delete_plugins(&mut self, names: &[String]) -> ExportResult<()> {
        for name in names {
            debug!("Delete stale plugin {name}");
            self.renderer.delete_plugin(name)?;
        }
        Ok(())
    }
}
