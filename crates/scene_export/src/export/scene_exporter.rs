//! Scene-level export: materials, objects, lights and the world
//!
//! Per-tree failures are isolated here. A tree-local error is logged,
//! recorded in the report, and the rest of the scene carries on; any other
//! error aborts the pass.

use super::context::ExportContext;
use super::error::{ExportError, ExportResult};
use super::node_tree::export_tree;
use super::report::{ExportReport, TreeFailure};
use crate::plugin::{AttrPlugin, AttrValue};
use crate::scene::{MeshData, NodeTree, ObjectKind, SceneObject, TrackId};
use log::{debug, error, warn};

/// Drives the export of scene entities within one pass
pub struct SceneExporter<'c, 'a> {
    ctx: &'c mut ExportContext<'a>,
    report: &'c mut ExportReport,
}

impl<'c, 'a> SceneExporter<'c, 'a> {
    /// Create an exporter writing into `report`
    pub fn new(ctx: &'c mut ExportContext<'a>, report: &'c mut ExportReport) -> Self {
        Self { ctx, report }
    }

    /// Shared export context
    pub fn context(&mut self) -> &mut ExportContext<'a> {
        &mut *self.ctx
    }

    /// Record plugins deleted on behalf of this pass
    pub fn record_deleted(&mut self, names: Vec<String>) {
        self.report.deleted.extend(names);
    }

    /// Export one tree, containing tree-local failures
    ///
    /// Returns `None` when the tree failed.
    pub fn export_isolated_tree(&mut self, owner: TrackId, tree: &'a NodeTree) -> ExportResult<Option<AttrPlugin>> {
        match export_tree(self.ctx, owner, tree) {
            Ok(plugin) => {
                self.report.exported_trees += 1;
                Ok(Some(plugin))
            }
            Err(err) if err.is_tree_local() => {
                error!("Export of tree {} owned by {} failed: {}", tree.name(), owner, err);
                self.report.failed_trees.push(TreeFailure {
                    owner,
                    tree: tree.name().to_string(),
                    error: err,
                });
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Export the world tree, returning its root plugin
    pub fn export_world(&mut self) -> ExportResult<Option<AttrPlugin>> {
        match self.ctx.scene().world() {
            Some(tree) => self.export_isolated_tree(TrackId::SCENE, tree),
            None => Ok(None),
        }
    }

    /// Export every material
    pub fn export_materials(&mut self) -> ExportResult<()> {
        let scene = self.ctx.scene();
        for material in scene.materials() {
            self.export_material(material.track_id)?;
        }
        Ok(())
    }

    /// Export one material tree and remember its root plugin
    pub fn export_material(&mut self, id: TrackId) -> ExportResult<Option<AttrPlugin>> {
        let material = match self.ctx.scene().material(id) {
            Some(material) => material,
            None => return Ok(None),
        };
        self.report.exported_entities += 1;

        let plugin = self.export_isolated_tree(id, &material.tree)?;
        match &plugin {
            Some(plugin) => self.ctx.state_mut().set_material_plugin(id, plugin.clone()),
            None => self.ctx.state_mut().forget_material(id),
        }
        Ok(plugin)
    }

    /// Export every object
    pub fn export_objects(&mut self) -> ExportResult<()> {
        for id in self.ctx.scene().object_ids() {
            self.export_object(id)?;
        }
        Ok(())
    }

    /// Export one object with everything it produces
    pub fn export_object(&mut self, id: TrackId) -> ExportResult<()> {
        let object = match self.ctx.scene().object(id) {
            Some(object) => object,
            None => return Ok(()),
        };
        self.report.exported_entities += 1;

        match &object.kind {
            ObjectKind::Light(light) => {
                self.export_isolated_tree(id, &light.tree)?;
            }
            ObjectKind::Mesh(mesh) => {
                let geometry = self.export_geometry(mesh)?;
                let material = self.bind_materials(object)?;
                self.export_instance(object, geometry, material)?;
            }
            ObjectKind::Empty => {}
        }
        Ok(())
    }

    /// Re-send what depends on an object's transform only
    pub fn refresh_transform(&mut self, id: TrackId) -> ExportResult<()> {
        let object = match self.ctx.scene().object(id) {
            Some(object) => object,
            None => return Ok(()),
        };
        self.report.exported_entities += 1;

        match &object.kind {
            ObjectKind::Light(light) => {
                self.export_isolated_tree(id, &light.tree)?;
            }
            ObjectKind::Mesh(mesh) => {
                let geometry = AttrPlugin::new(self.ctx.state().naming.object_data(mesh.track_id));
                let material = self.current_material(object)?;
                self.export_instance(object, geometry, material)?;
            }
            ObjectKind::Empty => {}
        }
        Ok(())
    }

    /// Re-bind an object's material slots
    pub fn rebind_materials(&mut self, id: TrackId) -> ExportResult<()> {
        let object = match self.ctx.scene().object(id) {
            Some(object) => object,
            None => return Ok(()),
        };
        if let ObjectKind::Mesh(mesh) = &object.kind {
            self.report.exported_entities += 1;
            let geometry = AttrPlugin::new(self.ctx.state().naming.object_data(mesh.track_id));
            let material = self.bind_materials(object)?;
            self.export_instance(object, geometry, material)?;
        }
        Ok(())
    }

    fn export_geometry(&mut self, mesh: &MeshData) -> ExportResult<AttrPlugin> {
        let name = self.ctx.state().naming.object_data(mesh.track_id);
        let mut desc = self.ctx.descriptor(name, "GeomStaticMesh")?;
        let schema = self.ctx.schemas().get("GeomStaticMesh");
        for (attr, value) in &mesh.attributes {
            if schema.is_some_and(|s| s.attr(attr).is_some()) {
                desc.set_attribute(attr.clone(), value.clone());
            } else {
                warn!("GeomStaticMesh has no attribute {attr}");
            }
        }
        self.ctx.emit(mesh.track_id, desc)
    }

    /// Material plugin for an object's slots, emitting a `MtlMulti` for
    /// more than one slot
    fn bind_materials(&mut self, object: &SceneObject) -> ExportResult<AttrPlugin> {
        let mut slots = Vec::with_capacity(object.materials.len());
        for material in &object.materials {
            slots.push(self.material_or_default(*material)?);
        }

        match slots.len() {
            0 => self.default_material(),
            1 => Ok(slots.remove(0)),
            _ => {
                let name = self.ctx.state().naming.object_virtual(object.track_id, "MtlMulti");
                let mut desc = self.ctx.descriptor(name, "MtlMulti")?;
                let ids = (0..slots.len() as i64).map(AttrValue::Int).collect();
                desc.set_attribute("mtls_list", AttrValue::List(slots.into_iter().map(AttrValue::Plugin).collect()));
                desc.set_attribute("ids_list", AttrValue::List(ids));
                self.ctx.emit(object.track_id, desc)
            }
        }
    }

    /// Material plugin an object is currently bound to, without re-emitting
    /// the binding
    fn current_material(&mut self, object: &SceneObject) -> ExportResult<AttrPlugin> {
        match object.materials.as_slice() {
            [] => self.default_material(),
            [material] => self.material_or_default(*material),
            _ => Ok(AttrPlugin::new(
                self.ctx.state().naming.object_virtual(object.track_id, "MtlMulti"),
            )),
        }
    }

    fn material_or_default(&mut self, material: TrackId) -> ExportResult<AttrPlugin> {
        match self.ctx.state().material_plugin(material) {
            Some(plugin) => Ok(plugin.clone()),
            None => {
                debug!("Material {material} not exported, binding the default material");
                self.default_material()
            }
        }
    }

    fn default_material(&mut self) -> ExportResult<AttrPlugin> {
        let brdf = self.ctx.default_plugin("BRDFDiffuse")?;
        self.ctx
            .default_plugin_with("MtlSingleBRDF", |desc| desc.set_attribute("brdf", brdf))
    }

    fn export_instance(&mut self, object: &SceneObject, geometry: AttrPlugin, material: AttrPlugin) -> ExportResult<()> {
        let name = self.ctx.state().naming.object(object.track_id);
        let mut desc = self.ctx.descriptor(name, "Node")?;
        desc.set_attribute("transform", object.transform.matrix_at(self.ctx.frame()));
        desc.set_attribute("geometry", geometry);
        desc.set_attribute("material", material);
        desc.set_attribute("visible", object.visible);
        let object_id = i64::try_from(object.track_id.id()).map_err(|_| ExportError::HookFailure {
            plugin_type: "Node".to_string(),
            node: object.name.clone(),
            message: format!("identity {} does not fit objectID", object.track_id),
        })?;
        desc.set_attribute("objectID", object_id);
        self.ctx.emit(object.track_id, desc)?;
        Ok(())
    }
}
