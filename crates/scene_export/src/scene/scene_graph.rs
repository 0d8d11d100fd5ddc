//! The live scene: objects, materials, world and render settings

use super::entity::{MaterialEntity, ObjectKind, SceneObject, TrackId};
use super::node_tree::NodeTree;
use super::SceneError;
use crate::plugin::AttrValue;
use std::collections::BTreeMap;

/// Mutable scene graph consumed by the exporters
///
/// Entities are kept in ordered maps so that iteration, and therefore
/// export order, is deterministic.
#[derive(Debug, Clone)]
pub struct Scene {
    objects: BTreeMap<TrackId, SceneObject>,
    materials: BTreeMap<TrackId, MaterialEntity>,
    world: Option<NodeTree>,
    settings: BTreeMap<String, BTreeMap<String, AttrValue>>,
    frame: f64,
    next_id: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene at frame 1
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            materials: BTreeMap::new(),
            world: None,
            settings: BTreeMap::new(),
            frame: 1.0,
            next_id: 1,
        }
    }

    /// Allocate a fresh identity
    pub fn allocate_id(&mut self) -> TrackId {
        let id = TrackId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn reserve(&mut self, id: TrackId) -> Result<(), SceneError> {
        if id == TrackId::SCENE {
            return Err(SceneError::ReservedId);
        }
        if self.contains(id) {
            return Err(SceneError::DuplicateId(id));
        }
        self.next_id = self.next_id.max(id.id() + 1);
        Ok(())
    }

    /// Insert an object under its own identity
    ///
    /// Mesh data may be shared between mesh objects, but its identity must
    /// not belong to an object or a material.
    pub fn add_object(&mut self, object: SceneObject) -> Result<TrackId, SceneError> {
        let id = object.track_id;
        if let ObjectKind::Mesh(mesh) = &object.kind {
            let data = mesh.track_id;
            if data == TrackId::SCENE {
                return Err(SceneError::ReservedId);
            }
            if data == id || self.objects.contains_key(&data) || self.materials.contains_key(&data) {
                return Err(SceneError::DuplicateId(data));
            }
        }
        self.reserve(id)?;
        if let ObjectKind::Mesh(mesh) = &object.kind {
            self.next_id = self.next_id.max(mesh.track_id.id() + 1);
        }
        self.objects.insert(id, object);
        Ok(id)
    }

    /// Insert a material under its own identity
    pub fn add_material(&mut self, material: MaterialEntity) -> Result<TrackId, SceneError> {
        let id = material.track_id;
        self.reserve(id)?;
        self.materials.insert(id, material);
        Ok(id)
    }

    /// Remove an object
    pub fn remove_object(&mut self, id: TrackId) -> Option<SceneObject> {
        self.objects.remove(&id)
    }

    /// Remove a material; slots referring to it are left dangling
    pub fn remove_material(&mut self, id: TrackId) -> Option<MaterialEntity> {
        self.materials.remove(&id)
    }

    /// Object by identity
    pub fn object(&self, id: TrackId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    /// Mutable object by identity
    pub fn object_mut(&mut self, id: TrackId) -> Option<&mut SceneObject> {
        self.objects.get_mut(&id)
    }

    /// Material by identity
    pub fn material(&self, id: TrackId) -> Option<&MaterialEntity> {
        self.materials.get(&id)
    }

    /// Mutable material by identity
    pub fn material_mut(&mut self, id: TrackId) -> Option<&mut MaterialEntity> {
        self.materials.get_mut(&id)
    }

    /// Objects in identity order
    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.values()
    }

    /// Materials in identity order
    pub fn materials(&self) -> impl Iterator<Item = &MaterialEntity> {
        self.materials.values()
    }

    /// Identities of every object
    pub fn object_ids(&self) -> Vec<TrackId> {
        self.objects.keys().copied().collect()
    }

    /// Objects whose payload is a light
    pub fn lights(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.values().filter(|o| matches!(o.kind, ObjectKind::Light(_)))
    }

    /// Whether any entity has this identity: an object, a material, or
    /// the mesh data of an object
    pub fn contains(&self, id: TrackId) -> bool {
        self.objects.contains_key(&id)
            || self.materials.contains_key(&id)
            || self
                .objects
                .values()
                .any(|o| matches!(&o.kind, ObjectKind::Mesh(mesh) if mesh.track_id == id))
    }

    /// Objects with `material` in one of their slots
    pub fn objects_using_material(&self, material: TrackId) -> Vec<TrackId> {
        self.objects
            .values()
            .filter(|o| o.materials.contains(&material))
            .map(|o| o.track_id)
            .collect()
    }

    /// Replace the world tree
    pub fn set_world(&mut self, tree: NodeTree) {
        self.world = Some(tree);
    }

    /// World tree
    pub fn world(&self) -> Option<&NodeTree> {
        self.world.as_ref()
    }

    /// Override one attribute of a settings plugin
    pub fn set_setting(
        &mut self,
        plugin_type: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<AttrValue>,
    ) {
        self.settings
            .entry(plugin_type.into())
            .or_default()
            .insert(attribute.into(), value.into());
    }

    /// Overrides for one settings plugin
    pub fn settings_for(&self, plugin_type: &str) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.settings
            .get(plugin_type)
            .into_iter()
            .flat_map(|attrs| attrs.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Current frame
    pub fn frame(&self) -> f64 {
        self.frame
    }

    /// Move to another (possibly fractional) frame
    pub fn set_frame(&mut self, frame: f64) {
        self.frame = frame;
    }
}
