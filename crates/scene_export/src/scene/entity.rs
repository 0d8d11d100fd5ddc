//! Scene entities and their stable identities

use super::animation::TransformTrack;
use super::node_tree::NodeTree;
use crate::plugin::AttrValue;
use std::collections::BTreeMap;
use std::fmt;

/// Stable entity identifier, invariant to renaming
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackId(u64);

impl TrackId {
    /// Identity of the scene itself; owns scene-level plugins
    pub const SCENE: TrackId = TrackId(0);

    /// Wrap a raw identifier
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw identifier
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

/// Mesh payload of an object
///
/// Geometry buffers belong to the host application; only the attributes
/// forwarded to the geometry plugin are modeled here.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    /// Identity of the mesh datablock, shared between instancing objects
    pub track_id: TrackId,
    /// Attributes copied to the geometry plugin
    pub attributes: BTreeMap<String, AttrValue>,
}

impl Default for TrackId {
    fn default() -> Self {
        Self::SCENE
    }
}

impl MeshData {
    /// Create mesh data with no attributes
    pub fn new(track_id: TrackId) -> Self {
        Self {
            track_id,
            attributes: BTreeMap::new(),
        }
    }

    /// Set a geometry attribute (builder pattern)
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// Light payload of an object: a node tree whose output is the light plugin
#[derive(Debug, Clone)]
pub struct LightData {
    /// Identity of the light datablock
    pub track_id: TrackId,
    /// Light setup tree
    pub tree: NodeTree,
}

impl LightData {
    /// Wrap a light tree
    pub fn new(track_id: TrackId, tree: NodeTree) -> Self {
        Self { track_id, tree }
    }
}

/// What an object carries
#[derive(Debug, Clone)]
pub enum ObjectKind {
    /// Renderable geometry
    Mesh(MeshData),
    /// Light source
    Light(LightData),
    /// Transform only
    Empty,
}

/// A scene object
#[derive(Debug, Clone)]
pub struct SceneObject {
    /// Stable identity
    pub track_id: TrackId,
    /// Display name; may change freely between passes
    pub name: String,
    /// Payload
    pub kind: ObjectKind,
    /// Animated world transform
    pub transform: TransformTrack,
    /// Material slots, in slot order
    pub materials: Vec<TrackId>,
    /// Render visibility
    pub visible: bool,
    /// Per-object motion blur sample count overriding the global one
    pub mb_samples: Option<u32>,
}

impl SceneObject {
    /// Create a visible object with a static identity transform
    pub fn new(track_id: TrackId, name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            track_id,
            name: name.into(),
            kind,
            transform: TransformTrack::default(),
            materials: Vec::new(),
            visible: true,
            mb_samples: None,
        }
    }

    /// Set the transform track (builder pattern)
    pub fn with_transform(mut self, transform: TransformTrack) -> Self {
        self.transform = transform;
        self
    }

    /// Append a material slot (builder pattern)
    pub fn with_material(mut self, material: TrackId) -> Self {
        self.materials.push(material);
        self
    }

    /// Override the motion blur sample count (builder pattern)
    pub fn with_mb_samples(mut self, samples: u32) -> Self {
        self.mb_samples = Some(samples);
        self
    }

    /// Whether this object is a light
    pub fn is_light(&self) -> bool {
        matches!(self.kind, ObjectKind::Light(_))
    }
}

/// A material and its shading tree
#[derive(Debug, Clone)]
pub struct MaterialEntity {
    /// Stable identity
    pub track_id: TrackId,
    /// Display name
    pub name: String,
    /// Shading tree; its output node takes the material plugin
    pub tree: NodeTree,
}

impl MaterialEntity {
    /// Wrap a shading tree
    pub fn new(track_id: TrackId, name: impl Into<String>, tree: NodeTree) -> Self {
        Self {
            track_id,
            name: name.into(),
            tree,
        }
    }
}
