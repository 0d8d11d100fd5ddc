//! Scene model consumed by the exporters
//!
//! A small in-memory rendition of the host application's scene graph:
//! entities with stable identities, their node trees and animated
//! transforms.
//!
//! ## Architecture
//!
//! ```text
//! Scene
//!  ├── SceneObject (Mesh | Light(NodeTree) | Empty) + TransformTrack
//!  ├── MaterialEntity (NodeTree)
//!  ├── World (NodeTree)
//!  └── Settings overrides
//! ```

mod animation;
mod entity;
mod node_tree;
mod scene_graph;

pub use animation::TransformTrack;
pub use entity::{LightData, MaterialEntity, MeshData, ObjectKind, SceneObject, TrackId};
pub use node_tree::{InputSocket, Link, Node, NodeHandle, NodeKey, NodeKind, NodeTree, OutputSocket};
pub use scene_graph::Scene;

use thiserror::Error;

/// Scene construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// Two nodes in one tree share a name
    #[error("Duplicate node name: {0}")]
    DuplicateNodeName(String),

    /// Node key not present in the tree
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// Socket name not present on the node
    #[error("Node {0} has no socket named {1}")]
    UnknownSocket(String, String),

    /// Two entities share an identity
    #[error("Identity {0} is already in use")]
    DuplicateId(TrackId),

    /// The scene identity cannot be used by an entity
    #[error("Identity 0 is reserved for the scene")]
    ReservedId,
}
