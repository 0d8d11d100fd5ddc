//! Export error types

use crate::renderer::RendererError;
use crate::scene::TrackId;
use thiserror::Error;

/// Errors raised while exporting a scene
///
/// Tree-local errors abort the export of one node tree and are reported in
/// the pass summary; every other kind stops the pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExportError {
    /// A link traversal revisited a node on the active ancestor stack
    #[error("Node tree of {owner} contains a cycle: {}", .chain.join(" -> "))]
    SceneGraphCycle {
        /// Entity owning the tree
        owner: TrackId,
        /// Node names from the revisited node back to itself
        chain: Vec<String>,
    },

    /// A socket references a plugin type with no schema or exporter
    #[error("No exporter for plugin type {plugin_type} (attribute {attribute})")]
    UnresolvedReference {
        /// Plugin type that could not be resolved
        plugin_type: String,
        /// Attribute or node that referenced it
        attribute: String,
    },

    /// A type-specific export hook failed
    #[error("Export hook of {plugin_type} failed on node {node}: {message}")]
    HookFailure {
        /// Plugin type whose hook failed
        plugin_type: String,
        /// Originating node
        node: String,
        /// Hook diagnostic
        message: String,
    },

    /// Two distinct identities produced the same plugin name
    #[error("Plugin name {name} claimed by {claimant} is already owned by {existing}")]
    NamingCollision {
        /// Colliding name
        name: String,
        /// Identity that minted the name first
        existing: String,
        /// Identity that minted it again
        claimant: String,
    },

    /// A plugin name was tracked for two entities
    #[error("Plugin {plugin} is owned by {owner}, cannot be tracked for {claimant}")]
    OwnershipConflict {
        /// Plugin name
        plugin: String,
        /// Current owner
        owner: TrackId,
        /// Entity that tried to track it
        claimant: TrackId,
    },

    /// A required link is missing or malformed
    #[error("Invalid link in tree {tree}: node {node}, socket {socket}")]
    InvalidLink {
        /// Tree name
        tree: String,
        /// Node name
        node: String,
        /// Socket name
        socket: String,
    },

    /// The session configuration failed validation
    #[error("Invalid export configuration: {0}")]
    InvalidConfig(String),

    /// An export pass was started while another one is unfinished
    #[error("An export pass is already in progress")]
    PassInProgress,

    /// The renderer boundary failed
    #[error("Renderer error: {0}")]
    Renderer(#[from] RendererError),
}

impl ExportError {
    /// Whether this error only invalidates the node tree it occurred in
    pub fn is_tree_local(&self) -> bool {
        matches!(
            self,
            Self::SceneGraphCycle { .. }
                | Self::UnresolvedReference { .. }
                | Self::HookFailure { .. }
                | Self::InvalidLink { .. }
        )
    }
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;
