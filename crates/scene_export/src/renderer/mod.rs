//! # Renderer Boundary
//!
//! The exporters never talk to a renderer directly. Finalized plugin
//! descriptors are handed to a [`RendererBoundary`], which upserts them in
//! the renderer's flat plugin graph.
//!
//! ## Architecture
//!
//! - **Fire-and-forget**: calls return once the request is queued
//! - **Idempotent upserts**: re-sending an unchanged plugin is harmless
//! - **Time-aware**: animated exports set the current time before sending
//!   the plugins valid at that time

mod recording;

pub use recording::{RecordedPlugin, RecordingRenderer, RendererCall};

use crate::plugin::{AttrValue, PluginDesc};
use thiserror::Error;

/// Errors reported by a renderer boundary
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RendererError {
    /// The renderer is not reachable
    #[error("Renderer disconnected: {0}")]
    Disconnected(String),

    /// The renderer refused a plugin
    #[error("Renderer rejected plugin {name}: {reason}")]
    Rejected {
        /// Plugin instance name
        name: String,
        /// Reason given by the renderer
        reason: String,
    },
}

/// Result type for renderer boundary operations
pub type RendererResult<T> = Result<T, RendererError>;

/// Interface to the renderer's plugin-instance protocol
pub trait RendererBoundary {
    /// Create a plugin instance or update an existing one
    ///
    /// # Arguments
    /// * `name` - Globally unique instance name
    /// * `plugin_type` - Plugin class understood by the renderer
    /// * `attributes` - Attribute values, ordered by key
    fn create_or_update_plugin(
        &mut self,
        name: &str,
        plugin_type: &str,
        attributes: Vec<(String, AttrValue)>,
    ) -> RendererResult<()>;

    /// Delete a plugin instance; deleting an unknown name is not an error
    fn delete_plugin(&mut self, name: &str) -> RendererResult<()>;

    /// Set the time subsequent upserts apply to
    fn set_current_time(&mut self, frame: f64) -> RendererResult<()>;

    /// Signal that every sample of the interval around `frame` was sent
    fn commit_frame(&mut self, frame: f64) -> RendererResult<()>;

    /// Hand a finalized descriptor to the renderer, consuming it
    fn send(&mut self, desc: PluginDesc) -> RendererResult<()> {
        let (name, plugin_type, attributes) = desc.into_parts();
        self.create_or_update_plugin(&name, &plugin_type, attributes)
    }
}
