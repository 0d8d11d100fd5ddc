//! In-memory renderer that records the plugin graph it receives

use super::{RendererBoundary, RendererError, RendererResult};
use crate::plugin::AttrValue;
use std::collections::{BTreeMap, BTreeSet};

/// One call received by a [`RecordingRenderer`]
#[derive(Debug, Clone, PartialEq)]
pub enum RendererCall {
    /// Upsert of the named plugin
    CreateOrUpdate(String),
    /// Deletion of the named plugin
    Delete(String),
    /// Current time change
    SetTime(f64),
    /// Frame commit
    Commit(f64),
}

/// A plugin as the renderer currently holds it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPlugin {
    /// Plugin class
    pub plugin_type: String,
    /// Attribute values, ordered by key
    pub attributes: Vec<(String, AttrValue)>,
    /// Time the last upsert applied to
    pub time: f64,
}

impl RecordedPlugin {
    /// Value of one attribute
    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}

/// Renderer boundary keeping the resulting plugin graph in memory
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    plugins: BTreeMap<String, RecordedPlugin>,
    calls: Vec<RendererCall>,
    current_time: f64,
    rejected: BTreeSet<String>,
}

impl RecordingRenderer {
    /// Create an empty renderer
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse upserts of the named plugin (builder pattern)
    pub fn with_rejected(mut self, name: impl Into<String>) -> Self {
        self.rejected.insert(name.into());
        self
    }

    /// Plugin by name
    pub fn plugin(&self, name: &str) -> Option<&RecordedPlugin> {
        self.plugins.get(name)
    }

    /// Whether a plugin exists
    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Names of every live plugin, sorted
    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.keys().map(String::as_str).collect()
    }

    /// Live plugins of one type, sorted by name
    pub fn plugins_of_type<'a>(&'a self, plugin_type: &'a str) -> impl Iterator<Item = (&'a str, &'a RecordedPlugin)> {
        self.plugins
            .iter()
            .filter(move |(_, p)| p.plugin_type == plugin_type)
            .map(|(name, p)| (name.as_str(), p))
    }

    /// Number of live plugins
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugin is live
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Every call received, in order
    pub fn calls(&self) -> &[RendererCall] {
        &self.calls
    }

    /// Forget the call log, keeping the plugin graph
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Names deleted since the call log was last cleared
    pub fn deleted(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                RendererCall::Delete(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Names upserted since the call log was last cleared
    pub fn updated(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                RendererCall::CreateOrUpdate(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Frames committed since the call log was last cleared
    pub fn committed_frames(&self) -> Vec<f64> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                RendererCall::Commit(frame) => Some(*frame),
                _ => None,
            })
            .collect()
    }

    /// Current time
    pub fn current_time(&self) -> f64 {
        self.current_time
    }
}

impl RendererBoundary for RecordingRenderer {
    fn create_or_update_plugin(
        &mut self,
        name: &str,
        plugin_type: &str,
        attributes: Vec<(String, AttrValue)>,
    ) -> RendererResult<()> {
        if self.rejected.contains(name) {
            return Err(RendererError::Rejected {
                name: name.to_string(),
                reason: "rejected by test renderer".to_string(),
            });
        }
        self.calls.push(RendererCall::CreateOrUpdate(name.to_string()));
        self.plugins.insert(
            name.to_string(),
            RecordedPlugin {
                plugin_type: plugin_type.to_string(),
                attributes,
                time: self.current_time,
            },
        );
        Ok(())
    }

    fn delete_plugin(&mut self, name: &str) -> RendererResult<()> {
        self.calls.push(RendererCall::Delete(name.to_string()));
        self.plugins.remove(name);
        Ok(())
    }

    fn set_current_time(&mut self, frame: f64) -> RendererResult<()> {
        self.calls.push(RendererCall::SetTime(frame));
        self.current_time = frame;
        Ok(())
    }

    fn commit_frame(&mut self, frame: f64) -> RendererResult<()> {
        self.calls.push(RendererCall::Commit(frame));
        Ok(())
    }
}
