//! Pass summaries

use super::error::ExportError;
use crate::scene::TrackId;
use std::fmt;

/// A node tree whose export was aborted
#[derive(Debug, Clone, PartialEq)]
pub struct TreeFailure {
    /// Entity owning the tree
    pub owner: TrackId,
    /// Tree name
    pub tree: String,
    /// What went wrong
    pub error: ExportError,
}

/// Outcome of one export pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportReport {
    /// Node trees exported successfully
    pub exported_trees: usize,
    /// Node trees whose export was aborted
    pub failed_trees: Vec<TreeFailure>,
    /// Entities (re-)exported
    pub exported_entities: usize,
    /// Plugins deleted as stale
    pub deleted: Vec<String>,
    /// Time samples exported
    pub samples: usize,
    /// Frame intervals committed
    pub committed: usize,
}

impl ExportReport {
    /// Whether every node tree exported cleanly
    pub fn is_clean(&self) -> bool {
        self.failed_trees.is_empty()
    }

    /// Failure recorded for an entity's tree
    pub fn failure_for(&self, owner: TrackId) -> Option<&TreeFailure> {
        self.failed_trees.iter().find(|f| f.owner == owner)
    }
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entities, {} trees ({} failed), {} deleted",
            self.exported_entities,
            self.exported_trees,
            self.failed_trees.len(),
            self.deleted.len()
        )?;
        if self.samples > 0 {
            write!(f, ", {} samples, {} frames committed", self.samples, self.committed)?;
        }
        Ok(())
    }
}
