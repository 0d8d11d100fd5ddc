//! # Export Core
//!
//! Translates the scene model into the renderer's flat plugin graph.
//!
//! ## Architecture
//!
//! ```text
//! ExportSession ── owns ──> ExportState (naming, trackers, change log)
//!       │                   MotionBlurBuilder
//!       │
//!       └─ per pass ──> ExportContext ──> SceneExporter ──> TreeExporter
//!                             │                                  │
//!                             └──────── RendererBoundary <───────┘
//! ```
//!
//! - **Naming**: deterministic plugin names from entity identities and
//!   node positions
//! - **Trackers**: plugin ownership per entity and the change log consumed
//!   by partial passes
//! - **Node trees**: recursive, cycle-checked translation of one tree
//! - **Motion blur**: the sample schedule of an animated export
//! - **Session**: full, partial and animated passes

mod context;
mod error;
mod motion_blur;
mod naming;
mod node_tree;
mod object_tracker;
mod report;
mod scene_exporter;
mod session;
mod settings;
mod update_tracker;

#[cfg(test)]
mod tests;

pub use context::{ExportContext, ExportState};
pub use error::{ExportError, ExportResult};
pub use motion_blur::{FrameType, MotionBlurBuilder, MotionBlurFrameData};
pub use naming::NamingService;
pub use node_tree::{export_tree, NodeContext, TreeExporter};
pub use object_tracker::ObjectTracker;
pub use report::{ExportReport, TreeFailure};
pub use scene_exporter::SceneExporter;
pub use session::{ExportSession, PassGuard};
pub use settings::export_settings;
pub use update_tracker::{UpdateFlags, UpdateTarget, UpdateTracker};
