//! # Scene Export
//!
//! Translates a live, mutable scene graph into the flat plugin-instance
//! graph of an external renderer, and keeps the two in sync.
//!
//! ## Features
//!
//! - **Node-Tree Export**: material, light and world trees become plugin
//!   descriptors with links resolved to upstream plugin outputs
//! - **Deterministic Naming**: plugin names derive from stable identities,
//!   so repeated passes address the same renderer-side instances
//! - **Incremental Updates**: a change log drives partial passes; plugins an
//!   entity stops producing are deleted
//! - **Motion Blur**: sub-frame sample scheduling with per-object overrides
//! - **Configuration**: TOML and RON session configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_export::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scene = Scene::new();
//!     let mut renderer = RecordingRenderer::new();
//!     let mut session = ExportSession::new(ExportConfig::default());
//!
//!     let report = session.export_full(&scene, &mut renderer)?;
//!     println!("{report}");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core modules
pub mod config;
pub mod core;
pub mod foundation;

// Scene model and renderer boundary
pub mod renderer;
pub mod scene;

// Export pipeline
pub mod export;
pub mod plugin;

/// Common imports for exporter users
pub mod prelude {
    pub use crate::{
        core::config::{AnimationSettings, Config, ExportConfig, ExporterConfig, MotionBlurSettings},
        export::{ExportError, ExportReport, ExportResult, ExportSession, UpdateFlags, UpdateTarget},
        foundation::math::{Mat4, Transform, Vec3},
        plugin::{AttrPlugin, AttrValue, HookRegistry, PluginDesc, PluginHooks, SchemaRegistry},
        renderer::{RecordingRenderer, RendererBoundary, RendererError},
        scene::{
            InputSocket, LightData, MaterialEntity, MeshData, Node, NodeTree, ObjectKind, OutputSocket, Scene,
            SceneError, SceneObject, TrackId, TransformTrack,
        },
    };
}
