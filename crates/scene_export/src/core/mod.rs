//! # Core Module
//!
//! Shared abstractions used throughout the exporter.
//!
//! ## Organization
//!
//! - **Config**: Unified configuration for all exporter subsystems
//! - **Foundation**: Low-level utilities (math, collections, logging)

pub mod config;

// Re-export foundation modules for convenience
pub use crate::foundation;

// Re-export commonly used config types
pub use config::{
    AnimationSettings,
    Config,
    ConfigError,
    ConfigFormat,
    ExportConfig,
    ExporterConfig,
    MotionBlurSettings,
};
