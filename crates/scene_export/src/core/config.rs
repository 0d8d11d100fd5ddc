//! # Unified Configuration System
//!
//! All configuration structures for an export session live here. They are
//! plain serde types so a session can be configured from TOML or RON files
//! through the [`Config`] trait.
//!
//! ## Configuration Categories
//!
//! - **Exporter Config**: logging, debug features, skip registry additions
//! - **Animation Settings**: frame range and step of an animated export
//! - **Motion Blur Settings**: shutter interval and global sample count

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError, ConfigFormat};

/// # Exporter Configuration
///
/// Core exporter behavior: logging, debug features and plugin filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Log level used when the host initializes logging
    pub log_level: String,
    /// Whether to enable debug features (extra validation and logging)
    pub debug_mode: bool,
    /// Plugin types that are never generated from node-tree traversal,
    /// in addition to the built-in skip registry
    pub skip_plugins: Vec<String>,
    /// Treat naming collisions as fatal for the pass
    pub strict_naming: bool,
}

impl ExporterConfig {
    /// Create a new exporter configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            debug_mode: cfg!(debug_assertions),
            skip_plugins: Vec::new(),
            strict_naming: true,
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable debug mode
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug_mode = enabled;
        self
    }

    /// Add a plugin type to the skip registry
    pub fn with_skipped_plugin(mut self, plugin_type: impl Into<String>) -> Self {
        self.skip_plugins.push(plugin_type.into());
        self
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Animation Settings
///
/// Frame range covered by an animated export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// First scene frame (inclusive)
    pub frame_start: i32,
    /// Last scene frame (inclusive)
    pub frame_end: i32,
    /// Distance between exported base frames
    pub frame_step: i32,
}

impl AnimationSettings {
    /// Create settings for a frame range with step 1
    pub fn new(frame_start: i32, frame_end: i32) -> Self {
        Self {
            frame_start,
            frame_end,
            frame_step: 1,
        }
    }

    /// Set the frame step
    pub fn with_step(mut self, step: i32) -> Self {
        self.frame_step = step;
        self
    }

    /// Number of base frames in the range
    pub fn frame_count(&self) -> usize {
        if self.frame_end < self.frame_start || self.frame_step < 1 {
            return 0;
        }
        ((self.frame_end - self.frame_start) / self.frame_step) as usize + 1
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_step < 1 {
            return Err(ConfigError::Invalid("Frame step must be at least 1".to_string()));
        }
        if self.frame_end < self.frame_start {
            return Err(ConfigError::Invalid(format!(
                "Frame range is empty: {}..{}",
                self.frame_start, self.frame_end
            )));
        }
        Ok(())
    }
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// # Motion Blur Settings
///
/// Shutter interval and global geometry sample count. The interval of a
/// frame `f` spans `duration` frames centered at `f + interval_center`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionBlurSettings {
    /// Whether motion blur is enabled at all
    pub enabled: bool,
    /// Interval width in frames
    pub duration: f64,
    /// Interval center, relative to the base frame
    pub interval_center: f64,
    /// Number of subdivisions of the interval
    pub geom_samples: u32,
}

impl MotionBlurSettings {
    /// Create enabled motion blur settings
    pub fn new(duration: f64, interval_center: f64, geom_samples: u32) -> Self {
        Self {
            enabled: true,
            duration,
            interval_center,
            geom_samples,
        }
    }

    /// Settings with motion blur turned off
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(1.0, 0.0, 2)
        }
    }

    /// Whether sampling degenerates to the base frame only
    pub fn is_degenerate(&self) -> bool {
        !self.enabled || self.geom_samples == 0 || self.duration == 0.0
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "Motion blur duration must be a non-negative number, got {}",
                self.duration
            )));
        }
        if !self.interval_center.is_finite() {
            return Err(ConfigError::Invalid("Motion blur interval center is not finite".to_string()));
        }
        Ok(())
    }
}

impl Default for MotionBlurSettings {
    fn default() -> Self {
        Self::disabled()
    }
}

/// # Complete Export Configuration
///
/// Top-level configuration that encompasses all exporter subsystems.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Exporter core configuration
    pub exporter: ExporterConfig,
    /// Animation range
    pub animation: AnimationSettings,
    /// Motion blur sampling
    pub motion_blur: MotionBlurSettings,
}

impl ExportConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the animation range
    pub fn with_animation(mut self, animation: AnimationSettings) -> Self {
        self.animation = animation;
        self
    }

    /// Set the motion blur settings
    pub fn with_motion_blur(mut self, motion_blur: MotionBlurSettings) -> Self {
        self.motion_blur = motion_blur;
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.animation.validate()?;
        self.motion_blur.validate()?;
        Ok(())
    }
}

impl Config for ExportConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count() {
        assert_eq!(AnimationSettings::new(1, 10).frame_count(), 10);
        assert_eq!(AnimationSettings::new(1, 10).with_step(3).frame_count(), 4);
        assert_eq!(AnimationSettings::new(5, 1).frame_count(), 0);
    }

    #[test]
    fn test_degenerate_motion_blur() {
        assert!(MotionBlurSettings::disabled().is_degenerate());
        assert!(MotionBlurSettings::new(0.0, 0.0, 4).is_degenerate());
        assert!(MotionBlurSettings::new(1.0, 0.0, 0).is_degenerate());
        assert!(!MotionBlurSettings::new(1.0, 0.0, 4).is_degenerate());
    }

    #[test]
    fn test_validation_rejects_bad_step() {
        let config = ExportConfig::new().with_animation(AnimationSettings::new(1, 5).with_step(0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExportConfig::new()
            .with_animation(AnimationSettings::new(1, 24).with_step(2))
            .with_motion_blur(MotionBlurSettings::new(0.5, 0.0, 3));

        let text = toml::to_string_pretty(&config).expect("serialize");
        let parsed: ExportConfig = toml::from_str(&text).expect("parse");

        assert_eq!(parsed.animation, config.animation);
        assert_eq!(parsed.motion_blur, config.motion_blur);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: ExportConfig = toml::from_str("[motion_blur]\nenabled = true\ngeom_samples = 6\n")
            .expect("parse");
        assert!(parsed.motion_blur.enabled);
        assert_eq!(parsed.motion_blur.geom_samples, 6);
        assert_eq!(parsed.animation, AnimationSettings::default());
        assert_eq!(parsed.exporter.log_level, "info");
    }
}
