//! Tally configuration
//!
//! Two layers live here:
//! - [`TallyConfig`]: runtime settings loaded from `tally.toml`, overridable
//!   through environment variables.
//! - [`ToggleCountOptions`]: per-element options parsed from the JSON binding
//!   attribute and merged with programmatic overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod error;
pub mod options;

pub use error::ConfigurationError;
pub use options::{ResolvedOptions, Target, ToggleCountOptions};

/// Fallback animation length when neither the binding nor the settings give one.
pub const DEFAULT_DURATION_MS: u64 = 700;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TallyConfig {
    /// Toggle-count binding settings
    pub toggle_count: ToggleCountSettings,
    /// Frame loop settings used by hosts that drive frames themselves
    pub frames: FrameSettings,
}

/// Binding settings for the toggle-count behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToggleCountSettings {
    /// Attribute marking a display element and carrying its JSON options
    pub attribute: String,
    /// Class that opts an element out of page-load initialisation
    pub prevent_init_class: String,
    /// Animation length used when an element does not configure one
    pub default_duration_ms: u64,
}

/// Frame loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSettings {
    /// Interval between simulated frames in milliseconds
    pub interval_ms: f64,
    /// Upper bound on frames driven before giving up on reaching idle
    pub max_ticks: usize,
}

impl Default for ToggleCountSettings {
    fn default() -> Self {
        Self {
            attribute: "data-toggle-count".to_string(),
            prevent_init_class: "--prevent-on-load-init".to_string(),
            default_duration_ms: DEFAULT_DURATION_MS,
        }
    }
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            interval_ms: 16.0,
            max_ticks: 10_000,
        }
    }
}

impl TallyConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(toml::from_str(&content)?)
    }

    /// Load configuration from `tally.toml` in the current directory, or the
    /// defaults if it is missing or unreadable
    pub fn load_or_default() -> Self {
        Self::load_from_file("tally.toml").unwrap_or_default()
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        if let Ok(attribute) = std::env::var("TALLY_ATTRIBUTE") {
            self.toggle_count.attribute = attribute;
        }
        if let Ok(class) = std::env::var("TALLY_PREVENT_CLASS") {
            self.toggle_count.prevent_init_class = class;
        }
        if let Ok(val) = std::env::var("TALLY_DEFAULT_DURATION") {
            if let Ok(duration) = val.parse::<u64>() {
                self.toggle_count.default_duration_ms = duration;
            }
        }

        if let Ok(val) = std::env::var("TALLY_FRAME_INTERVAL") {
            if let Ok(interval) = val.parse::<f64>() {
                if interval > 0.0 {
                    self.frames.interval_ms = interval;
                }
            }
        }
    }

    /// Load `tally.toml` (or defaults), then apply environment overrides
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}
