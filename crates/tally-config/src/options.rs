//! Per-element toggle-count options.
//!
//! The binding attribute carries a JSON object such as
//! `{"target": "#pricing-switch", "min": 19, "max": 29, "duration": 300}`.
//! Programmatic callers pass a [`ToggleCountOptions`] directly; both sources
//! are merged per key with the programmatic side winning.

use serde::Deserialize;
use tally_dom::ElementId;

use crate::error::ConfigurationError;

/// Where the bound control comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// An element handle resolved by the caller.
    Element(ElementId),
    /// A selector resolved once, at construction time.
    Selector(String),
}

impl From<ElementId> for Target {
    fn from(element: ElementId) -> Self {
        Self::Element(element)
    }
}

impl From<&str> for Target {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

impl From<String> for Target {
    fn from(selector: String) -> Self {
        Self::Selector(selector)
    }
}

/// Options as written; every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToggleCountOptions {
    pub target: Option<Target>,
    pub min: Option<i64>,
    pub max: Option<i64>,
    /// Animation length in milliseconds.
    pub duration: Option<u64>,
}

/// JSON shape of the binding attribute. `target` can only be a selector here.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BindingOptions {
    target: Option<String>,
    min: Option<i64>,
    max: Option<i64>,
    duration: Option<u64>,
}

impl ToggleCountOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON binding attribute. Blank input means "no options".
    pub fn from_json(raw: &str) -> Result<Self, ConfigurationError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let binding: BindingOptions = serde_json::from_str(raw)?;
        Ok(Self {
            target: binding.target.map(Target::Selector),
            min: binding.min,
            max: binding.max,
            duration: binding.duration,
        })
    }

    pub fn with_target(mut self, target: impl Into<Target>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_bounds(mut self, min: i64, max: i64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration = Some(duration_ms);
        self
    }

    /// Combine two option sets; keys present in `overrides` win.
    pub fn merge(self, overrides: ToggleCountOptions) -> Self {
        Self {
            target: overrides.target.or(self.target),
            min: overrides.min.or(self.min),
            max: overrides.max.or(self.max),
            duration: overrides.duration.or(self.duration),
        }
    }

    /// Apply defaults: bounds default to 0, a missing or zero duration falls
    /// back to `default_duration_ms`.
    pub fn resolve(self, default_duration_ms: u64) -> ResolvedOptions {
        ResolvedOptions {
            target: self.target,
            min: self.min.unwrap_or(0),
            max: self.max.unwrap_or(0),
            duration_ms: self
                .duration
                .filter(|d| *d > 0)
                .unwrap_or(default_duration_ms),
        }
    }
}

/// Options with defaults applied. The target is still unresolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub target: Option<Target>,
    pub min: i64,
    pub max: i64,
    pub duration_ms: u64,
}
