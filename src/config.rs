//! Engine tuning knobs.

use std::env;

use serde::{Deserialize, Serialize};

/// Interaction thresholds for the selection engine, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pointer travel before a press on the surface becomes a drag.
    pub drag_threshold_px: f64,
    /// Maximum top-edge difference for two elements to share a line.
    pub line_tolerance_px: f64,
    /// Maximum left-edge distance from the clicked element for a
    /// double-click line selection.
    pub line_reach_px: f64,
}

impl EngineConfig {
    pub const DEFAULT_DRAG_THRESHOLD_PX: f64 = 5.0;
    pub const DEFAULT_LINE_TOLERANCE_PX: f64 = 5.0;
    pub const DEFAULT_LINE_REACH_PX: f64 = 200.0;

    /// Create configuration from environment variables.
    ///
    /// - `FOLIO_DRAG_THRESHOLD_PX` (default 5)
    /// - `FOLIO_LINE_TOLERANCE_PX` (default 5)
    /// - `FOLIO_LINE_REACH_PX` (default 200)
    ///
    /// Unparseable or negative values fall back to the default with a warning.
    #[must_use = "creates config from environment variables"]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str, default: f64| match lookup(key) {
            None => default,
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(value) if value.is_finite() && value >= 0.0 => value,
                _ => {
                    tracing::warn!(key, value = %raw, default, "invalid config value, using default");
                    default
                }
            },
        };

        Self {
            drag_threshold_px: read("FOLIO_DRAG_THRESHOLD_PX", Self::DEFAULT_DRAG_THRESHOLD_PX),
            line_tolerance_px: read("FOLIO_LINE_TOLERANCE_PX", Self::DEFAULT_LINE_TOLERANCE_PX),
            line_reach_px: read("FOLIO_LINE_REACH_PX", Self::DEFAULT_LINE_REACH_PX),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: Self::DEFAULT_DRAG_THRESHOLD_PX,
            line_tolerance_px: Self::DEFAULT_LINE_TOLERANCE_PX,
            line_reach_px: Self::DEFAULT_LINE_REACH_PX,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.drag_threshold_px, 5.0);
        assert_eq!(config.line_tolerance_px, 5.0);
        assert_eq!(config.line_reach_px, 200.0);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("FOLIO_DRAG_THRESHOLD_PX", "8"),
            ("FOLIO_LINE_TOLERANCE_PX", "not a number"),
            ("FOLIO_LINE_REACH_PX", "-1"),
        ]
        .into_iter()
        .collect();

        let config = EngineConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.drag_threshold_px, 8.0);
        assert_eq!(config.line_tolerance_px, 5.0);
        assert_eq!(config.line_reach_px, 200.0);
    }

    #[test]
    fn test_from_lookup_empty_is_default() {
        assert_eq!(EngineConfig::from_lookup(|_| None), EngineConfig::default());
    }
}
