//! Runtime configuration for the navigation core.
//!
//! All tunables live in [`NavConfig`]. Every field has a default, so a partial
//! JSON document (or none at all) is a valid configuration.

use serde::{Deserialize, Serialize};

// =============================================================================
// Defaults
// =============================================================================

/// Overlay count above which the guardrail treats the stack as corrupted.
pub const DEFAULT_MAX_OVERLAYS: usize = 5;

/// Auto-recovery attempts allowed per provider mount.
pub const DEFAULT_MAX_RECOVERY_ATTEMPTS: u32 = 3;

/// Guardrail interval in milliseconds.
pub const DEFAULT_GUARDRAIL_INTERVAL_MS: u32 = 5_000;

/// Quiet window before a burst of DOM mutations triggers a guardrail pass.
pub const DEFAULT_DOM_SCAN_DEBOUNCE_MS: u32 = 300;

/// Scroll records older than this are purged (30 minutes).
pub const DEFAULT_SCROLL_RETENTION_MS: f64 = 30.0 * 60.0 * 1000.0;

/// How often the scroll store is swept (5 minutes).
pub const DEFAULT_SCROLL_CLEANUP_INTERVAL_MS: u32 = 5 * 60 * 1000;

/// Drift (in CSS pixels) tolerated before a preserved offset is re-applied.
pub const DEFAULT_DRIFT_THRESHOLD_PX: f64 = 5.0;

/// Maximum delay before deferred scroll restoration runs anyway.
pub const DEFAULT_RESTORE_IDLE_TIMEOUT_MS: u32 = 200;

/// Debug sink capacity.
pub const DEFAULT_DEBUG_LOG_CAPACITY: usize = 500;

// =============================================================================
// NavConfig
// =============================================================================

/// Tuning knobs for the registries, scroll store and guardrail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    pub max_overlays: usize,
    pub max_recovery_attempts: u32,
    pub guardrail_interval_ms: u32,
    pub dom_scan_debounce_ms: u32,
    pub scroll_retention_ms: f64,
    pub scroll_cleanup_interval_ms: u32,
    pub drift_threshold_px: f64,
    /// Delays between drift re-checks while an offset is preserved. The last
    /// delay repeats until the preservation window ends.
    pub drift_recheck_delays_ms: Vec<u32>,
    pub restore_idle_timeout_ms: u32,
    pub debug_log_capacity: usize,
    /// Enables the debug sink. Off in release builds.
    pub debug_enabled: bool,
    /// Enables the close-button DOM audit.
    pub dom_audit_enabled: bool,
    pub close_buttons: CloseButtonHeuristics,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            max_overlays: DEFAULT_MAX_OVERLAYS,
            max_recovery_attempts: DEFAULT_MAX_RECOVERY_ATTEMPTS,
            guardrail_interval_ms: DEFAULT_GUARDRAIL_INTERVAL_MS,
            dom_scan_debounce_ms: DEFAULT_DOM_SCAN_DEBOUNCE_MS,
            scroll_retention_ms: DEFAULT_SCROLL_RETENTION_MS,
            scroll_cleanup_interval_ms: DEFAULT_SCROLL_CLEANUP_INTERVAL_MS,
            drift_threshold_px: DEFAULT_DRIFT_THRESHOLD_PX,
            drift_recheck_delays_ms: vec![0, 16, 50, 100, 200],
            restore_idle_timeout_ms: DEFAULT_RESTORE_IDLE_TIMEOUT_MS,
            debug_log_capacity: DEFAULT_DEBUG_LOG_CAPACITY,
            debug_enabled: cfg!(debug_assertions),
            dom_audit_enabled: cfg!(debug_assertions),
            close_buttons: CloseButtonHeuristics::default(),
        }
    }
}

impl NavConfig {
    /// Parses a configuration from JSON, falling back to defaults for
    /// missing fields.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// =============================================================================
// Close-button heuristics
// =============================================================================

/// Patterns used to spot dismiss buttons that bypass the close coordinator.
///
/// These are sniffing heuristics, not a contract. Each field is a regular
/// expression matched against the candidate element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloseButtonHeuristics {
    /// Matched against the element's class list (and its icon child's).
    pub icon_class_pattern: String,
    /// Matched against the trimmed text content.
    pub text_pattern: String,
    /// Matched against `aria-label`.
    pub aria_label_pattern: String,
    /// Attribute carried by the sanctioned close primitive.
    pub sanctioned_attribute: String,
    /// Selector for overlay roots whose descendants are audited.
    pub overlay_root_selector: String,
}

impl Default for CloseButtonHeuristics {
    fn default() -> Self {
        Self {
            icon_class_pattern: r"(?i)\b(lucide-x|bi-x(-lg)?|icon-close|close-icon|fa-(times|xmark))\b"
                .to_string(),
            text_pattern: r"(?i)^\s*(×|✕|✖|x|close|dismiss)\s*$".to_string(),
            aria_label_pattern: r"(?i)^\s*(close|dismiss)\b".to_string(),
            sanctioned_attribute: "data-overlay-close".to_string(),
            overlay_root_selector: "[data-overlay-root]".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NavConfig::default();
        assert_eq!(config.max_overlays, 5);
        assert_eq!(config.max_recovery_attempts, 3);
        assert_eq!(config.drift_recheck_delays_ms.first(), Some(&0));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = NavConfig::from_json(r#"{ "max_overlays": 8, "debug_enabled": true }"#)
            .unwrap();
        assert_eq!(config.max_overlays, 8);
        assert!(config.debug_enabled);
        assert_eq!(config.guardrail_interval_ms, DEFAULT_GUARDRAIL_INTERVAL_MS);
        assert_eq!(config.close_buttons, CloseButtonHeuristics::default());
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(NavConfig::from_json("{ max_overlays: }").is_err());
    }
}
