//! Guardrail validator.
//!
//! A read-only audit of the registries (and a best-effort DOM snapshot)
//! followed by bounded auto-recovery. Violations are values, never errors:
//! a live session must not crash because two stores drifted apart.
//!
//! Recoveries are capped per mount. Once the cap is reached the validator
//! keeps reporting, but every recovery it would have issued lands in
//! [`GuardrailReport::suppressed`] instead.

use std::fmt;

use regex::Regex;
use serde::Serialize;

use crate::config::{CloseButtonHeuristics, NavConfig};
use crate::error::{NavError, Result};

// ============================================================================
// Inputs
// ============================================================================

/// Why a guardrail pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailTrigger {
    Mount,
    RouteChange,
    Interval,
    VisibilityRegained,
    ConnectivityRegained,
    DomMutation,
    /// Requested from the debug panel.
    Manual,
}

impl fmt::Display for GuardrailTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Mount => "mount",
            Self::RouteChange => "route_change",
            Self::Interval => "interval",
            Self::VisibilityRegained => "visibility_regained",
            Self::ConnectivityRegained => "connectivity_regained",
            Self::DomMutation => "dom_mutation",
            Self::Manual => "manual",
        };
        f.write_str(label)
    }
}

/// A clickable element found inside an overlay root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseCandidate {
    pub overlay_id: Option<String>,
    pub tag: String,
    pub text: String,
    pub aria_label: Option<String>,
    /// Space-separated classes of the element and its icon children.
    pub class_names: String,
    /// Carries the sanctioned close-primitive attribute.
    pub sanctioned: bool,
}

/// Everything one pass looks at.
#[derive(Debug, Clone, Default)]
pub struct GuardrailSnapshot {
    pub router_path: Option<String>,
    pub screen_top_path: Option<String>,
    pub screen_count: usize,
    pub overlay_count: usize,
    pub duplicate_overlays: Vec<String>,
    pub scroll_locked: bool,
    pub close_candidates: Vec<CloseCandidate>,
}

// ============================================================================
// Outputs
// ============================================================================

/// Which heuristic flagged a close candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseCue {
    IconClass,
    Text,
    AriaLabel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    EmptyScreenStack { route: String },
    RouteMismatch { screen_path: String, router_path: String },
    OverlayOverflow { count: usize, ceiling: usize },
    DuplicateOverlay { id: String },
    StuckScrollLock,
    UnsanctionedCloseButton {
        overlay_id: Option<String>,
        cue: CloseCue,
        element: String,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyScreenStack { route } => {
                write!(f, "screen stack empty while route {} is current", route)
            }
            Self::RouteMismatch {
                screen_path,
                router_path,
            } => write!(
                f,
                "top screen is {} but router is at {}",
                screen_path, router_path
            ),
            Self::OverlayOverflow { count, ceiling } => {
                write!(f, "{} overlays open (ceiling {})", count, ceiling)
            }
            Self::DuplicateOverlay { id } => write!(f, "overlay id {} registered twice", id),
            Self::StuckScrollLock => write!(f, "scroll lock held with no overlay open"),
            Self::UnsanctionedCloseButton {
                overlay_id,
                cue,
                element,
            } => write!(
                f,
                "close affordance {} in overlay {} bypasses the coordinator ({:?})",
                element,
                overlay_id.as_deref().unwrap_or("?"),
                cue
            ),
        }
    }
}

/// A corrective action. Applying it is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recovery {
    /// Replace-navigate to the router's current path.
    ForceSync { path: String },
    /// Close every registered overlay.
    CloseAll,
    /// Remove the body scroll lock.
    ClearScrollLock,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardrailReport {
    pub trigger: GuardrailTrigger,
    pub violations: Vec<Violation>,
    pub recoveries: Vec<Recovery>,
    pub suppressed: Vec<Recovery>,
}

impl GuardrailReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

// ============================================================================
// Close-button matcher
// ============================================================================

/// Compiled [`CloseButtonHeuristics`].
#[derive(Debug, Clone)]
pub struct CloseButtonMatcher {
    icon_class: Regex,
    text: Regex,
    aria_label: Regex,
}

impl CloseButtonMatcher {
    pub fn new(heuristics: &CloseButtonHeuristics) -> Result<Self> {
        Ok(Self {
            icon_class: compile(&heuristics.icon_class_pattern)?,
            text: compile(&heuristics.text_pattern)?,
            aria_label: compile(&heuristics.aria_label_pattern)?,
        })
    }

    /// The first heuristic that flags `candidate`, unless it is sanctioned.
    pub fn check(&self, candidate: &CloseCandidate) -> Option<CloseCue> {
        if candidate.sanctioned {
            return None;
        }
        if self.icon_class.is_match(&candidate.class_names) {
            Some(CloseCue::IconClass)
        } else if self.text.is_match(candidate.text.trim()) {
            Some(CloseCue::Text)
        } else if candidate
            .aria_label
            .as_deref()
            .is_some_and(|label| self.aria_label.is_match(label))
        {
            Some(CloseCue::AriaLabel)
        } else {
            None
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| NavError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

// ============================================================================
// Guardrail
// ============================================================================

#[derive(Debug, Clone)]
pub struct Guardrail {
    max_overlays: usize,
    max_attempts: u32,
    attempts: u32,
    matcher: Option<CloseButtonMatcher>,
}

impl Guardrail {
    /// Builds a validator. A heuristic that does not compile disables the
    /// DOM audit instead of failing.
    pub fn new(config: &NavConfig) -> Self {
        let matcher = if config.dom_audit_enabled {
            match CloseButtonMatcher::new(&config.close_buttons) {
                Ok(matcher) => Some(matcher),
                Err(e) => {
                    tracing::warn!(error = %e, "close-button audit disabled");
                    None
                }
            }
        } else {
            None
        };
        Self {
            max_overlays: config.max_overlays,
            max_attempts: config.max_recovery_attempts,
            attempts: 0,
            matcher,
        }
    }

    pub fn audit_enabled(&self) -> bool {
        self.matcher.is_some()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn remaining_attempts(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempts)
    }

    /// Resets the recovery budget (new mount).
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Runs one pass over `snapshot`.
    pub fn validate(
        &mut self,
        trigger: GuardrailTrigger,
        snapshot: &GuardrailSnapshot,
    ) -> GuardrailReport {
        let mut report = GuardrailReport {
            trigger,
            violations: Vec::new(),
            recoveries: Vec::new(),
            suppressed: Vec::new(),
        };

        match (&snapshot.router_path, &snapshot.screen_top_path) {
            // The next registration is expected to heal this; forcing one
            // could create a duplicate.
            (Some(route), None) if snapshot.screen_count == 0 => {
                report.violations.push(Violation::EmptyScreenStack {
                    route: route.clone(),
                });
            }
            (Some(route), Some(top)) if route != top => {
                report.violations.push(Violation::RouteMismatch {
                    screen_path: top.clone(),
                    router_path: route.clone(),
                });
                self.recover(&mut report, Recovery::ForceSync { path: route.clone() });
            }
            _ => {}
        }

        if snapshot.overlay_count > self.max_overlays {
            report.violations.push(Violation::OverlayOverflow {
                count: snapshot.overlay_count,
                ceiling: self.max_overlays,
            });
            self.recover(&mut report, Recovery::CloseAll);
        }

        for id in &snapshot.duplicate_overlays {
            report
                .violations
                .push(Violation::DuplicateOverlay { id: id.clone() });
        }

        if snapshot.scroll_locked && snapshot.overlay_count == 0 {
            report.violations.push(Violation::StuckScrollLock);
            self.recover(&mut report, Recovery::ClearScrollLock);
        }

        if let Some(matcher) = &self.matcher {
            for candidate in &snapshot.close_candidates {
                if let Some(cue) = matcher.check(candidate) {
                    report.violations.push(Violation::UnsanctionedCloseButton {
                        overlay_id: candidate.overlay_id.clone(),
                        cue,
                        element: describe(candidate),
                    });
                }
            }
        }

        for violation in &report.violations {
            tracing::warn!(%trigger, %violation, "guardrail violation");
        }
        if !report.suppressed.is_empty() {
            tracing::warn!(
                %trigger,
                suppressed = report.suppressed.len(),
                "guardrail recovery budget exhausted, logging only"
            );
        }

        report
    }

    fn recover(&mut self, report: &mut GuardrailReport, recovery: Recovery) {
        if self.attempts < self.max_attempts {
            self.attempts += 1;
            tracing::info!(?recovery, attempt = self.attempts, "guardrail recovery");
            report.recoveries.push(recovery);
        } else {
            report.suppressed.push(recovery);
        }
    }
}

fn describe(candidate: &CloseCandidate) -> String {
    let text = candidate.text.trim();
    match (&candidate.aria_label, text.is_empty()) {
        (Some(label), _) => format!("<{} aria-label=\"{}\">", candidate.tag, label),
        (None, false) => format!("<{}>{}</{}>", candidate.tag, text, candidate.tag),
        (None, true) => format!("<{} class=\"{}\">", candidate.tag, candidate.class_names),
    }
}

// ============================================================================
// Debounce
// ============================================================================

/// Collapses a burst of events into one pass after a quiet window.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window_ms: f64,
    last_event: Option<f64>,
}

impl Debouncer {
    pub fn new(window_ms: u32) -> Self {
        Self {
            window_ms: f64::from(window_ms),
            last_event: None,
        }
    }

    pub fn record(&mut self, now_ms: f64) {
        self.last_event = Some(now_ms);
    }

    /// True once, after the window elapsed since the last recorded event.
    pub fn take_ready(&mut self, now_ms: f64) -> bool {
        match self.last_event {
            Some(last) if now_ms - last >= self.window_ms => {
                self.last_event = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.last_event.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guardrail() -> Guardrail {
        Guardrail::new(&NavConfig {
            dom_audit_enabled: true,
            ..NavConfig::default()
        })
    }

    fn synced(path: &str) -> GuardrailSnapshot {
        GuardrailSnapshot {
            router_path: Some(path.to_string()),
            screen_top_path: Some(path.to_string()),
            screen_count: 1,
            ..Default::default()
        }
    }

    fn button(text: &str) -> CloseCandidate {
        CloseCandidate {
            overlay_id: Some("edit-client".into()),
            tag: "button".into(),
            text: text.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_pass() {
        let report = guardrail().validate(GuardrailTrigger::Interval, &synced("/clients"));
        assert!(report.is_clean());
        assert!(report.recoveries.is_empty());
    }

    #[test]
    fn test_empty_stack_is_log_only() {
        let mut guard = guardrail();
        let snapshot = GuardrailSnapshot {
            router_path: Some("/clients".into()),
            ..Default::default()
        };
        let report = guard.validate(GuardrailTrigger::RouteChange, &snapshot);
        assert_eq!(
            report.violations,
            vec![Violation::EmptyScreenStack {
                route: "/clients".into()
            }]
        );
        assert!(report.recoveries.is_empty());
        assert_eq!(guard.attempts(), 0);
    }

    #[test]
    fn test_route_mismatch_forces_sync() {
        let mut snapshot = synced("/clients/42");
        snapshot.screen_top_path = Some("/clients".into());
        let report = guardrail().validate(GuardrailTrigger::RouteChange, &snapshot);
        assert_eq!(
            report.recoveries,
            vec![Recovery::ForceSync {
                path: "/clients/42".into()
            }]
        );
    }

    #[test]
    fn test_overflow_closes_all() {
        let mut snapshot = synced("/clients");
        snapshot.overlay_count = 6;
        let report = guardrail().validate(GuardrailTrigger::Interval, &snapshot);
        assert_eq!(
            report.violations,
            vec![Violation::OverlayOverflow { count: 6, ceiling: 5 }]
        );
        assert_eq!(report.recoveries, vec![Recovery::CloseAll]);
    }

    #[test]
    fn test_stuck_scroll_lock_is_cleared() {
        let mut snapshot = synced("/clients");
        snapshot.scroll_locked = true;
        let report = guardrail().validate(GuardrailTrigger::VisibilityRegained, &snapshot);
        assert_eq!(report.recoveries, vec![Recovery::ClearScrollLock]);

        snapshot.overlay_count = 1;
        let report = guardrail().validate(GuardrailTrigger::VisibilityRegained, &snapshot);
        assert!(report.is_clean());
    }

    #[test]
    fn test_duplicates_are_reported() {
        let mut snapshot = synced("/clients");
        snapshot.duplicate_overlays = vec!["edit-client".into()];
        let report = guardrail().validate(GuardrailTrigger::Interval, &snapshot);
        assert_eq!(
            report.violations,
            vec![Violation::DuplicateOverlay {
                id: "edit-client".into()
            }]
        );
        assert!(report.recoveries.is_empty());
    }

    #[test]
    fn test_recovery_budget_is_capped() {
        let mut guard = guardrail();
        let mut snapshot = synced("/clients");
        snapshot.overlay_count = 9;

        for _ in 0..3 {
            let report = guard.validate(GuardrailTrigger::Interval, &snapshot);
            assert_eq!(report.recoveries, vec![Recovery::CloseAll]);
        }
        let report = guard.validate(GuardrailTrigger::Interval, &snapshot);
        assert!(report.recoveries.is_empty());
        assert_eq!(report.suppressed, vec![Recovery::CloseAll]);
        assert_eq!(guard.remaining_attempts(), 0);

        guard.reset();
        assert_eq!(guard.remaining_attempts(), 3);
    }

    #[test]
    fn test_close_button_heuristics() {
        let matcher = CloseButtonMatcher::new(&CloseButtonHeuristics::default()).unwrap();

        assert_eq!(matcher.check(&button("×")), Some(CloseCue::Text));
        assert_eq!(matcher.check(&button(" Close ")), Some(CloseCue::Text));
        assert_eq!(matcher.check(&button("Close account")), None);
        assert_eq!(
            matcher.check(&CloseCandidate {
                class_names: "btn lucide-x".into(),
                ..button("")
            }),
            Some(CloseCue::IconClass)
        );
        assert_eq!(
            matcher.check(&CloseCandidate {
                aria_label: Some("Close dialog".into()),
                ..button("")
            }),
            Some(CloseCue::AriaLabel)
        );
        assert_eq!(
            matcher.check(&CloseCandidate {
                sanctioned: true,
                ..button("×")
            }),
            None
        );
    }

    #[test]
    fn test_audit_reports_without_recovery() {
        let mut snapshot = synced("/clients");
        snapshot.overlay_count = 1;
        snapshot.close_candidates = vec![button("x")];
        let report = guardrail().validate(GuardrailTrigger::DomMutation, &snapshot);
        assert!(matches!(
            report.violations.as_slice(),
            [Violation::UnsanctionedCloseButton {
                cue: CloseCue::Text,
                ..
            }]
        ));
        assert!(report.recoveries.is_empty());
    }

    #[test]
    fn test_default_heuristics_enable_audit() {
        let mut guard = guardrail();
        assert!(guard.audit_enabled());

        let mut snapshot = synced("/clients");
        snapshot.overlay_count = 1;
        snapshot.close_candidates = vec![button("×")];
        let report = guard.validate(GuardrailTrigger::Interval, &snapshot);
        assert_eq!(report.violations.len(), 1);
    }

    #[test]
    fn test_audit_can_be_disabled() {
        let mut guard = Guardrail::new(&NavConfig {
            dom_audit_enabled: false,
            ..NavConfig::default()
        });
        assert!(!guard.audit_enabled());
        let mut snapshot = synced("/clients");
        snapshot.close_candidates = vec![button("x")];
        assert!(guard.validate(GuardrailTrigger::Interval, &snapshot).is_clean());
    }

    #[test]
    fn test_invalid_pattern_disables_audit() {
        let mut config = NavConfig {
            dom_audit_enabled: true,
            ..NavConfig::default()
        };
        config.close_buttons.text_pattern = "(".into();
        assert!(matches!(
            CloseButtonMatcher::new(&config.close_buttons),
            Err(NavError::InvalidPattern { .. })
        ));
        assert!(!Guardrail::new(&config).audit_enabled());
    }

    #[test]
    fn test_debouncer_collapses_bursts() {
        let mut debounce = Debouncer::new(300);
        assert!(!debounce.take_ready(0.0));

        debounce.record(0.0);
        debounce.record(100.0);
        debounce.record(250.0);
        assert!(!debounce.take_ready(400.0));
        assert!(debounce.take_ready(550.0));
        assert!(!debounce.take_ready(900.0));
        assert!(!debounce.is_pending());
    }

    #[test]
    fn test_violation_display() {
        let violation = Violation::OverlayOverflow { count: 6, ceiling: 5 };
        assert_eq!(violation.to_string(), "6 overlays open (ceiling 5)");
    }
}
