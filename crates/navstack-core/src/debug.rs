//! Category-tagged debug sink.
//!
//! Every component reports its transitions here. Entries are kept in a
//! bounded [`RingBuffer`] for in-app inspection and mirrored to `tracing`.
//! When the sink is disabled (release builds) every operation is a no-op.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ring_buffer::RingBuffer;

/// Source component of a debug entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogCategory {
    Overlay,
    Screen,
    Scroll,
    Close,
    History,
    Guardrail,
}

impl LogCategory {
    pub const ALL: [LogCategory; 6] = [
        Self::Overlay,
        Self::Screen,
        Self::Scroll,
        Self::Close,
        Self::History,
        Self::Guardrail,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overlay => "overlay",
            Self::Screen => "screen",
            Self::Scroll => "scroll",
            Self::Close => "close",
            Self::History => "history",
            Self::Guardrail => "guardrail",
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recorded event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugEntry {
    pub timestamp: f64,
    pub category: LogCategory,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Ring-buffered, category-filtered log channel.
#[derive(Debug, Clone)]
pub struct DebugSink {
    enabled: bool,
    muted: HashSet<LogCategory>,
    entries: RingBuffer<DebugEntry>,
}

impl DebugSink {
    pub fn new(capacity: usize, enabled: bool) -> Self {
        Self {
            enabled,
            muted: HashSet::new(),
            entries: RingBuffer::new(capacity.max(1)),
        }
    }

    /// A sink that records nothing.
    pub fn disabled() -> Self {
        Self::new(1, false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_category_enabled(&self, category: LogCategory) -> bool {
        self.enabled && !self.muted.contains(&category)
    }

    /// Records an event.
    pub fn log(
        &mut self,
        timestamp: f64,
        category: LogCategory,
        action: &str,
        details: Option<Value>,
    ) {
        if !self.is_category_enabled(category) {
            return;
        }
        tracing::debug!(category = %category, action, details = ?details, "navstack");
        self.entries.push(DebugEntry {
            timestamp,
            category,
            action: action.to_string(),
            details,
        });
    }

    /// Snapshot of all retained entries, oldest first.
    pub fn logs(&self) -> Vec<DebugEntry> {
        if !self.enabled {
            return Vec::new();
        }
        self.entries.to_vec()
    }

    pub fn logs_for(&self, category: LogCategory) -> Vec<DebugEntry> {
        self.entries
            .iter()
            .filter(|e| e.category == category)
            .cloned()
            .collect()
    }

    pub fn clear_logs(&mut self) {
        if self.enabled {
            self.entries.clear();
        }
    }

    /// Mutes or unmutes a category. Muting does not drop retained entries.
    pub fn toggle_category(&mut self, category: LogCategory, enabled: bool) {
        if !self.enabled {
            return;
        }
        if enabled {
            self.muted.remove(&category);
        } else {
            self.muted.insert(category);
        }
    }

    /// Serializes retained entries as a JSON array (for copy-to-clipboard).
    pub fn export_json(&self) -> String {
        serde_json::to_string(&self.logs()).unwrap_or_else(|_| "[]".to_string())
    }
}

impl Default for DebugSink {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_DEBUG_LOG_CAPACITY, cfg!(debug_assertions))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_log_and_read_back() {
        let mut sink = DebugSink::new(10, true);
        sink.log(1.0, LogCategory::Overlay, "register", Some(json!({ "id": "a" })));
        sink.log(2.0, LogCategory::Close, "trigger", None);

        let logs = sink.logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].action, "register");
        assert_eq!(logs[1].category, LogCategory::Close);
        assert_eq!(sink.logs_for(LogCategory::Overlay).len(), 1);
    }

    #[test]
    fn test_disabled_sink_is_noop() {
        let mut sink = DebugSink::disabled();
        sink.log(1.0, LogCategory::Overlay, "register", None);
        sink.toggle_category(LogCategory::Overlay, false);
        assert!(sink.logs().is_empty());
        assert!(!sink.is_category_enabled(LogCategory::Screen));
    }

    #[test]
    fn test_toggle_category_mutes_new_entries() {
        let mut sink = DebugSink::new(10, true);
        sink.toggle_category(LogCategory::Scroll, false);
        sink.log(1.0, LogCategory::Scroll, "save", None);
        assert!(sink.logs().is_empty());

        sink.toggle_category(LogCategory::Scroll, true);
        sink.log(2.0, LogCategory::Scroll, "save", None);
        assert_eq!(sink.logs().len(), 1);
    }

    #[test]
    fn test_capacity_bound_and_clear() {
        let mut sink = DebugSink::new(3, true);
        for i in 0..5 {
            sink.log(i as f64, LogCategory::Guardrail, "pass", None);
        }
        let logs = sink.logs();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].timestamp, 2.0);

        sink.clear_logs();
        assert!(sink.logs().is_empty());
    }

    #[test]
    fn test_export_json() {
        let mut sink = DebugSink::new(4, true);
        sink.log(5.0, LogCategory::History, "arm", None);
        let exported = sink.export_json();
        assert!(exported.contains("\"category\":\"history\""));
        assert!(!exported.contains("details"));
    }
}
