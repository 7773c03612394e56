//! Error types for the navigation core.
//!
//! Only configuration and environment problems are errors. Consistency
//! violations between the registries are reported as
//! [`Violation`](crate::guardrail::Violation) values and never surface here.
//!
//! - Configuration errors are programmer mistakes and should fail loudly at
//!   the call site.
//! - Environment errors (storage unavailable, serialization) are caught where
//!   they happen and degrade to a warning log.

use thiserror::Error;

/// Errors produced by the navigation core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    /// An overlay or screen was registered without an identifier.
    #[error("missing identifier for {0}")]
    MissingIdentifier(&'static str),

    /// Identifier contains characters outside `[A-Za-z0-9_:.-]` or is too long.
    #[error("invalid identifier {0:?} (use letters, digits, '_', ':', '.', '-')")]
    InvalidIdentifier(String),

    /// A hook was used outside of the provider that supplies its context.
    #[error("{0} used outside of its provider")]
    MissingContext(&'static str),

    /// A guardrail heuristic pattern failed to compile.
    #[error("invalid heuristic pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Screen container reference was not attached when validated.
    #[error("screen {0} has no attached container")]
    DetachedContainer(String),

    /// Browser storage is not available (private mode, sandboxed iframe).
    #[error("session storage not available")]
    StorageUnavailable,

    /// Failed to (de)serialize a persisted record.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Storage rejected the write (quota exceeded).
    #[error("failed to write to session storage")]
    StorageWrite,
}

impl From<serde_json::Error> for NavError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, NavError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            NavError::MissingIdentifier("overlay").to_string(),
            "missing identifier for overlay"
        );
        assert_eq!(
            NavError::MissingContext("use_screen_context").to_string(),
            "use_screen_context used outside of its provider"
        );
        assert!(
            NavError::InvalidIdentifier("a b".into())
                .to_string()
                .contains("\"a b\"")
        );
    }

    #[test]
    fn test_from_serde_error() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(matches!(NavError::from(err), NavError::Serialization(_)));
    }
}
