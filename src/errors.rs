//! Structured error reports for recoverable runtime failures.
//!
//! Fatal errors travel through each module's `thiserror` enums; recoverable
//! failures (an unknown condition operator, an exhausted transport retry that
//! still has an else branch, malformed header JSON) are wrapped in an
//! [`ErrorReport`] and published on the session event stream so they are
//! observable without aborting the session. No failure path in the engine is
//! silently dropped: it either changes observable session state or emits a
//! report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recoverable error observed during flow execution.
///
/// # JSON Serialization Format
///
/// ```json
/// {
///   "when": "2026-08-31T10:30:00Z",
///   "scope": { "scope": "node", "id": "check-age", "step": 4 },
///   "error": {
///     "message": "unknown condition operator: \"matches\"",
///     "cause": null,
///     "details": null
///   },
///   "tags": ["condition"],
///   "context": { "operator": "matches" }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ErrorReport {
    #[serde(default = "chrono::Utc::now")]
    pub when: DateTime<Utc>,
    #[serde(default)]
    pub scope: ErrorScope,
    #[serde(default)]
    pub error: CauseChain,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub context: serde_json::Value,
}

impl ErrorReport {
    /// Create a node-scoped report.
    pub fn node(id: impl Into<String>, step: u64, error: CauseChain) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Node {
                id: id.into(),
                step,
            },
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    /// Create a session-scoped report.
    pub fn session(id: impl Into<String>, error: CauseChain) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Session { id: id.into() },
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    /// Create a flow-load-scoped report.
    pub fn flow(error: CauseChain) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Flow,
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = context;
        self
    }
}

/// Where in the engine a report originated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ErrorScope {
    /// A specific node, identified by its authored id and the session step at
    /// which it ran.
    Node { id: String, step: u64 },
    /// The session as a whole (timeouts, budget exhaustion).
    Session { id: String },
    /// Flow validation, before any session exists.
    Flow,
    #[default]
    Engine,
}

/// Error message with an optional chained cause and free-form details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CauseChain {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<CauseChain>>,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl Default for CauseChain {
    fn default() -> Self {
        Self {
            message: String::new(),
            cause: None,
            details: serde_json::Value::Null,
        }
    }
}

impl std::fmt::Display for CauseChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CauseChain {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_ref().map(|c| c as &dyn std::error::Error)
    }
}

impl CauseChain {
    pub fn msg(m: impl Into<String>) -> Self {
        Self {
            message: m.into(),
            cause: None,
            details: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn with_cause(mut self, cause: CauseChain) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}
