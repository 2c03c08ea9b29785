use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::action::OutboundAction;
use crate::errors::ErrorReport;
use crate::session::SessionStatus;

/// Everything the engine tells the outside world about a session.
///
/// Events are broadcast through the [`EventHub`](super::EventHub); subscribers
/// receive them in emission order per session. `Outbound` carries a
/// monotonically increasing `sequence` so consumers can detect gaps after a
/// lagged subscription.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A visible action produced by a node (message, media, input prompt).
    Outbound {
        session_id: String,
        sequence: u64,
        action: OutboundAction,
    },
    /// The session moved to a new lifecycle status.
    StateChange {
        session_id: String,
        status: SessionStatus,
    },
    /// A recoverable or fatal error surfaced during execution.
    Error {
        session_id: String,
        report: ErrorReport,
    },
    /// The session reached the end of its flow; carries the final variables.
    Completed {
        session_id: String,
        variables: BTreeMap<String, String>,
    },
}

impl EngineEvent {
    pub fn outbound(
        session_id: impl Into<String>,
        sequence: u64,
        action: OutboundAction,
    ) -> Self {
        Self::Outbound {
            session_id: session_id.into(),
            sequence,
            action,
        }
    }

    pub fn state_change(session_id: impl Into<String>, status: SessionStatus) -> Self {
        Self::StateChange {
            session_id: session_id.into(),
            status,
        }
    }

    pub fn error(session_id: impl Into<String>, report: ErrorReport) -> Self {
        Self::Error {
            session_id: session_id.into(),
            report,
        }
    }

    pub fn completed(
        session_id: impl Into<String>,
        variables: BTreeMap<String, String>,
    ) -> Self {
        Self::Completed {
            session_id: session_id.into(),
            variables,
        }
    }

    /// Session the event belongs to.
    pub fn session_id(&self) -> &str {
        match self {
            Self::Outbound { session_id, .. }
            | Self::StateChange { session_id, .. }
            | Self::Error { session_id, .. }
            | Self::Completed { session_id, .. } => session_id,
        }
    }

    /// Stable label for filtering and log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Outbound { .. } => "outbound",
            Self::StateChange { .. } => "state_change",
            Self::Error { .. } => "error",
            Self::Completed { .. } => "completed",
        }
    }
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outbound {
                session_id,
                sequence,
                action,
            } => write!(f, "[{session_id}] #{sequence} {action}"),
            Self::StateChange { session_id, status } => {
                write!(f, "[{session_id}] -> {status}")
            }
            Self::Error { session_id, report } => {
                write!(f, "[{session_id}] error: {}", report.error)
            }
            Self::Completed {
                session_id,
                variables,
            } => write!(f, "[{session_id}] completed ({} variables)", variables.len()),
        }
    }
}
