use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a single conversation session.
///
/// ```text
/// Idle -> Running <-> WaitingForInput
///             |
///             +-> Completed | Failed | Cancelled
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Created but not yet started.
    #[default]
    Idle,
    /// Actively stepping through nodes.
    Running,
    /// Parked on an input node until a reply or timeout.
    WaitingForInput,
    /// Reached the end of the flow.
    Completed,
    /// Stopped by an unrecoverable error, input timeout, or step budget.
    Failed,
    /// Stopped by an explicit cancel.
    Cancelled,
}

impl SessionStatus {
    /// Terminal states never transition again.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::WaitingForInput => "waiting_for_input",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// Messages delivered into a running session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundEvent {
    /// End-user reply to an input prompt.
    Reply(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Failed.is_terminal());
        assert!(SessionStatus::Cancelled.is_terminal());
        assert!(!SessionStatus::Running.is_terminal());
        assert!(!SessionStatus::WaitingForInput.is_terminal());
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&SessionStatus::WaitingForInput).unwrap();
        assert_eq!(json, r#""waiting_for_input""#);
    }
}
