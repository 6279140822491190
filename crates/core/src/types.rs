use std::fmt;
use voxgate_interfaces::ActionError;
use voxgate_policy::DenyReason;

/// What became of one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Dispatched { command: String },
    Unknown { utterance: String },
    Blocked { command: String, reason: DenyReason },
    Faulted { command: String, error: ActionError },
}

impl DispatchOutcome {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, DispatchOutcome::Dispatched { .. })
    }

    /// Canonical command name, if the utterance resolved to one.
    pub fn command(&self) -> Option<&str> {
        match self {
            DispatchOutcome::Dispatched { command }
            | DispatchOutcome::Blocked { command, .. }
            | DispatchOutcome::Faulted { command, .. } => Some(command),
            DispatchOutcome::Unknown { .. } => None,
        }
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchOutcome::Dispatched { command } => write!(f, "dispatched '{}'", command),
            DispatchOutcome::Unknown { utterance } => write!(f, "unknown '{}'", utterance),
            DispatchOutcome::Blocked { command, reason } => {
                write!(f, "blocked '{}': {}", command, reason)
            }
            DispatchOutcome::Faulted { command, error } => {
                write!(f, "'{}' failed: {}", command, error)
            }
        }
    }
}
