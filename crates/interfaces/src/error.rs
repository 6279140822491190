use thiserror::Error;

/// Failure of a host-bound action, caught at the dispatch boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("Action failed: {0}")]
    Failed(String),
    #[error("Action panicked: {0}")]
    Panicked(String),
    #[error("UI context is not accepting work")]
    UiClosed,
}

impl ActionError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
