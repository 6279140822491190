use voxgate_interfaces::ActionError;

/// A host-owned action bound to a command.
///
/// Invoked on the host's UI context with the canonical command name.
pub trait CommandAction: Send + Sync {
    fn invoke(&self, command: &str) -> Result<(), ActionError>;
}

impl<F> CommandAction for F
where
    F: Fn(&str) -> Result<(), ActionError> + Send + Sync,
{
    fn invoke(&self, command: &str) -> Result<(), ActionError> {
        self(command)
    }
}
