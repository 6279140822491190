use crate::error::ActionError;
use async_trait::async_trait;

/// A unit of work that must run on the host's UI-owning execution context.
pub type UiJob = Box<dyn FnOnce() -> Result<(), ActionError> + Send + 'static>;

/// The host's single UI execution context.
///
/// The router polls off this context and hands every bound action to `run`,
/// which resolves once the job has finished on the UI side.
#[async_trait]
pub trait UiDispatcher: Send + Sync {
    async fn run(&self, job: UiJob) -> Result<(), ActionError>;
}

/// Console surface used by the reference host to receive host events.
#[async_trait]
pub trait Interface: Send + Sync {
    async fn receive_input(&self) -> Option<String>;
    async fn send_output(&self, message: &str);
    async fn show_status(&self, status: &str);
}
