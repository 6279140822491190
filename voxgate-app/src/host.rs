//! Wiring between the configuration and the runtime services.

use crate::config::AppConfig;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::Notify;
use voxgate_channel::ChannelWriter;
use voxgate_commands::{ActionBinder, CommandAction, CommandKind, CommandSpec};
use voxgate_core::CommandRouter;
use voxgate_executor::ProcessSupervisor;
use voxgate_interfaces::{ActionError, UiDispatcher};
use voxgate_policy::{SecurityGate, SessionHandle, WindowKind};

/// Stand-in host actions: windows are logged rather than drawn, and every
/// navigation reports the activated window back to the session.
pub struct HostActions {
    session: SessionHandle,
    exit: Arc<Notify>,
}

impl HostActions {
    pub fn new(session: SessionHandle, exit: Arc<Notify>) -> Self {
        Self { session, exit }
    }
}

impl ActionBinder for HostActions {
    fn bind(&self, spec: &CommandSpec) -> Option<Arc<dyn CommandAction>> {
        let action: Arc<dyn CommandAction> = match spec.kind.clone() {
            CommandKind::Navigate { target } => {
                let session = self.session.clone();
                Arc::new(move |name: &str| -> Result<(), ActionError> {
                    tracing::info!("'{}': showing {}", name, target);
                    session.on_window_activated(target);
                    Ok(())
                })
            }
            CommandKind::Logout => Arc::new(|_: &str| -> Result<(), ActionError> {
                tracing::info!("Logged out, showing {}", WindowKind::Login);
                Ok(())
            }),
            CommandKind::Action { id } if id == "exit_app" => {
                let exit = self.exit.clone();
                Arc::new(move |_: &str| -> Result<(), ActionError> {
                    tracing::info!("Exit requested by voice");
                    exit.notify_one();
                    Ok(())
                })
            }
            CommandKind::Action { id } => Arc::new(move |name: &str| -> Result<(), ActionError> {
                tracing::info!("'{}': {}", name, id);
                Ok(())
            }),
        };
        Some(action)
    }
}

/// Everything the console host drives. Nothing here is started yet.
pub struct Services {
    pub session: SessionHandle,
    pub router: Arc<CommandRouter>,
    pub writer: ChannelWriter,
    pub supervisor: Option<Arc<ProcessSupervisor>>,
    pub exit: Arc<Notify>,
}

impl Services {
    pub fn assemble(config: &AppConfig, ui: Arc<dyn UiDispatcher>) -> Result<Self> {
        let session = SessionHandle::new();
        let exit = Arc::new(Notify::new());

        let binder = HostActions::new(session.clone(), exit.clone());
        let registry = config
            .command_table()
            .build(&binder)
            .context("Invalid command table")?;
        let gate = SecurityGate::new(session.clone(), config.navigation_table());
        let router = CommandRouter::new(Arc::new(registry), Arc::new(gate), ui, &config.router);

        let supervisor = config
            .recognizer
            .as_ref()
            .map(|recognizer| Arc::new(ProcessSupervisor::from_config(recognizer)));

        Ok(Self {
            session,
            router: Arc::new(router),
            writer: config.channel.writer(),
            supervisor,
            exit,
        })
    }
}
