//! Poll loop that turns recognized utterances into gated actions on the UI context.

use crate::metrics::RouterMetrics;
use crate::types::DispatchOutcome;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use voxgate_channel::CommandChannel;
use voxgate_commands::{normalize, CommandRegistry};
use voxgate_interfaces::UiDispatcher;
use voxgate_policy::{GateDecision, SecurityGate};

fn default_poll_interval_ms() -> u64 {
    20
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Channel poll period. Lower values cut latency at the cost of wakeups.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

pub struct CommandRouter {
    registry: Arc<CommandRegistry>,
    gate: Arc<SecurityGate>,
    ui: Arc<dyn UiDispatcher>,
    metrics: Arc<RouterMetrics>,
    poll_interval: Duration,
}

impl CommandRouter {
    pub fn new(
        registry: Arc<CommandRegistry>,
        gate: Arc<SecurityGate>,
        ui: Arc<dyn UiDispatcher>,
        config: &RouterConfig,
    ) -> Self {
        Self {
            registry,
            gate,
            ui,
            metrics: RouterMetrics::new(),
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
        }
    }

    pub fn metrics(&self) -> Arc<RouterMetrics> {
        self.metrics.clone()
    }

    pub fn gate(&self) -> &Arc<SecurityGate> {
        &self.gate
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Resolves, authorizes and dispatches one utterance.
    ///
    /// Lookup and both gate checks read a single session snapshot, so a login
    /// event racing with the utterance cannot split the decision.
    pub async fn handle_utterance(&self, raw: &str) -> DispatchOutcome {
        self.metrics.inc_utterances();
        let phrase = normalize(raw);
        let session = self.gate.session().snapshot();

        let Some(definition) = self.registry.resolve(&phrase, session.active_window) else {
            tracing::info!(window = %session.active_window, "Unrecognized command: {:?}", phrase);
            self.metrics.inc_unknown();
            return DispatchOutcome::Unknown { utterance: phrase };
        };
        let command = definition.name().to_string();

        if let GateDecision::Denied(reason) = self.gate.authorize_at(&**definition, &session)
        {
            self.metrics.inc_blocked();
            return DispatchOutcome::Blocked { command, reason };
        }

        if let Some(target) = definition.navigation_target() {
            if let GateDecision::Denied(reason) =
                self.gate
                    .authorize_navigation_at(&session, session.active_window, target)
            {
                self.metrics.inc_blocked();
                return DispatchOutcome::Blocked { command, reason };
            }
        }

        if definition.is_logout() {
            self.gate.session().on_logout();
        }

        let action = definition.action();
        let name = command.clone();
        tracing::debug!("Dispatching '{}'", command);
        match self.ui.run(Box::new(move || action.invoke(&name))).await {
            Ok(()) => {
                self.metrics.inc_dispatched();
                DispatchOutcome::Dispatched { command }
            }
            Err(error) => {
                tracing::error!("Action '{}' failed: {}", command, error);
                self.metrics.inc_faulted();
                DispatchOutcome::Faulted { command, error }
            }
        }
    }

    /// One poll: consume the channel slot and handle whatever it held.
    pub async fn tick(&self, channel: &mut CommandChannel) -> Option<DispatchOutcome> {
        let utterance = channel.try_consume().await?;
        tracing::debug!("Heard: {:?}", utterance);
        Some(self.handle_utterance(&utterance).await)
    }

    /// Runs the poll loop off the UI context until the handle is stopped.
    /// The channel slot is cleared first so stale text from an earlier run is ignored.
    pub fn spawn(self: Arc<Self>, mut channel: CommandChannel) -> RouterHandle {
        let (shutdown, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            if let Err(e) = channel.reset().await {
                tracing::warn!("Could not reset command channel: {}", e);
            }

            let mut ticker = tokio::time::interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::info!(
                interval_ms = self.poll_interval.as_millis() as u64,
                "Command router polling {:?}",
                channel.path()
            );

            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        self.tick(&mut channel).await;
                    }
                }
            }

            tracing::info!("Command router stopped");
            channel
        });

        RouterHandle { shutdown, task }
    }
}

pub struct RouterHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<CommandChannel>,
}

impl RouterHandle {
    /// Stops polling. Any dispatch in flight finishes first.
    pub async fn stop(self) -> Option<CommandChannel> {
        let _ = self.shutdown.send(true);
        match self.task.await {
            Ok(channel) => Some(channel),
            Err(e) => {
                tracing::error!("Router task ended abnormally: {}", e);
                None
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use voxgate_commands::{CommandAction, CommandDefinition, CommandScope};
    use voxgate_interfaces::{ActionError, InlineUi};
    use voxgate_policy::{NavigationTable, SessionHandle, WindowKind};

    fn router(registry: CommandRegistry) -> (CommandRouter, SessionHandle) {
        let session = SessionHandle::new();
        let gate = SecurityGate::new(session.clone(), NavigationTable::default());
        let router = CommandRouter::new(
            Arc::new(registry),
            Arc::new(gate),
            Arc::new(InlineUi),
            &RouterConfig::default(),
        );
        (router, session)
    }

    fn counting(hits: &Arc<AtomicUsize>) -> Arc<dyn CommandAction> {
        let hits = hits.clone();
        Arc::new(move |_: &str| -> Result<(), ActionError> {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[tokio::test]
    async fn test_window_scope_shadows_global() {
        let global = Arc::new(AtomicUsize::new(0));
        let scoped = Arc::new(AtomicUsize::new(0));

        let mut builder = CommandRegistry::builder();
        builder
            .register_global("capture face", ["take photo"], false, counting(&global))
            .unwrap()
            .register_window(
                WindowKind::SignUp,
                "capture face",
                Vec::<String>::new(),
                false,
                counting(&scoped),
            )
            .unwrap();
        let (router, session) = router(builder.build());

        router.handle_utterance("capture face").await;
        session.on_window_activated(WindowKind::SignUp);
        router.handle_utterance("Capture Face").await;
        // Aliases of the global entry still resolve inside the window.
        router.handle_utterance("take photo").await;

        assert_eq!(global.load(Ordering::SeqCst), 2);
        assert_eq!(scoped.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_action_fault_is_contained() {
        let failing: Arc<dyn CommandAction> =
            Arc::new(|_: &str| -> Result<(), ActionError> {
                Err(ActionError::failed("window handle gone"))
            });
        let mut builder = CommandRegistry::builder();
        builder
            .register(CommandDefinition::new("minimize", CommandScope::Global, failing))
            .unwrap();
        let (router, _) = router(builder.build());

        let outcome = router.handle_utterance("minimize").await;
        assert_eq!(
            outcome,
            DispatchOutcome::Faulted {
                command: "minimize".to_string(),
                error: ActionError::failed("window handle gone"),
            }
        );
        assert_eq!(router.metrics().snapshot().faulted, 1);
    }

    #[tokio::test]
    async fn test_blank_utterance_is_unknown() {
        let (router, _) = router(CommandRegistry::builder().build());
        let outcome = router.handle_utterance("   ").await;
        assert_eq!(
            outcome,
            DispatchOutcome::Unknown {
                utterance: String::new()
            }
        );
        assert_eq!(outcome.command(), None);
    }
}
