use crate::supervisor::ProcessSupervisor;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

fn default_max_restarts() -> u32 {
    3
}

fn default_check_interval_ms() -> u64 {
    1000
}

fn default_backoff_ms() -> u64 {
    500
}

/// Restart budget for a recognizer that dies on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartPolicy {
    #[serde(default = "default_max_restarts")]
    pub max_restarts: u32,
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            max_restarts: default_max_restarts(),
            check_interval_ms: default_check_interval_ms(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

pub struct WatchdogHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<u32>,
}

impl WatchdogHandle {
    /// Stops the watchdog and returns how many restarts it performed.
    pub async fn stop(self) -> u32 {
        let _ = self.shutdown.send(true);
        self.task.await.unwrap_or_default()
    }
}

/// Polls the supervisor and restarts the recognizer when it exits, until the
/// restart budget is spent.
pub fn spawn_watchdog(supervisor: Arc<ProcessSupervisor>, policy: RestartPolicy) -> WatchdogHandle {
    let (shutdown, mut stop_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut restarts = 0u32;
        let mut ticker =
            tokio::time::interval(Duration::from_millis(policy.check_interval_ms.max(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = stop_rx.changed() => break,
                _ = ticker.tick() => {}
            }

            if !supervisor.has_exited() {
                continue;
            }

            if restarts >= policy.max_restarts {
                tracing::error!(
                    "Recognizer exited after {} restarts, voice input disabled",
                    restarts
                );
                supervisor.stop().await;
                break;
            }

            tokio::select! {
                _ = stop_rx.changed() => break,
                _ = tokio::time::sleep(Duration::from_millis(policy.backoff_ms)) => {}
            }

            restarts += 1;
            match supervisor.restart_if_exited().await {
                Ok(Some(handle)) => {
                    tracing::info!(pid = ?handle.pid, restarts, "Recognizer restarted")
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Restart {} failed: {}", restarts, e),
            }
        }

        restarts
    });

    WatchdogHandle { shutdown, task }
}
