//! Owns the recognizer process lifetime: primary/fallback launch, bounded stop,
//! liveness and restart.

use crate::health::{self, ProcessSample};
use crate::launcher::{
    LaunchStrategy, OsSpawner, ProcessSpawner, RecognizerProcess, SpawnError, StrategyKind,
    Termination,
};
use crate::watchdog::RestartPolicy;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

fn default_stop_timeout_ms() -> u64 {
    3000
}

fn default_startup_probe_ms() -> u64 {
    3000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    pub primary: LaunchStrategy,
    #[serde(default)]
    pub fallback: Option<LaunchStrategy>,
    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,
    /// How long a fresh process must stay alive to count as started. 0 disables the check.
    #[serde(default = "default_startup_probe_ms")]
    pub startup_probe_ms: u64,
    #[serde(default)]
    pub restart: Option<RestartPolicy>,
    #[serde(default)]
    pub show_output: bool,
}

impl SupervisorConfig {
    pub fn new(primary: LaunchStrategy, fallback: Option<LaunchStrategy>) -> Self {
        Self {
            primary,
            fallback,
            stop_timeout_ms: default_stop_timeout_ms(),
            startup_probe_ms: default_startup_probe_ms(),
            restart: None,
            show_output: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessHandle {
    pub pid: Option<u32>,
    pub strategy: StrategyKind,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct LaunchAttempt {
    pub strategy: StrategyKind,
    pub reason: SpawnError,
}

impl fmt::Display for LaunchAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.reason)
    }
}

#[derive(Debug, Error)]
#[error("Recognizer could not be started ({})", summarize(.attempts))]
pub struct LaunchError {
    pub attempts: Vec<LaunchAttempt>,
}

fn summarize(attempts: &[LaunchAttempt]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Serialize)]
pub struct SupervisorStatus {
    pub handle: Option<ProcessHandle>,
    pub alive: bool,
    pub sample: Option<ProcessSample>,
}

struct Running {
    process: Box<dyn RecognizerProcess>,
    handle: ProcessHandle,
}

pub struct ProcessSupervisor {
    spawner: Arc<dyn ProcessSpawner>,
    primary: LaunchStrategy,
    fallback: Option<LaunchStrategy>,
    stop_timeout: Duration,
    startup_grace: Duration,
    current: Mutex<Option<Running>>,
    // Serializes start/stop so two callers never race to own the slot.
    lifecycle: tokio::sync::Mutex<()>,
}

impl ProcessSupervisor {
    pub fn new(spawner: Arc<dyn ProcessSpawner>, config: &SupervisorConfig) -> Self {
        Self {
            spawner,
            primary: config.primary.clone(),
            fallback: config.fallback.clone(),
            stop_timeout: Duration::from_millis(config.stop_timeout_ms),
            startup_grace: Duration::from_millis(config.startup_probe_ms),
            current: Mutex::new(None),
            lifecycle: tokio::sync::Mutex::new(()),
        }
    }

    /// Supervisor backed by real OS processes.
    pub fn from_config(config: &SupervisorConfig) -> Self {
        Self::new(Arc::new(OsSpawner::new(config.show_output)), config)
    }

    /// Starts the recognizer, trying the primary strategy and then the
    /// fallback. A live process from an earlier start is stopped first.
    pub async fn start(&self) -> Result<ProcessHandle, LaunchError> {
        let _guard = self.lifecycle.lock().await;
        self.start_locked().await
    }

    /// Caller holds `lifecycle`.
    async fn start_locked(&self) -> Result<ProcessHandle, LaunchError> {
        self.stop_current().await;

        let mut attempts = Vec::new();
        let strategies = std::iter::once((StrategyKind::Primary, &self.primary)).chain(
            self.fallback
                .as_ref()
                .map(|strategy| (StrategyKind::Fallback, strategy)),
        );

        for (kind, strategy) in strategies {
            match self.launch(strategy).await {
                Ok(process) => {
                    let handle = ProcessHandle {
                        pid: process.id(),
                        strategy: kind,
                        started_at: Utc::now(),
                    };
                    tracing::info!(
                        pid = ?handle.pid,
                        "Recognizer started with {} strategy",
                        kind
                    );
                    *self.current.lock() = Some(Running {
                        process,
                        handle: handle.clone(),
                    });
                    return Ok(handle);
                }
                Err(reason) => {
                    tracing::warn!("{} launch failed: {}", kind, reason);
                    attempts.push(LaunchAttempt {
                        strategy: kind,
                        reason,
                    });
                }
            }
        }

        Err(LaunchError { attempts })
    }

    async fn launch(
        &self,
        strategy: &LaunchStrategy,
    ) -> Result<Box<dyn RecognizerProcess>, SpawnError> {
        let mut process = self.spawner.spawn(strategy)?;
        if self.startup_grace.is_zero() {
            return Ok(process);
        }

        tokio::time::sleep(self.startup_grace).await;
        if process.is_alive() {
            Ok(process)
        } else {
            Err(SpawnError::EarlyExit(strategy.to_string()))
        }
    }

    /// Graceful stop with a bounded wait, then force. No-op when nothing runs.
    pub async fn stop(&self) {
        let _guard = self.lifecycle.lock().await;
        self.stop_current().await;
    }

    async fn stop_current(&self) {
        let running = self.current.lock().take();
        let Some(mut running) = running else {
            return;
        };

        match running.process.terminate(self.stop_timeout).await {
            Termination::Failed(e) => {
                tracing::error!(pid = ?running.handle.pid, "Failed to stop recognizer: {}", e)
            }
            outcome => {
                tracing::info!(pid = ?running.handle.pid, "Recognizer stopped: {:?}", outcome)
            }
        }
    }

    /// Forced kill without waiting. Safe to call from synchronous drop paths.
    pub fn kill_now(&self) {
        if let Some(mut running) = self.current.lock().take() {
            running.process.kill_now();
            tracing::info!(pid = ?running.handle.pid, "Recognizer killed");
        }
    }

    pub fn is_running(&self) -> bool {
        self.current
            .lock()
            .as_mut()
            .map(|running| running.process.is_alive())
            .unwrap_or(false)
    }

    /// A process was started and has since died on its own.
    pub fn has_exited(&self) -> bool {
        self.current
            .lock()
            .as_mut()
            .map(|running| !running.process.is_alive())
            .unwrap_or(false)
    }

    /// Restarts when the supervised process died. `Ok(None)` when no restart was needed.
    ///
    /// The exit check runs under the lifecycle lock, so a concurrent `stop`
    /// either happens first (nothing to restart) or after the restart.
    pub async fn restart_if_exited(&self) -> Result<Option<ProcessHandle>, LaunchError> {
        let _guard = self.lifecycle.lock().await;
        if !self.has_exited() {
            return Ok(None);
        }
        tracing::warn!("Recognizer exited unexpectedly, restarting");
        self.start_locked().await.map(Some)
    }

    pub fn current_handle(&self) -> Option<ProcessHandle> {
        self.current
            .lock()
            .as_ref()
            .map(|running| running.handle.clone())
    }

    pub fn status(&self) -> SupervisorStatus {
        let handle = self.current_handle();
        let alive = self.is_running();
        let sample = handle
            .as_ref()
            .and_then(|handle| handle.pid)
            .filter(|_| alive)
            .and_then(health::sample);
        SupervisorStatus {
            handle,
            alive,
            sample,
        }
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        self.kill_now();
    }
}

/// Kills the recognizer when the owning scope exits, on every path that unwinds.
/// An abnormal host death (SIGKILL, abort) still orphans the process.
pub struct SupervisorGuard {
    supervisor: Arc<ProcessSupervisor>,
}

impl SupervisorGuard {
    pub fn new(supervisor: Arc<ProcessSupervisor>) -> Self {
        Self { supervisor }
    }

    pub fn supervisor(&self) -> &Arc<ProcessSupervisor> {
        &self.supervisor
    }
}

impl Drop for SupervisorGuard {
    fn drop(&mut self) {
        self.supervisor.kill_now();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn standalone(executable: &str, args: &[&str], dir: &std::path::Path) -> LaunchStrategy {
        LaunchStrategy::Standalone {
            executable: PathBuf::from(executable),
            args: args.iter().map(|a| a.to_string()).collect(),
            working_dir: dir.to_path_buf(),
        }
    }

    #[tokio::test]
    async fn test_startup_check_rejects_process_that_exits_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SupervisorConfig::new(
            standalone("true", &[], dir.path()),
            Some(standalone("sleep", &["30"], dir.path())),
        );
        config.startup_probe_ms = 300;

        let supervisor = ProcessSupervisor::from_config(&config);
        let handle = supervisor.start().await.unwrap();
        assert_eq!(handle.strategy, StrategyKind::Fallback);
        assert!(supervisor.is_running());

        supervisor.stop().await;
        assert!(!supervisor.is_running());
    }

    #[tokio::test]
    async fn test_status_samples_live_process() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SupervisorConfig::new(standalone("sleep", &["30"], dir.path()), None);
        config.startup_probe_ms = 0;

        let supervisor = ProcessSupervisor::from_config(&config);
        let handle = supervisor.start().await.unwrap();
        let status = supervisor.status();
        assert!(status.alive);
        assert_eq!(status.handle, Some(handle.clone()));
        assert_eq!(status.sample.map(|s| s.pid), handle.pid);

        supervisor.stop().await;
        let status = supervisor.status();
        assert!(!status.alive);
        assert!(status.handle.is_none());
    }

    #[tokio::test]
    async fn test_guard_kills_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SupervisorConfig::new(standalone("sleep", &["30"], dir.path()), None);
        config.startup_probe_ms = 0;

        let supervisor = Arc::new(ProcessSupervisor::from_config(&config));
        let pid = supervisor.start().await.unwrap().pid.unwrap();
        {
            let _guard = SupervisorGuard::new(supervisor.clone());
        }
        assert!(supervisor.current_handle().is_none());
        assert!(!supervisor.is_running());

        // The kill is delivered asynchronously; wait for the OS to drop the pid.
        let mut gone = false;
        for _ in 0..50 {
            if health::sample(pid).is_none() {
                gone = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(gone, "pid {} still alive after guard drop", pid);
    }
}
