//! Launch strategies and the OS seam used to start the recognizer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::{Child, Command};

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("Working directory missing: {}", .0.display())]
    MissingWorkingDir(PathBuf),
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Process exited during startup: {0}")]
    EarlyExit(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Primary,
    Fallback,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Primary => f.write_str("primary"),
            StrategyKind::Fallback => f.write_str("fallback"),
        }
    }
}

/// One way of starting the recognizer. Both kinds run inside `working_dir`,
/// which holds the channel file and the model assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LaunchStrategy {
    Interpreter {
        interpreter: PathBuf,
        script: PathBuf,
        #[serde(default)]
        args: Vec<String>,
        working_dir: PathBuf,
    },
    Standalone {
        executable: PathBuf,
        #[serde(default)]
        args: Vec<String>,
        working_dir: PathBuf,
    },
}

impl LaunchStrategy {
    pub fn working_dir(&self) -> &Path {
        match self {
            LaunchStrategy::Interpreter { working_dir, .. } => working_dir,
            LaunchStrategy::Standalone { working_dir, .. } => working_dir,
        }
    }

    /// Program to execute. A relative standalone executable that exists in the
    /// working directory is resolved against it.
    pub fn program(&self) -> PathBuf {
        match self {
            LaunchStrategy::Interpreter { interpreter, .. } => interpreter.clone(),
            LaunchStrategy::Standalone {
                executable,
                working_dir,
                ..
            } => {
                if executable.is_relative() {
                    let candidate = working_dir.join(executable);
                    if candidate.exists() {
                        return candidate;
                    }
                }
                executable.clone()
            }
        }
    }

    pub fn command_args(&self) -> Vec<OsString> {
        match self {
            LaunchStrategy::Interpreter { script, args, .. } => {
                std::iter::once(script.as_os_str().to_os_string())
                    .chain(args.iter().map(OsString::from))
                    .collect()
            }
            LaunchStrategy::Standalone { args, .. } => args.iter().map(OsString::from).collect(),
        }
    }
}

impl fmt::Display for LaunchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchStrategy::Interpreter {
                interpreter,
                script,
                ..
            } => write!(f, "{} {}", interpreter.display(), script.display()),
            LaunchStrategy::Standalone { executable, .. } => {
                write!(f, "{}", executable.display())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    AlreadyExited,
    Graceful,
    Forced,
    Failed(String),
}

/// A started recognizer process.
#[async_trait]
pub trait RecognizerProcess: Send {
    fn id(&self) -> Option<u32>;

    /// Non-blocking liveness check.
    fn is_alive(&mut self) -> bool;

    /// Requests a graceful exit, waits up to `grace`, then force-kills.
    async fn terminate(&mut self, grace: Duration) -> Termination;

    /// Starts a forced kill without waiting. Used on drop paths.
    fn kill_now(&mut self);
}

pub trait ProcessSpawner: Send + Sync {
    fn spawn(&self, strategy: &LaunchStrategy) -> Result<Box<dyn RecognizerProcess>, SpawnError>;
}

/// Spawns real OS processes through `tokio::process`.
#[derive(Debug, Default, Clone)]
pub struct OsSpawner {
    show_output: bool,
}

impl OsSpawner {
    pub fn new(show_output: bool) -> Self {
        Self { show_output }
    }
}

impl ProcessSpawner for OsSpawner {
    fn spawn(&self, strategy: &LaunchStrategy) -> Result<Box<dyn RecognizerProcess>, SpawnError> {
        let working_dir = strategy.working_dir();
        if !working_dir.is_dir() {
            return Err(SpawnError::MissingWorkingDir(working_dir.to_path_buf()));
        }

        let program = strategy.program();
        let output = || {
            if self.show_output {
                Stdio::inherit()
            } else {
                Stdio::null()
            }
        };

        tracing::info!("Spawning recognizer: {}", strategy);
        let child = Command::new(&program)
            .args(strategy.command_args())
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(output())
            .stderr(output())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SpawnError::Spawn {
                program: program.display().to_string(),
                source,
            })?;

        Ok(Box::new(OsProcess { child }))
    }
}

pub struct OsProcess {
    child: Child,
}

#[async_trait]
impl RecognizerProcess for OsProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    async fn terminate(&mut self, grace: Duration) -> Termination {
        if !self.is_alive() {
            return Termination::AlreadyExited;
        }

        if let Some(pid) = self.child.id() {
            match request_exit(pid).await {
                Ok(()) => {
                    if let Ok(Ok(_)) = tokio::time::timeout(grace, self.child.wait()).await {
                        return Termination::Graceful;
                    }
                    tracing::warn!(pid, "Recognizer ignored termination request, killing");
                }
                Err(e) => tracing::debug!(pid, "Termination request failed: {}", e),
            }
        }

        match self.child.kill().await {
            Ok(()) => Termination::Forced,
            Err(e) => Termination::Failed(e.to_string()),
        }
    }

    fn kill_now(&mut self) {
        if let Err(e) = self.child.start_kill() {
            tracing::debug!("Kill on drop path failed: {}", e);
        }
    }
}

#[cfg(unix)]
async fn request_exit(pid: u32) -> std::io::Result<()> {
    let status = Command::new("kill")
        .args(["-TERM", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other(format!("kill exit={status}")))
    }
}

#[cfg(windows)]
async fn request_exit(pid: u32) -> std::io::Result<()> {
    let status = Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/T"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other(format!("taskkill exit={status}")))
    }
}
