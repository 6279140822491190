pub mod health;
pub mod launcher;
pub mod supervisor;
pub mod watchdog;

pub use health::ProcessSample;
pub use launcher::{
    LaunchStrategy, OsSpawner, ProcessSpawner, RecognizerProcess, SpawnError, StrategyKind,
    Termination,
};
pub use supervisor::{
    LaunchAttempt, LaunchError, ProcessHandle, ProcessSupervisor, SupervisorConfig,
    SupervisorGuard, SupervisorStatus,
};
pub use watchdog::{spawn_watchdog, RestartPolicy, WatchdogHandle};
