use serde::Serialize;
use sysinfo::{Pid, ProcessStatus, System};

/// Point-in-time view of one OS process.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessSample {
    pub pid: u32,
    pub name: String,
    pub memory_mb: u64,
    pub cpu_usage: f32,
}

/// Process-exists query; `None` when the pid is gone or only a zombie remains.
pub fn sample(pid: u32) -> Option<ProcessSample> {
    let pid = Pid::from_u32(pid);
    let mut system = System::new();
    if !system.refresh_process(pid) {
        return None;
    }

    let process = system.process(pid)?;
    if process.status() == ProcessStatus::Zombie {
        return None;
    }

    Some(ProcessSample {
        pid: pid.as_u32(),
        name: process.name().to_string(),
        memory_mb: process.memory() / 1024 / 1024,
        cpu_usage: process.cpu_usage(),
    })
}
