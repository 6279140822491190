use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use voxgate_app::config::{self, AppConfig};
use voxgate_app::host::Services;
use voxgate_app::repl;
use voxgate_executor::{spawn_watchdog, SupervisorGuard, WatchdogHandle};
use voxgate_interfaces::{TerminalInterface, UiThread};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let path = config::config_path(std::env::var(config::CONFIG_ENV).ok());
    let config = AppConfig::load(&path).await?;

    let ui = Arc::new(UiThread::spawn("voxgate-ui").context("Failed to start UI thread")?);
    let services = Services::assemble(&config, ui)?;

    // Kills the recognizer on every exit path that unwinds.
    let _guard = services.supervisor.clone().map(SupervisorGuard::new);
    let watchdog = start_recognizer(&config, &services).await;
    let router = services.router.clone().spawn(config.channel.reader());

    let result = repl::run(&TerminalInterface::new(), &services).await;

    tracing::info!("Shutting down");
    router.stop().await;
    if let Some(watchdog) = watchdog {
        watchdog.stop().await;
    }
    if let Some(supervisor) = &services.supervisor {
        supervisor.stop().await;
    }

    result
}

/// Starts the recognizer if one is configured. A launch failure only disables
/// voice input.
async fn start_recognizer(config: &AppConfig, services: &Services) -> Option<WatchdogHandle> {
    let (Some(supervisor), Some(recognizer)) = (&services.supervisor, &config.recognizer) else {
        tracing::info!("No recognizer configured, voice input disabled");
        return None;
    };

    match supervisor.start().await {
        Ok(handle) => {
            tracing::info!(pid = ?handle.pid, "Voice input enabled ({} strategy)", handle.strategy);
            recognizer
                .restart
                .clone()
                .map(|policy| spawn_watchdog(supervisor.clone(), policy))
        }
        Err(e) => {
            tracing::warn!("Voice input disabled: {}", e);
            None
        }
    }
}

fn init_tracing() {
    let directive = config::log_directive(
        std::env::var(config::LOG_ENV).ok(),
        std::env::var("RUST_LOG").ok(),
    );
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
