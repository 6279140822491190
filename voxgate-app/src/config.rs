use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use voxgate_channel::ChannelConfig;
use voxgate_commands::CommandTable;
use voxgate_core::RouterConfig;
use voxgate_executor::SupervisorConfig;
use voxgate_policy::{NavigationEdge, NavigationTable};

pub const CONFIG_ENV: &str = "VOXGATE_CONFIG";
pub const LOG_ENV: &str = "VOXGATE_LOG";
pub const DEFAULT_CONFIG_PATH: &str = "voxgate.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Absent means voice input is disabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recognizer: Option<SupervisorConfig>,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub router: RouterConfig,
    /// Replaces the built-in pre-login adjacency when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation: Option<Vec<NavigationEdge>>,
    /// Replaces the built-in command grammar when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<CommandTable>,
}

impl AppConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse configuration")
    }

    /// Loads the file, falling back to defaults when it does not exist.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn navigation_table(&self) -> NavigationTable {
        match &self.navigation {
            Some(edges) => NavigationTable::from_edges(edges.iter().copied()),
            None => NavigationTable::default(),
        }
    }

    pub fn command_table(&self) -> CommandTable {
        self.commands.clone().unwrap_or_default()
    }
}

pub fn config_path(explicit: Option<String>) -> PathBuf {
    explicit
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Log filter directive: `VOXGATE_LOG`, then `RUST_LOG`, then `info`.
pub fn log_directive(voxgate_log: Option<String>, rust_log: Option<String>) -> String {
    voxgate_log
        .into_iter()
        .chain(rust_log)
        .find(|d| !d.trim().is_empty())
        .unwrap_or_else(|| "info".to_string())
}
