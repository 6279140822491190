//! Declarative command table.
//!
//! The table is plain data (YAML on disk); the host turns it into a
//! `CommandRegistry` by binding an action to every entry.

use crate::definition::{CommandDefinition, CommandKind, CommandScope};
use crate::registry::{CommandRegistry, RegistryError};
use crate::traits::CommandAction;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use voxgate_policy::WindowKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Absent means the command is global.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowKind>,
    #[serde(default)]
    pub requires_auth: bool,
    pub kind: CommandKind,
}

impl CommandSpec {
    pub fn scope(&self) -> CommandScope {
        match self.window {
            Some(kind) => CommandScope::Window(kind),
            None => CommandScope::Global,
        }
    }
}

/// Resolves the host action for a table entry.
pub trait ActionBinder {
    fn bind(&self, spec: &CommandSpec) -> Option<Arc<dyn CommandAction>>;
}

impl<F> ActionBinder for F
where
    F: Fn(&CommandSpec) -> Option<Arc<dyn CommandAction>>,
{
    fn bind(&self, spec: &CommandSpec) -> Option<Arc<dyn CommandAction>> {
        self(spec)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandTable {
    pub commands: Vec<CommandSpec>,
}

impl CommandTable {
    pub fn from_yaml(content: &str) -> Result<Self, RegistryError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, RegistryError> {
        let content = tokio::fs::read_to_string(&path).await?;
        Self::from_yaml(&content)
    }

    pub fn build(&self, binder: &dyn ActionBinder) -> Result<CommandRegistry, RegistryError> {
        let mut builder = CommandRegistry::builder();
        for spec in &self.commands {
            let action = binder
                .bind(spec)
                .ok_or_else(|| RegistryError::Unbound(spec.name.clone()))?;
            builder.register(
                CommandDefinition::new(&spec.name, spec.scope(), action)
                    .with_aliases(&spec.aliases)
                    .requiring_auth(spec.requires_auth)
                    .with_kind(spec.kind.clone()),
            )?;
        }
        Ok(builder.build())
    }
}

fn spec(
    name: &str,
    aliases: &[&str],
    window: Option<WindowKind>,
    requires_auth: bool,
    kind: CommandKind,
) -> CommandSpec {
    CommandSpec {
        name: name.to_string(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
        window,
        requires_auth,
        kind,
    }
}

fn navigate(target: WindowKind) -> CommandKind {
    CommandKind::Navigate { target }
}

fn action(id: &str) -> CommandKind {
    CommandKind::Action { id: id.to_string() }
}

impl Default for CommandTable {
    /// The recognizer's stock grammar.
    fn default() -> Self {
        use WindowKind::*;

        let mut commands = vec![
            // Pre-login navigation.
            spec("login", &["sign in", "manual login", "manual"], None, false, navigate(Login)),
            spec("sign up", &["signup", "register", "create account"], None, false, navigate(SignUp)),
            spec("forgot password", &["reset password"], None, false, navigate(ForgotPassword)),
            spec("face login", &["face"], None, false, navigate(FaceLogin)),
            spec("voice login", &[], None, false, navigate(VoiceLogin)),
            // Post-login navigation.
            spec("go home", &["dashboard", "open dashboard"], None, true, navigate(Dashboard)),
            spec("settings", &["open settings", "go to settings"], None, true, navigate(Settings)),
            spec("profile", &["go to profile", "open profile"], None, true, navigate(Profile)),
            spec("voice commands", &["help", "show commands"], None, true, navigate(VoiceCommands)),
            spec("add game", &["new game"], None, true, navigate(AddGame)),
            spec("logout", &["sign out", "log out"], None, true, CommandKind::Logout),
            // Window management, always available.
            spec("close", &["close window"], None, false, action("close_window")),
            spec("minimize", &[], None, false, action("minimize_window")),
            spec("maximize", &[], None, false, action("maximize_window")),
            spec("exit", &["quit", "close app", "close application"], None, false, action("exit_app")),
            // Window-local commands.
            spec("capture face", &["take photo"], Some(SignUp), false, action("capture_face")),
            spec("capture face", &["take photo"], Some(FaceLogin), false, action("capture_face")),
            spec("record voice", &["record"], Some(VoiceLogin), false, action("record_voice")),
            spec(
                "open mr racer",
                &["play mr racer", "launch mr racer", "start mr racer"],
                Some(Dashboard),
                true,
                action("launch_mr_racer"),
            ),
            spec(
                "open subway surfers",
                &["play subway surfers", "launch subway surfers", "start subway surfers", "open subway", "play subway"],
                Some(Dashboard),
                true,
                action("launch_subway_surfers"),
            ),
        ];

        for (digit, word) in ["one", "two", "three", "four", "five"].iter().enumerate() {
            let n = digit + 1;
            let aliases: Vec<String> = ["play", "start", "launch"]
                .iter()
                .map(|verb| format!("{verb} game {word}"))
                .chain(["open", "play", "start", "launch"].iter().map(|verb| format!("{verb} game {n}")))
                .collect();
            commands.push(CommandSpec {
                name: format!("open game {word}"),
                aliases,
                window: Some(Dashboard),
                requires_auth: true,
                kind: action(&format!("launch_game_{n}")),
            });
        }

        Self { commands }
    }
}
