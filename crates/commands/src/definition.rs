use crate::traits::CommandAction;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use voxgate_policy::{Protected, WindowKind};

/// Trimmed, lower-cased form used for every lookup.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandScope {
    Global,
    Window(WindowKind),
}

impl fmt::Display for CommandScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandScope::Global => f.write_str("global scope"),
            CommandScope::Window(kind) => write!(f, "{} window scope", kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandKind {
    /// Host-defined behavior identified by `id`.
    Action { id: String },
    /// Moves the host to `target`; also subject to navigation adjacency.
    Navigate { target: WindowKind },
    /// Ends the session before the bound action runs.
    Logout,
}

pub struct CommandDefinition {
    name: String,
    aliases: Vec<String>,
    scope: CommandScope,
    requires_auth: bool,
    kind: CommandKind,
    action: Arc<dyn CommandAction>,
}

impl CommandDefinition {
    pub fn new(name: &str, scope: CommandScope, action: Arc<dyn CommandAction>) -> Self {
        let name = normalize(name);
        Self {
            kind: CommandKind::Action { id: name.clone() },
            name,
            aliases: Vec::new(),
            scope,
            requires_auth: false,
            action,
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for alias in aliases {
            let alias = normalize(alias.as_ref());
            if alias.is_empty() || alias == self.name || self.aliases.contains(&alias) {
                continue;
            }
            self.aliases.push(alias);
        }
        self
    }

    pub fn requiring_auth(mut self, requires_auth: bool) -> Self {
        self.requires_auth = requires_auth;
        self
    }

    pub fn with_kind(mut self, kind: CommandKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn navigating_to(self, target: WindowKind) -> Self {
        self.with_kind(CommandKind::Navigate { target })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Canonical name followed by every alias.
    pub fn phrases(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn scope(&self) -> CommandScope {
        self.scope
    }

    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    pub fn navigation_target(&self) -> Option<WindowKind> {
        match self.kind {
            CommandKind::Navigate { target } => Some(target),
            _ => None,
        }
    }

    pub fn is_logout(&self) -> bool {
        self.kind == CommandKind::Logout
    }

    pub fn action(&self) -> Arc<dyn CommandAction> {
        Arc::clone(&self.action)
    }
}

impl Protected for CommandDefinition {
    fn label(&self) -> &str {
        &self.name
    }

    fn requires_auth(&self) -> bool {
        self.requires_auth
    }
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("scope", &self.scope)
            .field("requires_auth", &self.requires_auth)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxgate_interfaces::ActionError;

    fn noop() -> Arc<dyn CommandAction> {
        Arc::new(|_: &str| -> Result<(), ActionError> { Ok(()) })
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  GO HOME  "), "go home");
        assert_eq!(normalize("\tLogout\n"), "logout");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_aliases_are_normalized_and_deduplicated() {
        let def = CommandDefinition::new("Go Home", CommandScope::Global, noop())
            .with_aliases(["Dashboard", " dashboard ", "go home", ""]);
        assert_eq!(def.name(), "go home");
        assert_eq!(def.aliases(), &["dashboard".to_string()]);
        assert_eq!(def.phrases().collect::<Vec<_>>(), vec!["go home", "dashboard"]);
    }

    #[test]
    fn test_defaults_to_public_action() {
        let def = CommandDefinition::new("close", CommandScope::Global, noop());
        assert!(!def.requires_auth());
        assert_eq!(def.kind(), &CommandKind::Action { id: "close".to_string() });
        assert_eq!(def.navigation_target(), None);
        assert!(!def.is_logout());
    }

    #[test]
    fn test_navigation_kind() {
        let def = CommandDefinition::new("settings", CommandScope::Global, noop())
            .requiring_auth(true)
            .navigating_to(WindowKind::Settings);
        assert_eq!(def.navigation_target(), Some(WindowKind::Settings));
        assert!(def.requires_auth());
    }
}
