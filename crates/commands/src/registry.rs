use crate::definition::{normalize, CommandDefinition, CommandScope};
use crate::traits::CommandAction;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use voxgate_policy::WindowKind;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Command name is empty")]
    EmptyName,
    #[error("Alias '{alias}' in {scope} is already bound to '{existing}'")]
    DuplicateAlias {
        alias: String,
        scope: CommandScope,
        existing: String,
    },
    #[error("No action bound for command '{0}'")]
    Unbound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

type PhraseTable = HashMap<String, Arc<CommandDefinition>>;

/// Collects command definitions and rejects ambiguous aliases.
#[derive(Default)]
pub struct CommandRegistryBuilder {
    global: PhraseTable,
    windows: HashMap<WindowKind, PhraseTable>,
    definitions: Vec<Arc<CommandDefinition>>,
}

impl CommandRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: CommandDefinition) -> Result<&mut Self, RegistryError> {
        if definition.name().is_empty() {
            return Err(RegistryError::EmptyName);
        }

        let scope = definition.scope();
        let table = match scope {
            CommandScope::Global => &mut self.global,
            CommandScope::Window(kind) => self.windows.entry(kind).or_default(),
        };

        // Check every phrase before inserting any, so a rejected definition
        // leaves the table untouched.
        for phrase in definition.phrases() {
            if let Some(existing) = table.get(phrase) {
                return Err(RegistryError::DuplicateAlias {
                    alias: phrase.to_string(),
                    scope,
                    existing: existing.name().to_string(),
                });
            }
        }

        let definition = Arc::new(definition);
        for phrase in definition.phrases() {
            table.insert(phrase.to_string(), Arc::clone(&definition));
        }
        tracing::debug!(command = definition.name(), %scope, "Registered command");
        self.definitions.push(definition);
        Ok(self)
    }

    pub fn register_global<I, S>(
        &mut self,
        name: &str,
        aliases: I,
        requires_auth: bool,
        action: Arc<dyn CommandAction>,
    ) -> Result<&mut Self, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.register(
            CommandDefinition::new(name, CommandScope::Global, action)
                .with_aliases(aliases)
                .requiring_auth(requires_auth),
        )
    }

    pub fn register_window<I, S>(
        &mut self,
        window: WindowKind,
        name: &str,
        aliases: I,
        requires_auth: bool,
        action: Arc<dyn CommandAction>,
    ) -> Result<&mut Self, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.register(
            CommandDefinition::new(name, CommandScope::Window(window), action)
                .with_aliases(aliases)
                .requiring_auth(requires_auth),
        )
    }

    pub fn build(self) -> CommandRegistry {
        tracing::info!(
            commands = self.definitions.len(),
            window_scopes = self.windows.len(),
            "Command registry built"
        );
        CommandRegistry {
            global: self.global,
            windows: self.windows,
            definitions: self.definitions,
        }
    }
}

/// Immutable lookup table from normalized phrase to command.
pub struct CommandRegistry {
    global: PhraseTable,
    windows: HashMap<WindowKind, PhraseTable>,
    definitions: Vec<Arc<CommandDefinition>>,
}

impl CommandRegistry {
    pub fn builder() -> CommandRegistryBuilder {
        CommandRegistryBuilder::new()
    }

    /// Exact match on an already-normalized phrase: the active window's table
    /// first, then the global table.
    pub fn resolve(&self, phrase: &str, active: WindowKind) -> Option<&Arc<CommandDefinition>> {
        self.windows
            .get(&active)
            .and_then(|table| table.get(phrase))
            .or_else(|| self.global.get(phrase))
    }

    /// Normalizes raw text, then resolves it.
    pub fn lookup(&self, text: &str, active: WindowKind) -> Option<&Arc<CommandDefinition>> {
        self.resolve(&normalize(text), active)
    }

    pub fn definitions(&self) -> &[Arc<CommandDefinition>] {
        &self.definitions
    }

    /// Every phrase the registry can match, sorted and deduplicated.
    pub fn phrases(&self) -> Vec<String> {
        let mut phrases: Vec<String> = self
            .definitions
            .iter()
            .flat_map(|def| def.phrases().map(str::to_string).collect::<Vec<_>>())
            .collect();
        phrases.sort();
        phrases.dedup();
        phrases
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
