//! Alias tables
//!
//! Two tables are kept: *global* aliases defined with the `alias` builtin,
//! and *local* aliases rebuilt from the working directory's `.sdn_aliases`
//! file whenever the directory changes. Local aliases shadow global ones.
//!
//! Expansion is not recursive and only looks at the first word of a line.

use thiserror::Error;

/// Maximum number of aliases per table
pub const MAX_ALIASES: usize = 50;

/// Maximum alias name length
pub const MAX_ALIAS_NAME: usize = 50;

/// Maximum alias value length
pub const MAX_ALIAS_VALUE: usize = crate::editor::MAX_LINE;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AliasError {
    #[error("invalid alias name")]
    InvalidName,
    #[error("alias name or command too long")]
    TooLong,
    #[error("alias table full")]
    TableFull,
    #[error("{0}: not found")]
    NotFound(String),
    #[error("{0}: local alias (edit {1})")]
    LocalOnly(String, &'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub name: String,
    pub command: String,
}

/// A single ordered table of aliases
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: Vec<Alias>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alias> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.command.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Define or update an alias
    pub fn set(&mut self, name: &str, command: &str) -> Result<(), AliasError> {
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(AliasError::InvalidName);
        }
        if name.len() >= MAX_ALIAS_NAME || command.len() >= MAX_ALIAS_VALUE {
            return Err(AliasError::TooLong);
        }
        if let Some(existing) = self.entries.iter_mut().find(|a| a.name == name) {
            existing.command = command.to_string();
            return Ok(());
        }
        if self.entries.len() >= MAX_ALIASES {
            return Err(AliasError::TableFull);
        }
        self.entries.push(Alias {
            name: name.to_string(),
            command: command.to_string(),
        });
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<(), AliasError> {
        match self.entries.iter().position(|a| a.name == name) {
            Some(idx) => {
                self.entries.remove(idx);
                Ok(())
            }
            None => Err(AliasError::NotFound(name.to_string())),
        }
    }
}

/// Global and directory-local aliases together
#[derive(Debug, Clone, Default)]
pub struct Aliases {
    pub global: AliasTable,
    pub local: AliasTable,
}

impl Aliases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a name, local table first
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.local.get(name).or_else(|| self.global.get(name))
    }

    /// Replace the first word of `line` with its alias, if it has one.
    ///
    /// The rest of the line, starting at the whitespace after the first word,
    /// is appended unchanged.
    pub fn expand(&self, line: &str) -> String {
        let trimmed = line.trim_start();
        let word_end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        let (first, rest) = trimmed.split_at(word_end);
        if first.is_empty() {
            return line.to_string();
        }
        match self.lookup(first) {
            Some(command) => format!("{}{}", command, rest),
            None => line.to_string(),
        }
    }

    /// Remove a global alias; local aliases are read-only here
    pub fn unalias(&mut self, name: &str) -> Result<(), AliasError> {
        if !self.global.contains(name) && self.local.contains(name) {
            return Err(AliasError::LocalOnly(
                name.to_string(),
                crate::config::LOCAL_ALIAS_FILE,
            ));
        }
        self.global.remove(name)
    }
}

/// Split an alias definition into name and dequoted value.
///
/// Returns `None` when the text has no `=`.
pub fn parse_definition(text: &str) -> Option<(&str, &str)> {
    let (name, value) = text.split_once('=')?;
    Some((name, dequote(value)))
}

/// Strip one layer of matching single or double quotes
pub fn dequote(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
