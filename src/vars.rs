//! Shell-local variables
//!
//! Variables live in the shell, separate from the process environment.
//! `export` copies a value into the environment at the time of the call;
//! later assignments are not propagated unless exported again.

use std::env;
use thiserror::Error;

/// Maximum number of shell variables
pub const MAX_VARIABLES: usize = 100;

/// Maximum length of a variable value
pub const MAX_VALUE_LEN: usize = crate::editor::MAX_LINE;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum VarError {
    #[error("`{0}': not a valid identifier")]
    InvalidName(String),
    #[error("{0}: value too long")]
    ValueTooLong(String),
    #[error("variable table full")]
    TableFull,
    #[error("{0}: not found")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub value: String,
}

/// Ordered name -> value table with a fixed capacity
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    entries: Vec<Variable>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.entries.iter()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.value.as_str())
    }

    /// Set or update a variable
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), VarError> {
        if !is_valid_name(name) {
            return Err(VarError::InvalidName(name.to_string()));
        }
        if value.len() >= MAX_VALUE_LEN {
            return Err(VarError::ValueTooLong(name.to_string()));
        }
        if let Some(existing) = self.entries.iter_mut().find(|v| v.name == name) {
            existing.value = value.to_string();
            return Ok(());
        }
        if self.entries.len() >= MAX_VARIABLES {
            return Err(VarError::TableFull);
        }
        self.entries.push(Variable {
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    /// Copy a shell variable into the process environment.
    ///
    /// A name already present in the environment counts as exported.
    pub fn export(&self, name: &str) -> Result<(), VarError> {
        if !is_valid_name(name) {
            return Err(VarError::InvalidName(name.to_string()));
        }
        match self.get(name) {
            Some(value) => {
                env::set_var(name, value);
                Ok(())
            }
            None if env::var_os(name).is_some() => Ok(()),
            None => Err(VarError::NotFound(name.to_string())),
        }
    }

    /// Value of `name`: shell variable, then environment, then empty
    pub fn lookup(&self, name: &str) -> String {
        if let Some(value) = self.get(name) {
            return value.to_string();
        }
        env::var(name).unwrap_or_default()
    }

    /// Expand an argument that begins with `$`.
    ///
    /// The name is the identifier directly after the `$`; anything after it is
    /// kept. A `$` not followed by an identifier is left as is.
    pub fn expand_arg(&self, arg: &str) -> String {
        let Some(rest) = arg.strip_prefix('$') else {
            return arg.to_string();
        };
        let name_len = identifier_len(rest);
        if name_len == 0 {
            return arg.to_string();
        }
        let (name, tail) = rest.split_at(name_len);
        format!("{}{}", self.lookup(name), tail)
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && identifier_len(name) == name.len()
}

fn identifier_len(s: &str) -> usize {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return 0,
    }
    chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Split `NAME=value` when NAME is a valid identifier
pub fn parse_assignment(word: &str) -> Option<(&str, &str)> {
    let (name, value) = word.split_once('=')?;
    is_valid_name(name).then_some((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_validation() {
        assert!(is_valid_name("PATH"));
        assert!(is_valid_name("_x1"));
        assert!(!is_valid_name("1x"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("A-B"));
    }

    #[test]
    fn set_and_update_keep_order() {
        let mut vars = VariableTable::new();
        vars.set("B", "1").unwrap();
        vars.set("A", "2").unwrap();
        vars.set("B", "3").unwrap();
        let names: Vec<_> = vars.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(vars.get("B"), Some("3"));
    }

    #[test]
    fn rejects_bad_names() {
        let mut vars = VariableTable::new();
        assert_eq!(vars.set("9lives", "x"), Err(VarError::InvalidName("9lives".into())));
        assert!(vars.is_empty());
    }

    #[test]
    fn table_full_is_reported() {
        let mut vars = VariableTable::new();
        for i in 0..MAX_VARIABLES {
            vars.set(&format!("V{}", i), "x").unwrap();
        }
        assert_eq!(vars.set("ONE_MORE", "x"), Err(VarError::TableFull));
        // updates still work when full
        vars.set("V0", "y").unwrap();
        assert_eq!(vars.len(), MAX_VARIABLES);
    }

    #[test]
    fn oversized_value_is_rejected() {
        let mut vars = VariableTable::new();
        let big = "x".repeat(MAX_VALUE_LEN);
        assert_eq!(vars.set("BIG", &big), Err(VarError::ValueTooLong("BIG".into())));
    }

    #[test]
    fn expansion_prefers_shell_variables() {
        let mut vars = VariableTable::new();
        env::set_var("SDN_VARS_TEST_SHADOW", "from-env");
        vars.set("SDN_VARS_TEST_SHADOW", "from-shell").unwrap();
        assert_eq!(vars.expand_arg("$SDN_VARS_TEST_SHADOW"), "from-shell");
    }

    #[test]
    fn expansion_falls_back_to_environment() {
        let vars = VariableTable::new();
        env::set_var("SDN_VARS_TEST_ENV_ONLY", "env-value");
        assert_eq!(vars.expand_arg("$SDN_VARS_TEST_ENV_ONLY"), "env-value");
    }

    #[test]
    fn undefined_expands_to_empty() {
        let vars = VariableTable::new();
        assert_eq!(vars.expand_arg("$SDN_VARS_TEST_NEVER_DEFINED"), "");
    }

    #[test]
    fn expansion_keeps_suffix() {
        let mut vars = VariableTable::new();
        vars.set("DIR", "/opt").unwrap();
        assert_eq!(vars.expand_arg("$DIR/bin"), "/opt/bin");
    }

    #[test]
    fn lone_dollar_is_literal() {
        let vars = VariableTable::new();
        assert_eq!(vars.expand_arg("$"), "$");
        assert_eq!(vars.expand_arg("$5"), "$5");
    }

    #[test]
    fn export_copies_current_value() {
        let mut vars = VariableTable::new();
        vars.set("SDN_VARS_TEST_EXPORTED", "first").unwrap();
        vars.export("SDN_VARS_TEST_EXPORTED").unwrap();
        assert_eq!(env::var("SDN_VARS_TEST_EXPORTED").unwrap(), "first");

        vars.set("SDN_VARS_TEST_EXPORTED", "second").unwrap();
        assert_eq!(env::var("SDN_VARS_TEST_EXPORTED").unwrap(), "first");
    }

    #[test]
    fn export_unknown_name_fails() {
        let vars = VariableTable::new();
        assert_eq!(
            vars.export("SDN_VARS_TEST_UNKNOWN"),
            Err(VarError::NotFound("SDN_VARS_TEST_UNKNOWN".into()))
        );
    }

    #[test]
    fn assignment_parsing() {
        assert_eq!(parse_assignment("X=1"), Some(("X", "1")));
        assert_eq!(parse_assignment("X="), Some(("X", "")));
        assert_eq!(parse_assignment("X=a=b"), Some(("X", "a=b")));
        assert_eq!(parse_assignment("1X=1"), None);
        assert_eq!(parse_assignment("plain"), None);
    }
}
