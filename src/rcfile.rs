//! Loading the per-directory alias file (`.sdn_aliases`)
//!
//! Each non-blank, non-comment line is `name=value`, optionally prefixed with
//! the `alias` keyword. Bad lines are reported with their line number and
//! skipped; the rest of the file still loads.

use crate::alias::{parse_definition, AliasTable};
use crate::config::LOCAL_ALIAS_FILE;
use std::fs;
use std::io;
use std::path::Path;

/// A problem with one line of the alias file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} line {}: {}", LOCAL_ALIAS_FILE, self.line, self.message)
    }
}

/// Clear `table` and refill it from `dir/.sdn_aliases`.
///
/// A missing file leaves the table empty and is not an error.
pub fn load_local_aliases(dir: &Path, table: &mut AliasTable) -> io::Result<Vec<LoadWarning>> {
    table.clear();

    let content = match fs::read_to_string(dir.join(LOCAL_ALIAS_FILE)) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    Ok(load_alias_content(&content, table))
}

/// Add every definition in `content` to `table`
pub fn load_alias_content(content: &str, table: &mut AliasTable) -> Vec<LoadWarning> {
    let mut warnings = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        // Skip empty lines and comments
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let definition = trimmed
            .strip_prefix("alias ")
            .map(str::trim_start)
            .unwrap_or(trimmed);

        let result = match parse_definition(definition) {
            Some((name, value)) => table.set(name.trim(), value).map_err(|e| e.to_string()),
            None => Err(format!("expected name=value, got `{}'", trimmed)),
        };

        if let Err(message) = result {
            warnings.push(LoadWarning {
                line: line_num + 1,
                message,
            });
        }
    }

    warnings
}
