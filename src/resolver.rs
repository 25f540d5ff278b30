//! Wildcard expansion and filesystem listing
//!
//! The parser hands every token containing a wildcard metacharacter to
//! [`PathResolver::expand_word`]; the line editor asks [`PathResolver::complete`]
//! for completion candidates. Both resolve paths relative to the process
//! working directory, which `cd` keeps current.
//!
//! Expansion order for a wildcard token: brace alternatives first, then a
//! leading `~`, then globbing. Alternatives that match nothing are dropped;
//! when no alternative matches at all, the token is kept exactly as typed.

use glob::{glob_with, MatchOptions};
use std::env;
use std::fs;
use std::path::Path;

/// Characters that make a token subject to glob expansion
pub const GLOB_CHARS: &[char] = &['*', '?', '[', ']'];

/// Resolves wildcard patterns and completion candidates against the filesystem
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    home: Option<String>,
}

impl PathResolver {
    /// Create a resolver using `$HOME` for tilde expansion
    pub fn from_env() -> Self {
        PathResolver {
            home: env::var("HOME").ok().filter(|h| !h.is_empty()),
        }
    }

    /// Create a resolver with a fixed home directory
    pub fn with_home(home: Option<&str>) -> Self {
        PathResolver {
            home: home.map(String::from),
        }
    }

    /// Check if a token should be glob-expanded
    pub fn has_wildcard(word: &str) -> bool {
        word.contains(GLOB_CHARS)
    }

    /// Expand tilde (~) to home directory
    pub fn expand_tilde(&self, path: &str) -> String {
        let Some(home) = self.home.as_deref() else {
            return path.to_string();
        };
        if path == "~" {
            return home.to_string();
        }
        if let Some(rest) = path.strip_prefix("~/") {
            return format!("{}/{}", home.trim_end_matches('/'), rest);
        }
        path.to_string()
    }

    /// Expand a wildcard token into the sorted list of matching paths.
    ///
    /// Never returns an empty list: if no brace alternative matches (or the
    /// pattern is invalid), the original word is returned literally.
    pub fn expand_word(&self, word: &str) -> Vec<String> {
        let expanded: Vec<String> = expand_braces(word)
            .iter()
            .flat_map(|alternative| glob_matches(&self.expand_tilde(alternative)))
            .collect();
        if expanded.is_empty() {
            vec![word.to_string()]
        } else {
            expanded
        }
    }

    /// List completion candidates for a partially typed word.
    ///
    /// The directory part of the word (up to the last `/`) is kept as typed;
    /// entries of that directory whose names start with the remaining prefix
    /// are returned, directories with a trailing `/`. Hidden entries are only
    /// listed when the prefix itself starts with `.`.
    pub fn complete(&self, word: &str) -> Vec<String> {
        let (dir_part, name_prefix) = match word.rfind('/') {
            Some(idx) => (&word[..=idx], &word[idx + 1..]),
            None => ("", word),
        };

        let listing_dir = if dir_part.is_empty() {
            ".".to_string()
        } else {
            self.expand_tilde(dir_part)
        };

        let entries = match fs::read_dir(&listing_dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let show_hidden = name_prefix.starts_with('.');
        let mut completions: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                if name.starts_with('.') && !show_hidden {
                    return None;
                }
                if !name.starts_with(name_prefix) {
                    return None;
                }
                let is_dir = entry.path().is_dir();
                let full = format!("{}{}", dir_part, name);
                Some(if is_dir { format!("{}/", full) } else { full })
            })
            .collect();

        completions.sort();
        completions
    }
}

fn glob_matches(pattern: &str) -> Vec<String> {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };
    match glob_with(pattern, options) {
        Ok(paths) => paths
            .filter_map(|p| p.ok())
            .map(|p| display_path(&p))
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Expand `{a,b}` alternatives, left to right, including nested groups.
///
/// A group without a comma or without a closing brace is kept literally.
pub fn expand_braces(word: &str) -> Vec<String> {
    let Some((open, close)) = find_brace_group(word) else {
        return vec![word.to_string()];
    };

    let prefix = &word[..open];
    let body = &word[open + 1..close];
    let suffix = &word[close + 1..];

    let mut result = Vec::new();
    for part in split_top_level(body) {
        let combined = format!("{}{}{}", prefix, part, suffix);
        result.extend(expand_braces(&combined));
    }
    result
}

/// Find the first brace group that contains a top-level comma
fn find_brace_group(word: &str) -> Option<(usize, usize)> {
    let bytes = word.as_bytes();
    let mut start = 0;
    while let Some(rel) = word[start..].find('{') {
        let open = start + rel;
        let mut depth = 0usize;
        let mut has_comma = false;
        for (i, &b) in bytes.iter().enumerate().skip(open) {
            match b {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        if has_comma {
                            return Some((open, i));
                        }
                        break;
                    }
                }
                b',' if depth == 1 => has_comma = true,
                _ => {}
            }
        }
        start = open + 1;
    }
    None
}

fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut last = 0;
    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&body[last..i]);
                last = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[last..]);
    parts
}

/// Longest common prefix shared by all candidates
pub fn common_prefix(candidates: &[String]) -> String {
    let Some(first) = candidates.first() else {
        return String::new();
    };
    let mut len = first.len();
    for other in &candidates[1..] {
        len = first
            .char_indices()
            .zip(other.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map(|((i, a), _)| i + a.len_utf8())
            .unwrap_or(0)
            .min(len);
    }
    first[..len].to_string()
}
