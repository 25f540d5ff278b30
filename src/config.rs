//! Runtime configuration read from the environment.
//!
//! The shell takes no command-line options in normal use, so the few knobs it
//! has come from environment variables:
//!
//! - `HOME`             - history file location (`$HOME/.sdn_history`)
//! - `SDN_HISTFILE`     - explicit history file path
//! - `SDN_HISTORY_SIZE` - maximum number of unique history entries cached
//! - `SDN_TRACE`        - print a trace line for each step to stderr
//! - `SDN_BANNER`       - show a one-line banner on startup

use std::env;
use std::path::PathBuf;

/// Name of the history log inside the home directory.
pub const HISTORY_FILE_NAME: &str = ".sdn_history";

/// Name of the per-directory alias file.
pub const LOCAL_ALIAS_FILE: &str = ".sdn_aliases";

/// Default number of unique commands kept in the history cache.
pub const DEFAULT_HISTORY_SIZE: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub history_path: PathBuf,
    pub history_size: usize,
    pub trace: bool,
    pub banner: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            history_path: PathBuf::from(HISTORY_FILE_NAME),
            history_size: DEFAULT_HISTORY_SIZE,
            trace: false,
            banner: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let history_path = match lookup("SDN_HISTFILE").filter(|p| !p.is_empty()) {
            Some(path) => PathBuf::from(path),
            None => history_path_for(lookup("HOME").as_deref()),
        };

        let history_size = lookup("SDN_HISTORY_SIZE")
            .and_then(|s| s.trim().parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(DEFAULT_HISTORY_SIZE);

        Config {
            history_path,
            history_size,
            trace: lookup("SDN_TRACE").map(|v| is_enabled(&v)).unwrap_or(false),
            banner: lookup("SDN_BANNER").is_some(),
        }
    }
}

/// `$HOME/.sdn_history`, or a relative `.sdn_history` when HOME is unset.
pub fn history_path_for(home: Option<&str>) -> PathBuf {
    match home.filter(|h| !h.is_empty()) {
        Some(home) => PathBuf::from(home).join(HISTORY_FILE_NAME),
        None => PathBuf::from(HISTORY_FILE_NAME),
    }
}

fn is_enabled(value: &str) -> bool {
    !value.is_empty() && value != "0"
}
