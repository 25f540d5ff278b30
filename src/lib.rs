//! sdn - a small interactive Unix shell
//!
//! # Overview
//!
//! sdn reads one line at a time, expands aliases, wildcards and `$NAME`
//! arguments, and runs the result as a pipeline of forked processes with
//! optional file redirections, in the foreground or the background.
//!
//! ```text
//! ls -la | grep foo > out.txt      # two stages, stdout of grep to a file
//! cat < in.txt >> log.txt          # input and appending output
//! sleep 10 &                       # background; pid printed, reaped later
//! alias ll='ls -la'                # first word of a line is alias-expanded
//! export EDITOR=vi                 # shell variable copied to environment
//! ```
//!
//! # Components
//!
//! - [`resolver`]: wildcard expansion and completion candidates
//! - [`lexer`] / [`parser`]: one line to a [`Pipeline`]
//! - [`alias`], [`rcfile`]: global aliases and per-directory `.sdn_aliases`
//! - [`vars`]: shell variables and `$NAME` expansion
//! - [`history`]: timestamped command log and suggestion cache
//! - [`editor`]: raw-mode line editor with ghost suggestions
//! - [`executor`]: fork/pipe/exec and background reaping
//! - [`builtins`]: `cd`, `history`, `alias`, `unalias`, `export`
//! - [`state`]: the single owner of all mutable shell state
//!
//! # Example
//!
//! ```rust
//! use sdn::parser::parse;
//!
//! let pipeline = parse("cat < in.txt | sort >> out.txt &").unwrap();
//! assert_eq!(pipeline.len(), 2);
//! assert!(pipeline.background);
//! assert_eq!(pipeline.segments[1].output.as_deref(), Some("out.txt"));
//! ```

#[cfg(not(unix))]
compile_error!("sdn only supports Unix-like systems");

pub mod alias;
pub mod builtins;
pub mod config;
pub mod editor;
pub mod executor;
pub mod history;
pub mod lexer;
pub mod parser;
pub mod rcfile;
pub mod resolver;
pub mod signals;
pub mod state;
pub mod terminal;
pub mod vars;

// Re-export commonly used items
pub use alias::{AliasError, Aliases};
pub use builtins::{Builtin, BuiltinError};
pub use config::Config;
pub use executor::{execute, ExecuteError, PipelineStatus};
pub use history::{History, HistoryError};
pub use lexer::{lex, LexError, Token};
pub use parser::{parse, CommandSegment, ParseError, Pipeline};
pub use resolver::PathResolver;
pub use state::ShellState;
pub use vars::{VarError, VariableTable};
