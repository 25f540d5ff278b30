//! Mutable shell state
//!
//! Everything a command can change lives here, owned by the REPL and handed
//! to builtins by reference:
//! - alias tables (global and directory-local)
//! - shell variables
//! - the history cache and its log file
//! - background children awaiting reaping

use crate::alias::Aliases;
use crate::config::Config;
use crate::executor::BackgroundJobs;
use crate::history::History;
use crate::rcfile::load_local_aliases;
use crate::resolver::PathResolver;
use crate::vars::VariableTable;
use std::path::Path;

#[derive(Debug)]
pub struct ShellState {
    pub config: Config,
    pub aliases: Aliases,
    pub vars: VariableTable,
    pub history: History,
    pub resolver: PathResolver,
    pub jobs: BackgroundJobs,
}

impl ShellState {
    pub fn new(config: Config) -> Self {
        let history = History::new(config.history_path.clone(), config.history_size);
        ShellState {
            config,
            aliases: Aliases::new(),
            vars: VariableTable::new(),
            history,
            resolver: PathResolver::from_env(),
            jobs: BackgroundJobs::new(),
        }
    }

    /// Rebuild the local alias table from `dir`, reporting problems on stderr
    pub fn reload_local_aliases(&mut self, dir: &Path) {
        match load_local_aliases(dir, &mut self.aliases.local) {
            Ok(warnings) => {
                for warning in warnings {
                    eprintln!("sdn: {}", warning);
                }
            }
            Err(e) => eprintln!("sdn: {}: {}", crate::config::LOCAL_ALIAS_FILE, e),
        }
        self.trace(&format!("loaded {} local aliases", self.aliases.local.len()));
    }

    /// Print a `+ ` line on stderr when tracing is enabled
    pub fn trace(&self, message: &str) {
        if self.config.trace {
            eprintln!("+ {}", message);
        }
    }
}
