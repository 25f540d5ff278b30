//! Builtin commands
//!
//! A pipeline with exactly one segment is checked against the builtins
//! before anything is forked. Builtins write to stdout or to the segment's
//! output redirection; input redirections are ignored.

use crate::alias::{parse_definition, AliasError};
use crate::config::LOCAL_ALIAS_FILE;
use crate::history::HistoryError;
use crate::parser::CommandSegment;
use crate::state::ShellState;
use crate::vars::{parse_assignment, VarError};
use std::env;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuiltinError {
    #[error("cd: {path}: {source}")]
    Cd { path: String, source: io::Error },
    #[error("cd: HOME not set")]
    HomeNotSet,
    #[error("{0}: usage: {1}")]
    Usage(&'static str, &'static str),
    #[error("{builtin}: {source}")]
    Alias {
        builtin: &'static str,
        source: AliasError,
    },
    #[error("export: {0}")]
    Export(#[source] VarError),
    #[error("{0}")]
    Assignment(#[source] VarError),
    #[error("history: {0}")]
    History(#[from] HistoryError),
    #[error("{0}: {1}")]
    Redirect(String, #[source] io::Error),
    #[error("write error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    History,
    Alias,
    Unalias,
    Export,
    /// `NAME=value` on its own
    Assign,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "cd" => Some(Builtin::Cd),
            "history" => Some(Builtin::History),
            "alias" => Some(Builtin::Alias),
            "unalias" => Some(Builtin::Unalias),
            "export" => Some(Builtin::Export),
            _ => None,
        }
    }

    /// The builtin a single-segment command invokes, if any
    pub fn from_segment(segment: &CommandSegment) -> Option<Self> {
        match segment.argv.as_slice() {
            [word] if parse_assignment(word).is_some() => Some(Builtin::Assign),
            [program, ..] => Self::from_name(program),
            [] => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Cd => "cd",
            Builtin::History => "history",
            Builtin::Alias => "alias",
            Builtin::Unalias => "unalias",
            Builtin::Export => "export",
            Builtin::Assign => "assignment",
        }
    }

    /// Run with the full argv (including the builtin's own name)
    pub fn run(
        self,
        state: &mut ShellState,
        argv: &[String],
        out: &mut dyn Write,
    ) -> Result<(), BuiltinError> {
        let args = argv.get(1..).unwrap_or(&[]);
        match self {
            Builtin::Cd => cd(state, args),
            Builtin::History => history(state, out),
            Builtin::Alias => alias(state, args, out),
            Builtin::Unalias => unalias(state, args),
            Builtin::Export => export(state, args, out),
            Builtin::Assign => assign(state, argv),
        }
    }
}

/// Run a builtin segment, honouring its output redirection
pub fn run_segment(
    builtin: Builtin,
    state: &mut ShellState,
    segment: &CommandSegment,
) -> Result<(), BuiltinError> {
    match &segment.output {
        Some(path) => {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .append(segment.append)
                .truncate(!segment.append)
                .mode(0o644)
                .open(path)
                .map_err(|e| BuiltinError::Redirect(path.clone(), e))?;
            builtin.run(state, &segment.argv, &mut file)
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            builtin.run(state, &segment.argv, &mut out)?;
            out.flush()?;
            Ok(())
        }
    }
}

fn cd(state: &mut ShellState, args: &[String]) -> Result<(), BuiltinError> {
    let target = match args.first() {
        Some(dir) => state.resolver.expand_tilde(dir),
        None => env::var("HOME")
            .ok()
            .filter(|h| !h.is_empty())
            .ok_or(BuiltinError::HomeNotSet)?,
    };

    env::set_current_dir(&target).map_err(|source| BuiltinError::Cd {
        path: target.clone(),
        source,
    })?;

    let cwd = env::current_dir()?;
    state.reload_local_aliases(&cwd);
    Ok(())
}

fn history(state: &ShellState, out: &mut dyn Write) -> Result<(), BuiltinError> {
    let Some(lines) = state.history.log_lines()? else {
        writeln!(out, "No command history found.")?;
        return Ok(());
    };

    writeln!(out)?;
    writeln!(out, "Command History:")?;
    writeln!(out, "----------------")?;
    for (i, line) in lines.iter().enumerate() {
        writeln!(out, "{:3}  {}", i + 1, line)?;
    }
    writeln!(out, "----------------")?;
    Ok(())
}

fn alias(state: &mut ShellState, args: &[String], out: &mut dyn Write) -> Result<(), BuiltinError> {
    let err = |source| BuiltinError::Alias {
        builtin: "alias",
        source,
    };

    if args.is_empty() {
        return list_aliases(state, out);
    }

    let joined = args.join(" ");
    if let Some((name, value)) = parse_definition(&joined) {
        return state.aliases.global.set(name, value).map_err(err);
    }

    match args {
        [name] => match state.aliases.lookup(name) {
            Some(command) => {
                writeln!(out, "{}='{}'", name, command)?;
                Ok(())
            }
            None => Err(err(AliasError::NotFound(name.clone()))),
        },
        _ => Err(BuiltinError::Usage("alias", "alias [name[=value] ...]")),
    }
}

fn list_aliases(state: &ShellState, out: &mut dyn Write) -> Result<(), BuiltinError> {
    for alias in state.aliases.global.iter() {
        if state.aliases.local.contains(&alias.name) {
            writeln!(out, "{}='{}'  (shadowed)", alias.name, alias.command)?;
        } else {
            writeln!(out, "{}='{}'", alias.name, alias.command)?;
        }
    }

    if !state.aliases.local.is_empty() {
        writeln!(out, "# local ({})", LOCAL_ALIAS_FILE)?;
        for alias in state.aliases.local.iter() {
            writeln!(out, "{}='{}'", alias.name, alias.command)?;
        }
    }
    Ok(())
}

/// Each name is attempted; failures are reported and the rest still run
fn unalias(state: &mut ShellState, args: &[String]) -> Result<(), BuiltinError> {
    if args.is_empty() {
        return Err(BuiltinError::Usage("unalias", "unalias name [name ...]"));
    }

    let mut last_error = None;
    for name in args {
        if let Err(source) = state.aliases.unalias(name) {
            if let Some(previous) = last_error.replace(BuiltinError::Alias {
                builtin: "unalias",
                source,
            }) {
                eprintln!("sdn: {}", previous);
            }
        }
    }
    last_error.map_or(Ok(()), Err)
}

fn export(state: &mut ShellState, args: &[String], out: &mut dyn Write) -> Result<(), BuiltinError> {
    if args.is_empty() {
        for var in state.vars.iter() {
            if env::var_os(&var.name).is_some() {
                writeln!(out, "{}={} (exported)", var.name, var.value)?;
            } else {
                writeln!(out, "{}={}", var.name, var.value)?;
            }
        }
        return Ok(());
    }

    let mut last_error = None;
    for arg in args {
        let result = match parse_assignment(arg) {
            Some((name, value)) => state
                .vars
                .set(name, value)
                .and_then(|()| state.vars.export(name)),
            None => state.vars.export(arg),
        };
        if let Err(e) = result {
            if let Some(previous) = last_error.replace(BuiltinError::Export(e)) {
                eprintln!("sdn: {}", previous);
            }
        }
    }
    last_error.map_or(Ok(()), Err)
}

fn assign(state: &mut ShellState, argv: &[String]) -> Result<(), BuiltinError> {
    let Some((name, value)) = argv.first().and_then(|w| parse_assignment(w)) else {
        return Ok(());
    };
    state.vars.set(name, value).map_err(BuiltinError::Assignment)
}
