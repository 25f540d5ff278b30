//! Command history
//!
//! Every accepted line is appended to an on-disk log as
//! `[YYYY-MM-DD HH:MM:SS] <command>`. The log is never rewritten. In memory
//! a cache of unique commands is kept in first-seen order; it feeds the line
//! editor's suggestions and up/down navigation.

use chrono::Local;
use nom::{
    bytes::complete::{tag, take_until},
    character::complete::char,
    combinator::{opt, rest},
    sequence::{delimited, terminated},
    IResult,
};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("error writing to history file: {0}")]
    Write(#[source] io::Error),
    #[error("error reading history file: {0}")]
    Read(#[source] io::Error),
    #[error("history cache full")]
    CacheFull,
}

#[derive(Debug, Clone)]
pub struct History {
    path: PathBuf,
    entries: Vec<String>,
    capacity: usize,
}

impl History {
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        History {
            path: path.into(),
            entries: Vec::new(),
            capacity,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unique commands, oldest first
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rebuild the cache from the log file.
    ///
    /// A missing file yields an empty cache. Loading stops once the cache
    /// reaches its capacity.
    pub fn load(&mut self) -> Result<(), HistoryError> {
        self.entries.clear();

        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(HistoryError::Read(e)),
        };

        for line in content.lines() {
            if self.entries.len() >= self.capacity {
                break;
            }
            if let Some(command) = command_of(line) {
                self.insert_unique(command);
            }
        }
        Ok(())
    }

    /// Append `line` to the log, then cache it if it is new.
    ///
    /// Empty lines are ignored. The log write happens even when the cache is
    /// full; in that case `CacheFull` is returned afterwards.
    pub fn record(&mut self, line: &str) -> Result<(), HistoryError> {
        if line.is_empty() {
            return Ok(());
        }

        self.append_to_log(line).map_err(HistoryError::Write)?;

        if self.entries.iter().any(|e| e == line) {
            return Ok(());
        }
        if self.entries.len() >= self.capacity {
            return Err(HistoryError::CacheFull);
        }
        self.entries.push(line.to_string());
        Ok(())
    }

    /// Most recently inserted entry starting with `partial`
    pub fn find_prefix_match(&self, partial: &str) -> Option<&str> {
        if partial.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .rev()
            .find(|e| e.starts_with(partial))
            .map(String::as_str)
    }

    /// Every raw line of the log file, in order.
    ///
    /// Returns `Ok(None)` when no log exists yet.
    pub fn log_lines(&self) -> Result<Option<Vec<String>>, HistoryError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content.lines().map(String::from).collect())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(HistoryError::Read(e)),
        }
    }

    fn insert_unique(&mut self, command: &str) {
        if !command.is_empty() && !self.entries.iter().any(|e| e == command) {
            self.entries.push(command.to_string());
        }
    }

    fn append_to_log(&self, line: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", format_entry(&timestamp(), line))
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// `[<timestamp>] <command>`
pub fn format_entry(timestamp: &str, command: &str) -> String {
    format!("[{}] {}", timestamp, command)
}

fn log_line(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, stamp) = terminated(delimited(char('['), take_until("]"), char(']')), opt(tag(" ")))(input)?;
    let (input, command) = rest(input)?;
    Ok((input, (stamp, command)))
}

/// Extract the command portion of a log line
pub fn command_of(line: &str) -> Option<&str> {
    log_line(line).ok().map(|(_, (_, command))| command)
}
