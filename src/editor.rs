//! Interactive line editor
//!
//! Keystrokes arrive one byte at a time from a terminal in raw mode. A small
//! [`KeyDecoder`] turns bytes into [`Key`]s; [`LineEditor`] applies them to
//! the buffer and redraws the prompt line.
//!
//! Editing is append-only at the end of the line. While typing, the newest
//! history entry that extends the buffer is shown as dim "ghost" text after
//! the cursor; Tab accepts it. Without a suggestion, Tab completes the word
//! under the cursor against the filesystem.

use crate::history::History;
use crate::resolver::{common_prefix, PathResolver};
use crate::terminal::{terminal_width, RawMode};
use std::io::{self, BufRead, Read, Write};

/// Size of the input buffer; a line holds at most `MAX_LINE - 1` bytes
pub const MAX_LINE: usize = 1024;

const GRAY: &str = "\x1b[90m";
const RESET: &str = "\x1b[0m";
const CLEAR_LINE: &str = "\x1b[2K\r";

const ESC: u8 = 0x1b;
const CTRL_D: u8 = 4;
const BACKSPACE: u8 = 8;
const DELETE: u8 = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    Tab,
    Up,
    Down,
    EndOfInput,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum DecodeState {
    #[default]
    Ground,
    /// Saw ESC, waiting for the introducer byte
    Escape,
    /// Saw ESC and introducer, waiting for the final byte
    Sequence(u8),
}

/// Byte-to-key state machine.
///
/// An escape sequence is always ESC plus two bytes. Only `ESC [ A`/`ESC [ B`
/// (and their `ESC O` application-mode forms) produce keys; every other
/// sequence is consumed and dropped.
#[derive(Debug, Default)]
pub struct KeyDecoder {
    state: DecodeState,
}

impl KeyDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, byte: u8) -> Option<Key> {
        match self.state {
            DecodeState::Escape => {
                self.state = DecodeState::Sequence(byte);
                None
            }
            DecodeState::Sequence(intro) => {
                self.state = DecodeState::Ground;
                match (intro, byte) {
                    (b'[' | b'O', b'A') => Some(Key::Up),
                    (b'[' | b'O', b'B') => Some(Key::Down),
                    _ => None,
                }
            }
            DecodeState::Ground => match byte {
                ESC => {
                    self.state = DecodeState::Escape;
                    None
                }
                b'\r' | b'\n' => Some(Key::Enter),
                DELETE | BACKSPACE => Some(Key::Backspace),
                b'\t' => Some(Key::Tab),
                CTRL_D => Some(Key::EndOfInput),
                0x20..=0x7e => Some(Key::Char(byte as char)),
                _ => None,
            },
        }
    }
}

/// What the editor produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// Ctrl-D or end of stream; distinct from an empty line
    EndOfInput,
}

pub struct LineEditor<'a> {
    prompt: &'a str,
    history: &'a History,
    resolver: &'a PathResolver,
    buffer: String,
    suggestion: String,
    /// History browsing position; `history.len()` means past the newest entry
    nav: usize,
    capacity: usize,
    width: usize,
}

impl<'a> LineEditor<'a> {
    pub fn new(prompt: &'a str, history: &'a History, resolver: &'a PathResolver) -> Self {
        LineEditor {
            prompt,
            history,
            resolver,
            buffer: String::new(),
            suggestion: String::new(),
            nav: history.len(),
            capacity: MAX_LINE - 1,
            width: 80,
        }
    }

    /// Terminal width used to lay out completion candidates
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(1);
        self
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn suggestion(&self) -> &str {
        &self.suggestion
    }

    /// Print the initial prompt
    pub fn start<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "{}", self.prompt)?;
        out.flush()
    }

    /// Apply one key.
    ///
    /// Returns `Some` once editing is finished.
    pub fn handle_key<W: Write>(&mut self, key: Key, out: &mut W) -> io::Result<Option<ReadOutcome>> {
        match key {
            Key::Char(c) => {
                if self.buffer.len() < self.capacity {
                    self.buffer.push(c);
                    self.nav = self.history.len();
                    self.refresh_suggestion();
                    self.redraw(out)?;
                }
            }
            Key::Backspace => {
                if self.buffer.pop().is_some() {
                    self.nav = self.history.len();
                    self.refresh_suggestion();
                    self.redraw(out)?;
                }
            }
            Key::Up => {
                if self.nav > 0 && !self.history.is_empty() {
                    self.nav -= 1;
                    self.load_nav_entry();
                    self.redraw(out)?;
                }
            }
            Key::Down => {
                if self.nav < self.history.len() {
                    self.nav += 1;
                    self.load_nav_entry();
                    self.redraw(out)?;
                }
            }
            Key::Tab => {
                if self.suggestion.is_empty() {
                    self.complete_path(out)?;
                } else {
                    self.accept_suggestion();
                    self.redraw(out)?;
                }
            }
            Key::Enter => {
                if !self.suggestion.is_empty() {
                    // erase ghost text before leaving the line
                    write!(out, "\x1b[K")?;
                }
                writeln!(out)?;
                out.flush()?;
                return Ok(Some(ReadOutcome::Line(std::mem::take(&mut self.buffer))));
            }
            Key::EndOfInput => return Ok(Some(ReadOutcome::EndOfInput)),
        }
        out.flush()?;
        Ok(None)
    }

    fn refresh_suggestion(&mut self) {
        self.suggestion = self
            .history
            .find_prefix_match(&self.buffer)
            .map(|m| m[self.buffer.len()..].to_string())
            .unwrap_or_default();
    }

    fn load_nav_entry(&mut self) {
        self.buffer = match self.history.entries().get(self.nav) {
            Some(entry) => truncate_to(entry, self.capacity).to_string(),
            None => String::new(),
        };
        self.suggestion.clear();
    }

    fn accept_suggestion(&mut self) {
        let room = self.capacity.saturating_sub(self.buffer.len());
        self.buffer.push_str(truncate_to(&self.suggestion, room));
        self.suggestion.clear();
        self.nav = self.history.len();
    }

    fn complete_path<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let word_start = self
            .buffer
            .rfind(char::is_whitespace)
            .map(|i| i + 1)
            .unwrap_or(0);
        let word = self.buffer[word_start..].to_string();
        if word.is_empty() {
            return Ok(());
        }

        let matches = self.resolver.complete(&word);
        match matches.as_slice() {
            [] => {}
            [single] => {
                self.replace_word(word_start, single);
                self.redraw(out)?;
            }
            _ => {
                let prefix = common_prefix(&matches);
                if prefix.len() > word.len() {
                    self.replace_word(word_start, &prefix);
                }
                writeln!(out)?;
                write_columns(out, &matches, self.width)?;
                write!(out, "{}{}", self.prompt, self.buffer)?;
            }
        }
        Ok(())
    }

    fn replace_word(&mut self, word_start: usize, replacement: &str) {
        if word_start + replacement.len() <= self.capacity {
            self.buffer.truncate(word_start);
            self.buffer.push_str(replacement);
        }
    }

    fn redraw<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "{}{}{}", CLEAR_LINE, self.prompt, self.buffer)?;
        if !self.suggestion.is_empty() {
            write!(
                out,
                "{}{}{}\x1b[{}D",
                GRAY,
                self.suggestion,
                RESET,
                self.suggestion.chars().count()
            )?;
        }
        Ok(())
    }
}

/// Print candidates in fixed-width columns fitted to `width`
pub fn write_columns<W: Write>(out: &mut W, items: &[String], width: usize) -> io::Result<()> {
    let col_width = items.iter().map(|s| s.chars().count()).max().unwrap_or(0) + 2;
    let columns = (width / col_width).max(1);

    for row in items.chunks(columns) {
        let line: String = row
            .iter()
            .map(|item| format!("{:<w$}", item, w = col_width))
            .collect();
        writeln!(out, "{}", line.trim_end())?;
    }
    Ok(())
}

fn truncate_to(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Read one line from the terminal with editing, suggestions and completion
pub fn read_line(prompt: &str, history: &History, resolver: &PathResolver) -> io::Result<ReadOutcome> {
    let _raw = RawMode::enable()?;
    let mut editor = LineEditor::new(prompt, history, resolver).with_width(terminal_width());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    editor.start(&mut out)?;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut decoder = KeyDecoder::new();
    let mut byte = [0u8; 1];

    loop {
        match input.read(&mut byte) {
            Ok(0) => return Ok(ReadOutcome::EndOfInput),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
        if let Some(key) = decoder.feed(byte[0]) {
            if let Some(outcome) = editor.handle_key(key, &mut out)? {
                return Ok(outcome);
            }
        }
    }
}

/// Read one line without a terminal (pipes, files)
pub fn read_plain_line<R: BufRead>(reader: &mut R) -> io::Result<ReadOutcome> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(ReadOutcome::EndOfInput);
    }
    let trimmed_len = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed_len);
    Ok(ReadOutcome::Line(line))
}
