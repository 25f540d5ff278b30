use sdn::builtins::{self, Builtin};
use sdn::config::Config;
use sdn::editor::{self, ReadOutcome};
use sdn::executor::{self, describe_status, ExecuteError, PipelineStatus};
use sdn::parser::{parse_pipeline, split_background, ParseError};
use sdn::signals;
use sdn::state::ShellState;
use sdn::terminal;
use std::env;
use std::io::{self, StdinLock};
use thiserror::Error;

use crate::cli::VERSION;

#[derive(Error, Debug)]
pub(crate) enum ReplError {
    #[error("{0}")]
    Execute(#[from] ExecuteError),
    #[error("error reading input: {0}")]
    Read(#[from] io::Error),
}

/// What to do after a line has been handled
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Where lines come from
enum Input {
    /// Raw-mode editor on a terminal
    Terminal,
    /// Plain buffered lines from a pipe or file
    Plain(StdinLock<'static>),
}

impl Input {
    fn detect() -> Self {
        if terminal::is_interactive() {
            Input::Terminal
        } else {
            Input::Plain(io::stdin().lock())
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Input::Terminal)
    }

    fn read(&mut self, state: &ShellState) -> io::Result<ReadOutcome> {
        match self {
            Input::Terminal => editor::read_line(&prompt(), &state.history, &state.resolver),
            Input::Plain(reader) => editor::read_plain_line(reader),
        }
    }
}

fn prompt() -> String {
    match env::current_dir() {
        Ok(cwd) => format!("{}> ", cwd.display()),
        Err(_) => "sdn> ".to_string(),
    }
}

pub(crate) fn run_repl(config: Config) -> Result<(), ReplError> {
    let mut input = Input::detect();

    if input.is_terminal() {
        if let Err(e) = signals::setup_signal_handlers() {
            eprintln!("sdn: signal setup failed: {}", e);
        }
    }

    let mut state = ShellState::new(config);

    if let Err(e) = state.history.load() {
        eprintln!("sdn: {}", e);
    }
    state.trace(&format!(
        "history: {} entries from {}",
        state.history.len(),
        state.history.path().display()
    ));

    match env::current_dir() {
        Ok(cwd) => state.reload_local_aliases(&cwd),
        Err(e) => eprintln!("sdn: cannot read working directory: {}", e),
    }

    if state.config.banner {
        println!("sdn-{} - type 'exit' or Ctrl-D to quit", VERSION);
    }

    loop {
        report_finished(&mut state);

        let line = match input.read(&state)? {
            ReadOutcome::Line(line) => line,
            ReadOutcome::EndOfInput => {
                if input.is_terminal() {
                    println!();
                }
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match process_line(&mut state, &line) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => break,
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => eprintln!("sdn: {}", e),
        }
    }

    report_finished(&mut state);
    Ok(())
}

fn process_line(state: &mut ShellState, line: &str) -> Result<Flow, ExecuteError> {
    let expanded = state.aliases.expand(line);
    let (text, background) = split_background(&expanded);
    state.trace(&format!("line: {}{}", text, if background { " &" } else { "" }));

    if let Err(e) = state.history.record(text) {
        eprintln!("sdn: {}", e);
    }

    if text.trim() == "exit" {
        return Ok(Flow::Exit);
    }

    let mut pipeline = match parse_pipeline(text, background, &state.resolver) {
        Ok(pipeline) => pipeline,
        Err(ParseError::EmptyInput) => return Ok(Flow::Continue),
        Err(e) => {
            eprintln!("sdn: {}", e);
            return Ok(Flow::Continue);
        }
    };
    pipeline.expand_variables(&state.vars);

    if let Some(segment) = pipeline.single() {
        if let Some(builtin) = Builtin::from_segment(segment) {
            state.trace(&format!("builtin: {}", builtin.name()));
            if let Err(e) = builtins::run_segment(builtin, state, segment) {
                eprintln!("sdn: {}", e);
            }
            return Ok(Flow::Continue);
        }
    }

    match executor::execute(&pipeline)? {
        PipelineStatus::Foreground(statuses) => {
            for status in &statuses {
                if let Some(pid) = status.pid() {
                    state.trace(&format!("pid {} finished ({})", pid, describe_status(status)));
                }
            }
        }
        PipelineStatus::Background(pids) => {
            let listing: Vec<String> = pids.iter().map(|pid| format!("[{}]", pid)).collect();
            println!("{}", listing.join(" "));
            state.trace(&format!("{} background process(es) started", pids.len()));
            state.jobs.track(&pids);
        }
    }

    Ok(Flow::Continue)
}

fn report_finished(state: &mut ShellState) {
    for (pid, status) in state.jobs.reap() {
        println!(
            "sdn: background process {} terminated ({})",
            pid,
            describe_status(&status)
        );
    }
}
