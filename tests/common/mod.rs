//! Common test utilities for sdn integration tests

#![allow(dead_code)]

pub use sdn::{execute, parse, Pipeline, PipelineStatus};

use assert_cmd::Command;
use nix::sys::wait::WaitStatus;
use std::path::Path;

/// The shell binary running in `home`, with HOME pointing there too
pub fn sdn_in(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sdn").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env_remove("SDN_HISTFILE")
        .env_remove("SDN_HISTORY_SIZE")
        .env_remove("SDN_TRACE")
        .env_remove("SDN_BANNER");
    cmd
}

/// Feed `script` to the shell on stdin
pub fn run_script(home: &Path, script: &str) -> assert_cmd::assert::Assert {
    sdn_in(home).write_stdin(script).assert()
}

/// Parse and run a foreground pipeline, returning the per-segment statuses
pub fn run_foreground(line: &str) -> Vec<WaitStatus> {
    let pipeline = parse(line).unwrap();
    match execute(&pipeline).unwrap() {
        PipelineStatus::Foreground(statuses) => statuses,
        other => panic!("expected foreground run, got {:?}", other),
    }
}

/// Exit codes of every segment (`None` for signalled children)
pub fn exit_codes(statuses: &[WaitStatus]) -> Vec<Option<i32>> {
    statuses.iter().map(sdn::executor::exit_code).collect()
}
