//! Executor: runs a parsed pipeline as forked child processes
//!
//! Every segment gets its own child. Adjacent children are joined by a pipe;
//! explicit `<`/`>`/`>>` redirections are applied after the pipe wiring and
//! therefore win over it. All descriptors are held as [`OwnedFd`] so each one
//! is closed exactly once, in the parent as soon as it is no longer needed
//! and in the child right after it has been duplicated onto stdin/stdout.

use crate::parser::{CommandSegment, Pipeline};
use crate::signals;
use nix::errno::Errno;
use nix::fcntl::{self, OFlag};
use nix::sys::stat::Mode;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{self, dup2, execvp, fork, ForkResult, Pid};
use std::ffi::{CStr, CString};
use std::io::{self, Write};
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};
use thiserror::Error;

/// Exit status of a child whose program could not be executed
pub const EXIT_EXEC_FAILED: i32 = 127;

/// Exit status of a child whose descriptor setup failed
pub const EXIT_SETUP_FAILED: i32 = 1;

#[derive(Error, Debug)]
pub enum ExecuteError {
    #[error("pipe: {0}")]
    Pipe(#[source] io::Error),
    #[error("fork: {0}")]
    Fork(#[source] Errno),
    #[error("waitpid: {0}")]
    Wait(#[source] Errno),
    #[error("{0}: argument contains a NUL byte")]
    InvalidArgument(String),
}

impl ExecuteError {
    /// Failures that leave the shell unable to run anything further
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExecuteError::Pipe(_) | ExecuteError::Fork(_))
    }
}

/// Outcome of [`execute`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStatus {
    /// One wait status per segment, in pipeline order
    Foreground(Vec<WaitStatus>),
    /// Pids of the still-running children, in pipeline order
    Background(Vec<Pid>),
}

/// A segment converted to C strings ahead of `fork`
struct PreparedSegment {
    argv: Vec<CString>,
    input: Option<CString>,
    output: Option<CString>,
    append: bool,
}

impl PreparedSegment {
    fn new(segment: &CommandSegment) -> Result<Self, ExecuteError> {
        let to_c = |s: &str| CString::new(s).map_err(|_| ExecuteError::InvalidArgument(s.to_string()));
        Ok(PreparedSegment {
            argv: segment.argv.iter().map(|a| to_c(a.as_str())).collect::<Result<_, _>>()?,
            input: segment.input.as_deref().map(to_c).transpose()?,
            output: segment.output.as_deref().map(to_c).transpose()?,
            append: segment.append,
        })
    }

    fn name(&self) -> String {
        self.argv
            .first()
            .map(|a| a.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Run a pipeline.
///
/// Foreground pipelines are waited for; background pipelines return their
/// pids immediately and must be reaped later with [`BackgroundJobs::reap`].
pub fn execute(pipeline: &Pipeline) -> Result<PipelineStatus, ExecuteError> {
    let prepared = pipeline
        .segments
        .iter()
        .map(PreparedSegment::new)
        .collect::<Result<Vec<_>, _>>()?;

    // Children inherit unflushed stdout buffers otherwise
    flush_before_fork(&mut io::stdout());

    let pids = spawn_all(&prepared)?;

    if pipeline.background {
        Ok(PipelineStatus::Background(pids))
    } else {
        Ok(PipelineStatus::Foreground(wait_all(&pids)?))
    }
}

/// Flush `out`, reporting a failure on stderr; returns whether it succeeded
fn flush_before_fork<W: Write>(out: &mut W) -> bool {
    match out.flush() {
        Ok(()) => true,
        Err(e) => {
            eprintln!("sdn: stdout: {}", e);
            false
        }
    }
}

fn spawn_all(segments: &[PreparedSegment]) -> Result<Vec<Pid>, ExecuteError> {
    let mut pids = Vec::with_capacity(segments.len());
    let mut prev_read: Option<OwnedFd> = None;

    for (i, segment) in segments.iter().enumerate() {
        let pipe = if i + 1 < segments.len() {
            Some(make_pipe().map_err(ExecuteError::Pipe)?)
        } else {
            None
        };

        // SAFETY: the child only touches pre-built data and then execs or _exits
        match unsafe { fork() } {
            Ok(ForkResult::Child) => run_child(segment, prev_read, pipe),
            Ok(ForkResult::Parent { child }) => {
                pids.push(child);
                // keep only the read end for the next stage
                prev_read = pipe.map(|(read, _write)| read);
            }
            Err(e) => return Err(ExecuteError::Fork(e)),
        }
    }

    Ok(pids)
}

fn wait_all(pids: &[Pid]) -> Result<Vec<WaitStatus>, ExecuteError> {
    let mut statuses = Vec::with_capacity(pids.len());
    for &pid in pids {
        loop {
            match waitpid(pid, None) {
                Ok(status) => {
                    statuses.push(status);
                    break;
                }
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(ExecuteError::Wait(e)),
            }
        }
    }
    Ok(statuses)
}

fn make_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    let (read, write) = unistd::pipe()?;
    // SAFETY: both descriptors are fresh and owned by nobody else
    Ok(unsafe { (OwnedFd::from_raw_fd(read), OwnedFd::from_raw_fd(write)) })
}

fn open_fd(path: &CStr, flags: OFlag) -> nix::Result<OwnedFd> {
    let fd = fcntl::open(path, flags, Mode::from_bits_truncate(0o644))?;
    // SAFETY: open() just returned this descriptor
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

/// Move `fd` onto `target`, closing the original
fn install(fd: OwnedFd, target: RawFd) -> nix::Result<()> {
    if fd.as_raw_fd() == target {
        let _ = fd.into_raw_fd();
        return Ok(());
    }
    dup2(fd.as_raw_fd(), target)?;
    Ok(())
}

/// Child side of the fork. Never returns.
fn run_child(
    segment: &PreparedSegment,
    stdin: Option<OwnedFd>,
    pipe: Option<(OwnedFd, OwnedFd)>,
) -> ! {
    if let Err(message) = wire_child(segment, stdin, pipe) {
        eprintln!("sdn: {}", message);
        exit_child(EXIT_SETUP_FAILED);
    }

    // redirections only: files are opened, nothing to run
    let Some(program) = segment.argv.first() else {
        exit_child(0);
    };

    let err = match execvp(program, &segment.argv) {
        Ok(never) => match never {},
        Err(e) => e,
    };
    match err {
        Errno::ENOENT => eprintln!("sdn: {}: command not found", segment.name()),
        e => eprintln!("sdn: {}: {}", segment.name(), e.desc()),
    }
    exit_child(EXIT_EXEC_FAILED)
}

fn wire_child(
    segment: &PreparedSegment,
    stdin: Option<OwnedFd>,
    pipe: Option<(OwnedFd, OwnedFd)>,
) -> Result<(), String> {
    signals::restore_default_handlers().map_err(|e| format!("signal: {}", e))?;

    if let Some(fd) = stdin {
        install(fd, libc::STDIN_FILENO).map_err(|e| format!("dup2: {}", e))?;
    }
    if let Some((read, write)) = pipe {
        drop(read);
        install(write, libc::STDOUT_FILENO).map_err(|e| format!("dup2: {}", e))?;
    }

    if let Some(path) = &segment.input {
        let fd = open_fd(path, OFlag::O_RDONLY)
            .map_err(|e| format!("{}: {}", path.to_string_lossy(), e.desc()))?;
        install(fd, libc::STDIN_FILENO).map_err(|e| format!("dup2: {}", e))?;
    }
    if let Some(path) = &segment.output {
        let mode = if segment.append { OFlag::O_APPEND } else { OFlag::O_TRUNC };
        let fd = open_fd(path, OFlag::O_WRONLY | OFlag::O_CREAT | mode)
            .map_err(|e| format!("{}: {}", path.to_string_lossy(), e.desc()))?;
        install(fd, libc::STDOUT_FILENO).map_err(|e| format!("dup2: {}", e))?;
    }

    Ok(())
}

fn exit_child(code: i32) -> ! {
    // SAFETY: _exit skips atexit handlers and buffers shared with the parent
    unsafe { libc::_exit(code) }
}

/// Exit code of a finished child, if it exited normally
pub fn exit_code(status: &WaitStatus) -> Option<i32> {
    match status {
        WaitStatus::Exited(_, code) => Some(*code),
        _ => None,
    }
}

/// Human readable end state, e.g. `status 0` or `signal SIGTERM`
pub fn describe_status(status: &WaitStatus) -> String {
    match status {
        WaitStatus::Exited(_, code) => format!("status {}", code),
        WaitStatus::Signaled(_, sig, _) => format!("signal {}", signals::signal_name(*sig)),
        other => format!("{:?}", other),
    }
}

/// Background children not yet reaped
#[derive(Debug, Default)]
pub struct BackgroundJobs {
    pids: Vec<Pid>,
}

impl BackgroundJobs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, pids: &[Pid]) {
        self.pids.extend_from_slice(pids);
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }

    /// Non-blocking sweep; returns the children that have finished
    pub fn reap(&mut self) -> Vec<(Pid, WaitStatus)> {
        let mut finished = Vec::new();
        self.pids.retain(|&pid| loop {
            match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => return true,
                Ok(status @ (WaitStatus::Exited(..) | WaitStatus::Signaled(..))) => {
                    finished.push((pid, status));
                    return false;
                }
                Ok(_) => return true,
                Err(Errno::EINTR) => continue,
                // ECHILD: already collected elsewhere
                Err(_) => return false,
            }
        });
        finished
    }
}
