//! Signal dispositions for the shell and its children
//!
//! The interactive shell ignores SIGINT and SIGQUIT so that Ctrl-C reaches
//! the foreground pipeline without killing the shell. Children restore the
//! defaults between `fork` and `exec`, along with SIGPIPE, which the Rust
//! runtime ignores in the shell process.

use nix::sys::signal::{signal, SigHandler, Signal};

const INTERACTIVE_SIGNALS: [Signal; 2] = [Signal::SIGINT, Signal::SIGQUIT];

/// Set up signal handlers for the shell
pub fn setup_signal_handlers() -> nix::Result<()> {
    for sig in INTERACTIVE_SIGNALS {
        // SAFETY: SigIgn installs no Rust handler
        unsafe { signal(sig, SigHandler::SigIgn) }?;
    }
    Ok(())
}

/// Restore default dispositions; called in a forked child before exec
pub fn restore_default_handlers() -> nix::Result<()> {
    for sig in INTERACTIVE_SIGNALS.into_iter().chain([Signal::SIGPIPE]) {
        // SAFETY: SigDfl installs no Rust handler
        unsafe { signal(sig, SigHandler::SigDfl) }?;
    }
    Ok(())
}

/// Short name of a signal, e.g. `SIGTERM`
pub fn signal_name(sig: Signal) -> &'static str {
    sig.as_str()
}
