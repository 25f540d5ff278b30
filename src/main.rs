//! sdn - a small interactive shell
//!
//! Usage:
//!   sdn              Start interactive shell
//!   sdn --help       Show help
//!   sdn --version    Show version

mod cli;
mod repl;

use sdn::config::Config;
use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let cli = cli::parse_args(&args);

    if cli.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }

    if cli.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    for arg in &cli.unknown {
        eprintln!("sdn: ignoring unknown argument '{}'", arg);
    }

    match repl::run_repl(Config::from_env()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("sdn: {}", e);
            ExitCode::FAILURE
        }
    }
}
