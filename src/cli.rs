//! Command-line arguments
//!
//! The shell is normally started without arguments; only help and version
//! flags are understood.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parsed command-line arguments
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub help: bool,
    pub version: bool,
    /// Arguments that were not understood
    pub unknown: Vec<String>,
}

/// Parse command-line arguments (`args[0]` is the program name)
pub fn parse_args(args: &[String]) -> CliArgs {
    let mut cli = CliArgs::default();

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => cli.help = true,
            "--version" | "-V" => cli.version = true,
            other => cli.unknown.push(other.to_string()),
        }
    }

    cli
}

pub fn help_text() -> String {
    format!(
        r#"sdn-{} - a small interactive shell

USAGE:
    sdn                     Start interactive shell
    sdn --help              Show this help message
    sdn --version           Show version

SYNTAX:
    cmd args                Run a program found on PATH
    a | b | c               Pipe output of each stage into the next
    < file                  Read stdin from file
    > file  >> file         Write (truncate / append) stdout to file
    cmd &                   Run in background
    *.txt  file?  [ab]      Wildcards, with ~ and {{a,b}} inside patterns
    $NAME                   Shell variable, then environment, else empty
    NAME=value              Set a shell variable

BUILTINS:
    cd [dir]                Change directory (default $HOME)
    history                 Show the command log
    alias [name[=value]]    List, show or define aliases
    unalias name ...        Remove aliases
    export [NAME[=value]]   List variables or copy them to the environment
    exit                    Leave the shell

EDITING:
    Tab                     Accept suggestion, or complete a file name
    Up / Down               Browse history
    Ctrl-D                  Exit

FILES:
    ~/.sdn_history          Command log
    ./.sdn_aliases          Per-directory aliases (name=value per line)

ENVIRONMENT:
    SDN_HISTFILE            History file location
    SDN_HISTORY_SIZE        Unique commands kept for suggestions (default 1000)
    SDN_TRACE=1             Trace each step on stderr
    SDN_BANNER=1            Show startup banner"#,
        VERSION
    )
}

pub fn print_help() {
    println!("{}", help_text());
}

pub fn print_version() {
    println!("sdn-{}", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_arguments() {
        assert_eq!(parse_args(&args(&["sdn"])), CliArgs::default());
    }

    #[test]
    fn flags() {
        let cli = parse_args(&args(&["sdn", "-h", "--version", "extra"]));
        assert!(cli.help);
        assert!(cli.version);
        assert_eq!(cli.unknown, vec!["extra".to_string()]);
    }

    #[test]
    fn help_mentions_builtins() {
        let text = help_text();
        for name in ["cd", "history", "alias", "unalias", "export"] {
            assert!(text.contains(name));
        }
    }
}
