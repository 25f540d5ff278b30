//! Parser: one input line to a [`Pipeline`]
//!
//! The line is split on `|` first; each clause is tokenized independently and
//! scanned left to right for redirections. Wildcard words are expanded here,
//! `$NAME` arguments later (see [`Pipeline::expand_variables`]) because they
//! need the shell's variable table.

use crate::lexer::{lex, LexError, Token};
use crate::resolver::PathResolver;
use crate::vars::VariableTable;
use thiserror::Error;

/// Maximum number of arguments in a single segment (after globbing)
pub const MAX_ARGS: usize = 64;

/// Maximum number of segments in a pipeline
pub const MAX_SEGMENTS: usize = 10;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("syntax error near `{0}'")]
    MissingOperand(&'static str),
    #[error("syntax error near `|'")]
    EmptySegment,
    #[error("too many arguments (limit {})", MAX_ARGS)]
    TooManyArgs,
    #[error("too many arguments after wildcard expansion for '{0}'")]
    TooManyMatches(String),
    #[error("too many pipeline segments (limit {})", MAX_SEGMENTS)]
    TooManySegments,
    #[error("Empty input")]
    EmptyInput,
    #[error("{0}")]
    Lex(String),
}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        ParseError::Lex(e.to_string())
    }
}

/// One stage of a pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSegment {
    /// Program name followed by its arguments
    pub argv: Vec<String>,
    pub input: Option<String>,
    pub output: Option<String>,
    /// Append to `output` instead of truncating it
    pub append: bool,
}

impl CommandSegment {
    /// Neither arguments nor redirections
    pub fn is_empty(&self) -> bool {
        self.argv.is_empty() && self.input.is_none() && self.output.is_none()
    }

    fn push_arg(&mut self, arg: String) -> Result<(), ParseError> {
        if self.argv.len() >= MAX_ARGS {
            return Err(ParseError::TooManyArgs);
        }
        self.argv.push(arg);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub segments: Vec<CommandSegment>,
    pub background: bool,
}

impl Pipeline {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The only segment, if this pipeline has exactly one
    pub fn single(&self) -> Option<&CommandSegment> {
        match self.segments.as_slice() {
            [segment] => Some(segment),
            _ => None,
        }
    }

    /// Replace every `$NAME` argument with its value
    pub fn expand_variables(&mut self, vars: &VariableTable) {
        for segment in &mut self.segments {
            for arg in &mut segment.argv {
                if arg.starts_with('$') {
                    *arg = vars.expand_arg(arg);
                }
            }
        }
    }
}

/// Strip a trailing `&` (and one space before it).
///
/// Returns the remaining command text and whether it should run in the
/// background.
pub fn split_background(line: &str) -> (&str, bool) {
    let trimmed = line.trim_end_matches(['\n', '\r']);
    match trimmed.strip_suffix('&') {
        Some(rest) => (rest.strip_suffix(' ').unwrap_or(rest), true),
        None => (trimmed, false),
    }
}

/// Parse a full line, detecting a trailing `&`
pub fn parse(line: &str) -> Result<Pipeline, ParseError> {
    let (text, background) = split_background(line);
    parse_pipeline(text, background, &PathResolver::from_env())
}

/// Parse command text (already stripped of `&`) into a pipeline
pub fn parse_pipeline(
    text: &str,
    background: bool,
    resolver: &PathResolver,
) -> Result<Pipeline, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let clauses: Vec<&str> = text.split('|').collect();
    if clauses.len() > MAX_SEGMENTS {
        return Err(ParseError::TooManySegments);
    }

    let mut segments = Vec::with_capacity(clauses.len());
    for clause in clauses {
        let segment = parse_segment(clause, resolver)?;
        if segment.is_empty() {
            return Err(ParseError::EmptySegment);
        }
        segments.push(segment);
    }

    Ok(Pipeline {
        segments,
        background,
    })
}

/// Parse one pipe-delimited clause
pub fn parse_segment(clause: &str, resolver: &PathResolver) -> Result<CommandSegment, ParseError> {
    let mut segment = CommandSegment::default();
    let mut tokens = lex(clause)?.into_iter();

    while let Some(token) = tokens.next() {
        match token {
            Token::Read => {
                segment.input = Some(expect_operand(tokens.next(), "<")?);
            }
            Token::Write => {
                segment.output = Some(expect_operand(tokens.next(), ">")?);
                segment.append = false;
            }
            Token::Append => {
                segment.output = Some(expect_operand(tokens.next(), ">>")?);
                segment.append = true;
            }
            Token::Word(word) if PathResolver::has_wildcard(&word) => {
                for path in resolver.expand_word(&word) {
                    segment
                        .push_arg(path)
                        .map_err(|_| ParseError::TooManyMatches(word.clone()))?;
                }
            }
            Token::Word(word) => segment.push_arg(word)?,
        }
    }

    Ok(segment)
}

fn expect_operand(token: Option<Token>, op: &'static str) -> Result<String, ParseError> {
    match token {
        Some(Token::Word(word)) => Ok(word),
        _ => Err(ParseError::MissingOperand(op)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> PathResolver {
        PathResolver::with_home(None)
    }

    fn parse_text(text: &str) -> Result<Pipeline, ParseError> {
        let (text, background) = split_background(text);
        parse_pipeline(text, background, &resolver())
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_pipe_with_output_redirect() {
        let pipeline = parse_text("ls -la | grep foo > out.txt").unwrap();
        assert_eq!(pipeline.len(), 2);
        assert!(!pipeline.background);

        assert_eq!(pipeline.segments[0].argv, args(&["ls", "-la"]));
        assert_eq!(pipeline.segments[0].input, None);
        assert_eq!(pipeline.segments[0].output, None);

        assert_eq!(pipeline.segments[1].argv, args(&["grep", "foo"]));
        assert_eq!(pipeline.segments[1].output.as_deref(), Some("out.txt"));
        assert!(!pipeline.segments[1].append);
    }

    #[test]
    fn parse_input_and_append() {
        let pipeline = parse_text("cat < in.txt >> out.txt").unwrap();
        let segment = pipeline.single().unwrap();
        assert_eq!(segment.argv, args(&["cat"]));
        assert_eq!(segment.input.as_deref(), Some("in.txt"));
        assert_eq!(segment.output.as_deref(), Some("out.txt"));
        assert!(segment.append);
    }

    #[test]
    fn last_output_redirect_wins() {
        let pipeline = parse_text("echo hi >> a > b").unwrap();
        let segment = pipeline.single().unwrap();
        assert_eq!(segment.output.as_deref(), Some("b"));
        assert!(!segment.append);
    }

    #[test]
    fn missing_redirect_operand() {
        assert_eq!(parse_text("cat <"), Err(ParseError::MissingOperand("<")));
        assert_eq!(parse_text("echo hi >"), Err(ParseError::MissingOperand(">")));
        assert_eq!(parse_text("echo hi >> | wc"), Err(ParseError::MissingOperand(">>")));
        assert_eq!(parse_text("echo > >"), Err(ParseError::MissingOperand(">")));
    }

    #[test]
    fn empty_segments_are_errors() {
        assert_eq!(parse_text("ls |"), Err(ParseError::EmptySegment));
        assert_eq!(parse_text("| ls"), Err(ParseError::EmptySegment));
        assert_eq!(parse_text("ls || wc"), Err(ParseError::EmptySegment));
    }

    #[test]
    fn blank_input_is_empty() {
        assert_eq!(parse_text(""), Err(ParseError::EmptyInput));
        assert_eq!(parse_text("   "), Err(ParseError::EmptyInput));
        assert_eq!(parse_text("&"), Err(ParseError::EmptyInput));
    }

    #[test]
    fn redirect_only_segment_is_allowed() {
        let pipeline = parse_text("> out.txt").unwrap();
        let segment = pipeline.single().unwrap();
        assert!(segment.argv.is_empty());
        assert_eq!(segment.output.as_deref(), Some("out.txt"));
    }

    #[test]
    fn background_flag() {
        let pipeline = parse_text("sleep 5 &").unwrap();
        assert!(pipeline.background);
        assert_eq!(pipeline.segments[0].argv, args(&["sleep", "5"]));

        assert_eq!(split_background("sleep 5 &"), ("sleep 5", true));
        assert_eq!(split_background("sleep 5&"), ("sleep 5", true));
        assert_eq!(split_background("sleep 5"), ("sleep 5", false));
    }

    #[test]
    fn segment_limit() {
        let line = vec!["true"; MAX_SEGMENTS].join(" | ");
        assert_eq!(parse_text(&line).unwrap().len(), MAX_SEGMENTS);

        let line = vec!["true"; MAX_SEGMENTS + 1].join(" | ");
        assert_eq!(parse_text(&line), Err(ParseError::TooManySegments));
    }

    #[test]
    fn argument_limit() {
        let line = format!("echo {}", vec!["x"; MAX_ARGS - 1].join(" "));
        assert_eq!(parse_text(&line).unwrap().segments[0].argv.len(), MAX_ARGS);

        let line = format!("echo {}", vec!["x"; MAX_ARGS].join(" "));
        assert_eq!(parse_text(&line), Err(ParseError::TooManyArgs));
    }

    #[test]
    fn wildcards_expand_in_place() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::File::create(dir.path().join("a.log")).unwrap();
        std::fs::File::create(dir.path().join("b.log")).unwrap();
        let base = dir.path().display().to_string();

        let pipeline = parse_text(&format!("wc -l {}/*.log end", base)).unwrap();
        assert_eq!(
            pipeline.segments[0].argv,
            vec![
                "wc".to_string(),
                "-l".to_string(),
                format!("{}/a.log", base),
                format!("{}/b.log", base),
                "end".to_string(),
            ]
        );
    }

    #[test]
    fn unmatched_wildcard_is_kept() {
        let pipeline = parse_text("ls /no/such/dir/*.zzz").unwrap();
        assert_eq!(pipeline.segments[0].argv, args(&["ls", "/no/such/dir/*.zzz"]));
    }

    #[test]
    fn redirect_targets_are_not_globbed() {
        let pipeline = parse_text("echo hi > out*.txt").unwrap();
        assert_eq!(pipeline.segments[0].output.as_deref(), Some("out*.txt"));
    }

    #[test]
    fn variables_expand_per_argument() {
        let mut vars = VariableTable::new();
        vars.set("GREETING", "hello").unwrap();

        let mut pipeline = parse_text("echo $GREETING $SDN_PARSER_TEST_UNDEFINED tail").unwrap();
        pipeline.expand_variables(&vars);
        assert_eq!(
            pipeline.segments[0].argv,
            args(&["echo", "hello", "", "tail"])
        );
    }
}
