//! Tokenization of a single pipeline clause
//!
//! A clause is the text between two `|` characters. It is split on
//! whitespace only; quotes carry no meaning here. Redirection operators are
//! recognized only as standalone words, so `a>b` stays a single argument.

use nom::{
    bytes::complete::take_till1,
    character::complete::{multispace0, multispace1},
    combinator::{all_consuming, map},
    multi::separated_list0,
    sequence::delimited,
    IResult,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A plain word (program name, argument, or wildcard pattern)
    Word(String),
    /// `<`
    Read,
    /// `>`
    Write,
    /// `>>`
    Append,
}

#[derive(Error, Debug)]
pub enum LexError {
    #[error("Parse error: {0}")]
    ParseError(String),
}

fn classify(word: &str) -> Token {
    match word {
        "<" => Token::Read,
        ">" => Token::Write,
        ">>" => Token::Append,
        _ => Token::Word(word.to_string()),
    }
}

fn word(input: &str) -> IResult<&str, Token> {
    map(take_till1(char::is_whitespace), classify)(input)
}

fn clause(input: &str) -> IResult<&str, Vec<Token>> {
    delimited(multispace0, separated_list0(multispace1, word), multispace0)(input)
}

/// Split a clause into tokens
pub fn lex(input: &str) -> Result<Vec<Token>, LexError> {
    all_consuming(clause)(input)
        .map(|(_, tokens)| tokens)
        .map_err(|e| LexError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_empty() {
        assert!(lex("").unwrap().is_empty());
        assert!(lex("   \t ").unwrap().is_empty());
    }

    #[test]
    fn tokenize_words() {
        let tokens = lex("  ls -la   /tmp ").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Word("ls".to_string()),
                Token::Word("-la".to_string()),
                Token::Word("/tmp".to_string()),
            ]
        );
    }

    #[test]
    fn tokenize_redirects() {
        let tokens = lex("cat < in.txt >> out.txt > last").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Word("cat".to_string()),
                Token::Read,
                Token::Word("in.txt".to_string()),
                Token::Append,
                Token::Word("out.txt".to_string()),
                Token::Write,
                Token::Word("last".to_string()),
            ]
        );
    }

    #[test]
    fn attached_operators_are_words() {
        let tokens = lex("echo a>b <c").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Word("echo".to_string()),
                Token::Word("a>b".to_string()),
                Token::Word("<c".to_string()),
            ]
        );
    }

    #[test]
    fn quotes_are_literal() {
        let tokens = lex("echo 'hello world'").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Word("echo".to_string()),
                Token::Word("'hello".to_string()),
                Token::Word("world'".to_string()),
            ]
        );
    }
}
