use crate::pctl::Pctl;
use crate::{pctl_l, pctl_y};
use lrpar::{LexError, LexParseError, Lexeme, NonStreamingLexer};
use std::error::Error;
use std::fmt;

/// A PCTL syntax error with its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 1-based source line of the offending token.
    pub line: usize,
    /// 1-based source column of the offending token.
    pub col: usize,
    /// Human-readable description of the error.
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "syntax error at line {}, column {}: {}",
            self.line, self.col, self.message
        )
    }
}

impl Error for ParseError {}

/// Parses PCTL source text into a formula.
///
/// Partial input is never accepted: any lexing or parsing error fails the
/// whole property.
pub fn parse(source: &str) -> Result<Pctl<String>, ParseError> {
    let lexerdef = pctl_l::lexerdef();
    let lexer = lexerdef.lexer(source);
    let (parsed, errors) = pctl_y::parse(&lexer);
    if let Some(error) = errors.first() {
        let span = match error {
            LexParseError::LexError(e) => e.span(),
            LexParseError::ParseError(e) => e.lexeme().span(),
        };
        let ((line, col), _) = lexer.line_col(span);
        return Err(ParseError {
            line,
            col,
            message: error.pp(&lexer, &pctl_y::token_epp),
        });
    }
    match parsed {
        Some(Ok(formula)) => Ok(formula),
        _ => Err(ParseError {
            line: 1,
            col: 1,
            message: "empty property".to_owned(),
        }),
    }
}
