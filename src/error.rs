use std::fmt;

use thiserror::Error;

use crate::interpreter::RuntimeError;
use crate::lexer::LexError;
use crate::parser::ParseError;
use crate::resolver::ResolveError;
use crate::token::{Token, TokenKind};

/// Process exit status for static (lexical, syntax or resolution) errors.
pub const EXIT_STATIC_ERROR: i32 = 65;
/// Process exit status for runtime errors.
pub const EXIT_RUNTIME_ERROR: i32 = 70;
/// Process exit status for unreadable input files.
pub const EXIT_IO_ERROR: i32 = 74;

/// Where in the source a static diagnostic points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    End,
    Lexeme(String),
}

impl Location {
    pub fn at(token: &Token) -> Self {
        if token.kind == TokenKind::Eof {
            Self::End
        } else {
            Self::Lexeme(token.lexeme.clone())
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::End => write!(f, " at end"),
            Location::Lexeme(lexeme) => write!(f, " at '{lexeme}'"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StaticError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl StaticError {
    pub fn line(&self) -> usize {
        match self {
            StaticError::Lex(error) => error.line,
            StaticError::Parse(error) => error.line,
            StaticError::Resolve(error) => error.line,
        }
    }
}

/// Every static error recorded by the stage that stopped the pipeline, in report order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Diagnostics(pub Vec<StaticError>);

impl Diagnostics {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StaticError> {
        self.0.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoxError {
    #[error("{0}")]
    Static(Diagnostics),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl LoxError {
    pub fn exit_code(&self) -> i32 {
        match self {
            LoxError::Static(_) => EXIT_STATIC_ERROR,
            LoxError::Runtime(_) => EXIT_RUNTIME_ERROR,
        }
    }
}

impl<E: Into<StaticError>> From<Vec<E>> for Diagnostics {
    fn from(errors: Vec<E>) -> Self {
        Self(errors.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_locations() {
        let identifier = Token::new(TokenKind::Identifier, "foo", 3);
        let eof = Token::new(TokenKind::Eof, "", 9);
        assert_eq!(Location::at(&identifier).to_string(), " at 'foo'");
        assert_eq!(Location::at(&eof).to_string(), " at end");
    }

    #[test]
    fn joins_diagnostics_one_per_line() {
        let diagnostics = Diagnostics::from(vec![
            ParseError {
                line: 1,
                location: Location::End,
                message: "Expect ';' after value.".to_string(),
            },
            ParseError {
                line: 2,
                location: Location::Lexeme("x".to_string()),
                message: "Expect expression.".to_string(),
            },
        ]);
        let error = LoxError::Static(diagnostics);
        assert_eq!(
            error.to_string(),
            "[line 1] Error at end: Expect ';' after value.\n[line 2] Error at 'x': Expect expression."
        );
        assert_eq!(error.exit_code(), EXIT_STATIC_ERROR);
    }
}
