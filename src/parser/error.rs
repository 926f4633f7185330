use thiserror::Error;

use crate::error::Location;

/// Syntax error reported at the offending token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("[line {line}] Error{location}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub location: Location,
    pub message: String,
}
