use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    #[error("Unexpected character '{character}'.")]
    UnexpectedCharacter { character: char },
    #[error("Unterminated string.")]
    UnterminatedString,
    #[error("Unterminated comment.")]
    UnterminatedComment,
}

/// Lexical error tied to the source line where scanning noticed it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("[line {line}] Error: {kind}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub line: usize,
}
