use thiserror::Error;

use crate::error::Location;
use crate::token::Token;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ResolveErrorKind {
    #[error("Can't read local variable in its own initializer.")]
    ReadInOwnInitializer,
    #[error("Already a variable with this name in this scope.")]
    AlreadyDeclared,
    #[error("Variable is never used.")]
    UnusedVariable,
    #[error("Can't return from top-level code.")]
    TopLevelReturn,
    #[error("Can't return a value from an initializer.")]
    ValueReturnFromInitializer,
    #[error("Can't break outside a loop.")]
    BreakOutsideLoop,
    #[error("Can't use 'this' outside of a class.")]
    ThisOutsideClass,
    #[error("Can't use 'this' in class methods.")]
    ThisInClassMethod,
    #[error("Can't use 'super' outside of a class.")]
    SuperOutsideClass,
    #[error("Can't use 'super' in a class with no superclass.")]
    SuperWithoutSuperclass,
    #[error("A class can't inherit from itself.")]
    InheritsFromItself,
}

/// Static-semantic error found while resolving scopes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("[line {line}] Error{location}: {kind}")]
pub struct ResolveError {
    pub kind: ResolveErrorKind,
    pub line: usize,
    pub location: Location,
}

impl ResolveError {
    pub fn at(token: &Token, kind: ResolveErrorKind) -> Self {
        Self {
            kind,
            line: token.line,
            location: Location::at(token),
        }
    }

    /// Same diagnostic rendered as a non-blocking lint.
    pub fn render_warning(&self) -> String {
        format!("[line {}] Warning{}: {}", self.line, self.location, self.kind)
    }
}
