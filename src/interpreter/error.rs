use thiserror::Error;

use crate::token::Token;

/// Typed failures raised while evaluating a program.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    #[error("Operand must be a number.")]
    NumberOperand,
    #[error("Operands must be numbers.")]
    NumberOperands,
    #[error("Operands must be numbers or strings.")]
    AddOperands,
    #[error("Division by zero.")]
    DivisionByZero,
    #[error("Can only call functions and classes.")]
    NotCallable,
    #[error("Expected {expected} arguments but got {found}.")]
    ArityMismatch { expected: usize, found: usize },
    #[error("Only instances have properties.")]
    PropertyOnNonInstance,
    #[error("Only instances have fields.")]
    FieldOnNonInstance,
    #[error("Undefined property '{name}'.")]
    UndefinedProperty { name: String },
    #[error("Undefined variable '{name}'.")]
    UndefinedVariable { name: String },
    #[error("Variable '{name}' not initialized.")]
    UninitializedVariable { name: String },
    #[error("Superclass must be a class.")]
    SuperclassNotClass,
    #[error("'init' not allowed on classes.")]
    InitOnClass,
    #[error("Output error: {message}")]
    Output { message: String },
    #[error("{function}: {message}")]
    Native { function: String, message: String },
}

/// A runtime error and the source line it is reported against.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind}\n[line {line}]")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub line: usize,
}

impl RuntimeError {
    pub fn new(token: &Token, kind: RuntimeErrorKind) -> Self {
        Self {
            kind,
            line: token.line,
        }
    }

    /// Error raised inside a native function. The synthetic token has no line of its
    /// own, so the interpreter stamps the call site onto it.
    pub fn native(function: &str, message: impl Into<String>) -> Self {
        Self::new(
            &Token::synthetic(function),
            RuntimeErrorKind::Native {
                function: function.to_string(),
                message: message.into(),
            },
        )
    }

    pub(crate) fn at_call_site(mut self, line: usize) -> Self {
        if self.line == 0 {
            self.line = line;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    #[test]
    fn renders_message_then_line() {
        let token = Token::new(TokenKind::Slash, "/", 4);
        let error = RuntimeError::new(&token, RuntimeErrorKind::DivisionByZero);
        assert_eq!(error.to_string(), "Division by zero.\n[line 4]");
    }

    #[test]
    fn native_errors_take_the_call_site_line() {
        let error = RuntimeError::native("file_open", "first argument must be string.");
        assert_eq!(error.line, 0);
        let error = error.at_call_site(12);
        assert_eq!(
            error.to_string(),
            "file_open: first argument must be string.\n[line 12]"
        );
        assert_eq!(error.clone().at_call_site(3).line, 12);
    }
}
