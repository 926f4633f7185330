use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use tracing::debug;

use crate::ast::Stmt;
use crate::error::{Diagnostics, LoxError, StaticError};
use crate::interpreter::Interpreter;
use crate::resolver::{self, ResolveError, ResolverOptions, Severity};
use crate::runtime::Value;
use crate::{lexer, parser};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionOptions {
    /// Whether locals that are never read block execution or only warn.
    pub unused_variables: Severity,
}

impl SessionOptions {
    pub fn strict() -> Self {
        Self {
            unused_variables: Severity::Error,
        }
    }
}

/// Runs source text through scan, parse, resolve and interpret against one
/// long-lived interpreter, so globals survive from one run to the next.
pub struct Session {
    interpreter: Interpreter,
    options: SessionOptions,
    next_id: u32,
    warnings: Vec<ResolveError>,
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        Self::with_interpreter(Interpreter::new(), options)
    }

    pub fn with_interpreter(interpreter: Interpreter, options: SessionOptions) -> Self {
        Self {
            interpreter,
            options,
            next_id: 0,
            warnings: Vec::new(),
        }
    }

    /// Session whose program output is collected in memory.
    pub fn captured(options: SessionOptions) -> (Self, CapturedOutput) {
        let output = CapturedOutput::default();
        let interpreter = Interpreter::with_output(Box::new(output.clone()));
        (Self::with_interpreter(interpreter, options), output)
    }

    /// Scans, parses and resolves `source`. Nothing is returned for execution
    /// unless every stage finished without errors.
    pub fn compile(&mut self, source: &str) -> Result<Vec<Stmt>, LoxError> {
        let scanned = lexer::scan(source);
        let parsed = parser::parse(scanned.tokens, self.next_id);
        self.next_id = parsed.next_id;

        if !scanned.errors.is_empty() || !parsed.errors.is_empty() {
            let mut errors = Diagnostics::from(scanned.errors);
            errors.0.extend(parsed.errors.into_iter().map(StaticError::from));
            debug!(errors = errors.0.len(), "syntax errors, not resolving");
            return Err(LoxError::Static(errors));
        }

        let resolution = resolver::resolve(
            &parsed.statements,
            ResolverOptions {
                unused_variables: self.options.unused_variables,
            },
        );
        self.warnings.extend(resolution.warnings);
        if !resolution.errors.is_empty() {
            debug!(
                errors = resolution.errors.len(),
                "resolution errors, not executing"
            );
            return Err(LoxError::Static(Diagnostics::from(resolution.errors)));
        }

        self.interpreter.add_bindings(resolution.bindings);
        Ok(parsed.statements)
    }

    pub fn execute(&mut self, statements: &[Stmt]) -> Result<Value, LoxError> {
        Ok(self.interpreter.interpret(statements)?)
    }

    /// Runs a whole program and returns the value of its last top-level expression statement.
    pub fn run(&mut self, source: &str) -> Result<Value, LoxError> {
        let statements = self.compile(source)?;
        self.execute(&statements)
    }

    /// Runs one prompt line. A missing `;` is supplied, and when the line is a single
    /// bare expression its value is returned for echoing.
    pub fn run_line(&mut self, line: &str) -> Result<Option<Value>, LoxError> {
        let line = line.trim_end();
        let terminated = line.ends_with(';') || line.ends_with('}');
        let source = if terminated {
            line.to_string()
        } else {
            format!("{line};")
        };

        let statements = self.compile(&source)?;
        let echo = !terminated && matches!(statements.as_slice(), [Stmt::Expression(_)]);
        let value = self.execute(&statements)?;
        Ok(echo.then_some(value))
    }

    /// Drains the unused-variable warnings collected since the last call.
    pub fn take_warnings(&mut self) -> Vec<ResolveError> {
        std::mem::take(&mut self.warnings)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

/// In-memory program output shared between a session and its owner.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput(Rc<RefCell<Vec<u8>>>);

impl CapturedOutput {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
