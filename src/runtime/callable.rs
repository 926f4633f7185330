use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::ast::{FunctionDecl, LambdaDecl, Stmt};
use crate::interpreter::{ExecResult, Interpreter, RuntimeError};
use crate::token::Token;

use super::{EnvRef, Environment, Value};

/// Anything a script can call. The interpreter checks arity before `call`.
pub trait Callable {
    fn arity(&self) -> usize;

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>)
    -> Result<Value, RuntimeError>;
}

/// A named function or method together with the environment it closes over.
pub struct Function {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_initializer: bool,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    /// Returns a copy whose closure has `this` bound to `receiver` in slot 0.
    pub fn bind(&self, receiver: Value) -> Function {
        let environment = Environment::nested(&self.closure);
        environment.borrow_mut().define("this", Some(receiver));
        Function {
            declaration: Rc::clone(&self.declaration),
            closure: environment,
            is_initializer: self.is_initializer,
        }
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        trace!(function = self.name(), "call");
        let result = invoke(
            interpreter,
            &self.closure,
            &self.declaration.params,
            &self.declaration.body,
            arguments,
        )?;
        if self.is_initializer {
            // Initializers always hand back the receiver bound by `bind`.
            return Ok(self
                .closure
                .borrow()
                .get_slot(0)
                .flatten()
                .unwrap_or(Value::Nil));
        }
        Ok(result)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("is_initializer", &self.is_initializer)
            .finish()
    }
}

/// An anonymous function value.
pub struct Lambda {
    declaration: Rc<LambdaDecl>,
    closure: EnvRef,
}

impl Lambda {
    pub fn new(declaration: Rc<LambdaDecl>, closure: EnvRef) -> Self {
        Self {
            declaration,
            closure,
        }
    }
}

impl Callable for Lambda {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        trace!(line = self.declaration.keyword.line, "call lambda");
        invoke(
            interpreter,
            &self.closure,
            &self.declaration.params,
            &self.declaration.body,
            arguments,
        )
    }
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lambda")
            .field("line", &self.declaration.keyword.line)
            .finish()
    }
}

/// Runs a body in a fresh environment layered on `closure`, binding parameters in order.
fn invoke(
    interpreter: &mut Interpreter,
    closure: &EnvRef,
    params: &[Token],
    body: &[Stmt],
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let environment = Environment::nested(closure);
    {
        let mut scope = environment.borrow_mut();
        for (param, argument) in params.iter().zip(arguments) {
            scope.define(&param.lexeme, Some(argument));
        }
    }
    match interpreter.execute_block(body, environment)? {
        ExecResult::Return(value) => Ok(value),
        ExecResult::Normal | ExecResult::Break => Ok(Value::Nil),
    }
}

pub type NativeFn = dyn Fn(&mut Interpreter, Vec<Value>) -> Result<Value, RuntimeError>;

/// Host-provided function. Natives validate their own arguments and report
/// mismatches through `RuntimeError::native`.
pub struct NativeFunction {
    name: String,
    arity: usize,
    function: Box<NativeFn>,
}

impl NativeFunction {
    pub fn new(
        name: impl Into<String>,
        arity: usize,
        function: impl Fn(&mut Interpreter, Vec<Value>) -> Result<Value, RuntimeError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            function: Box::new(function),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        (self.function)(interpreter, arguments)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}
