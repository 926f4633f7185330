use std::io::{self, BufRead, Write};
use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::ast::{ClassDecl, Expr, ExprId, Stmt};
use crate::builtins;
use crate::resolver::{Binding, Resolutions};
use crate::runtime::{Class, EnvRef, Environment, Function, Lambda, NativeFunction, Value};
use crate::token::{Token, TokenKind};

mod error;

pub use error::{RuntimeError, RuntimeErrorKind};

type RuntimeResult<T> = Result<T, RuntimeError>;

/// Control-flow marker for statement execution.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecResult {
    Normal,
    Return(Value),
    Break,
}

/// Tree-walking evaluator. Holds the global scope, the current scope and the
/// bindings computed by the resolver; bindings accumulate across runs so
/// functions from earlier runs keep working.
pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    bindings: Resolutions,
    output: Box<dyn Write>,
    input: Option<Box<dyn BufRead>>,
}

impl Interpreter {
    /// Interpreter writing to stdout, with the native library installed.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    pub fn with_output(output: Box<dyn Write>) -> Self {
        let globals = Environment::global();
        let mut interpreter = Self {
            environment: Rc::clone(&globals),
            globals,
            bindings: FxHashMap::default(),
            output,
            input: None,
        };
        builtins::install(&mut interpreter);
        interpreter
    }

    /// Replaces stdin as the source for `input()`.
    pub fn with_input(mut self, input: Box<dyn BufRead>) -> Self {
        self.input = Some(input);
        self
    }

    pub fn define_native(&mut self, native: NativeFunction) {
        let name = native.name().to_string();
        self.globals
            .borrow_mut()
            .define(&name, Some(Value::Native(Rc::new(native))));
    }

    pub fn add_bindings(&mut self, bindings: Resolutions) {
        self.bindings.extend(bindings);
    }

    /// Reads one line for `input()`, without its line terminator. `None` at end of input.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let read = match self.input.as_mut() {
            Some(input) => input.read_line(&mut line)?,
            None => io::stdin().read_line(&mut line)?,
        };
        if read == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    /// Executes top-level statements in order and returns the value of the last
    /// top-level expression statement, or `nil`.
    pub fn interpret(&mut self, statements: &[Stmt]) -> RuntimeResult<Value> {
        debug!(statements = statements.len(), "interpret");
        let mut last = Value::Nil;
        for statement in statements {
            if let Stmt::Expression(expr) = statement {
                last = self.evaluate(expr)?;
            } else {
                self.execute(statement)?;
            }
        }
        self.output.flush().map_err(output_error)?;
        Ok(last)
    }

    /// Runs `statements` in `environment`, restoring the previous scope however the
    /// block exits.
    pub(crate) fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: EnvRef,
    ) -> RuntimeResult<ExecResult> {
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = self.execute_statements(statements);
        self.environment = previous;
        result
    }

    fn execute_statements(&mut self, statements: &[Stmt]) -> RuntimeResult<ExecResult> {
        for statement in statements {
            match self.execute(statement)? {
                ExecResult::Normal => {}
                exit => return Ok(exit),
            }
        }
        Ok(ExecResult::Normal)
    }

    fn execute(&mut self, statement: &Stmt) -> RuntimeResult<ExecResult> {
        match statement {
            Stmt::Block(statements) => {
                let environment = Environment::nested(&self.environment);
                self.execute_block(statements, environment)
            }
            Stmt::Class(class) => {
                self.define_class(class)?;
                Ok(ExecResult::Normal)
            }
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(ExecResult::Normal)
            }
            Stmt::Function(decl) => {
                let function = Function::new(Rc::clone(decl), Rc::clone(&self.environment), false);
                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Some(Value::Function(Rc::new(function))));
                Ok(ExecResult::Normal)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(ExecResult::Normal)
                }
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.output, "{value}").map_err(output_error)?;
                Ok(ExecResult::Normal)
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(value) => self.evaluate(value)?,
                    None => Value::Nil,
                };
                Ok(ExecResult::Return(value))
            }
            Stmt::Break { .. } => Ok(ExecResult::Break),
            Stmt::Var { name, initializer } => {
                if Rc::ptr_eq(&self.environment, &self.globals) {
                    // A global initializer may read the previous definition of the name.
                    let value = initializer
                        .as_ref()
                        .map(|initializer| self.evaluate(initializer))
                        .transpose()?;
                    self.globals.borrow_mut().define(&name.lexeme, value);
                    return Ok(ExecResult::Normal);
                }
                // Locals get their slot first; the initializer may assign to it.
                let slot = self.environment.borrow_mut().define(&name.lexeme, None);
                if let Some(initializer) = initializer {
                    let value = self.evaluate(initializer)?;
                    self.environment.borrow_mut().set_slot(slot, value);
                }
                Ok(ExecResult::Normal)
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        ExecResult::Normal => {}
                        ExecResult::Break => break,
                        ExecResult::Return(value) => return Ok(ExecResult::Return(value)),
                    }
                }
                Ok(ExecResult::Normal)
            }
        }
    }

    fn define_class(&mut self, class: &ClassDecl) -> RuntimeResult<()> {
        let superclass = match &class.superclass {
            Some(superclass) => match self.lookup_variable(superclass.id, &superclass.name)? {
                Value::Class(parent) => Some(parent),
                _ => {
                    return Err(RuntimeError::new(
                        &superclass.name,
                        RuntimeErrorKind::SuperclassNotClass,
                    ));
                }
            },
            None => None,
        };

        let slot = self
            .environment
            .borrow_mut()
            .define(&class.name.lexeme, None);

        // Methods close over a scope binding `super` when there is a superclass.
        let method_scope = match &superclass {
            Some(parent) => {
                let scope = Environment::nested(&self.environment);
                scope
                    .borrow_mut()
                    .define("super", Some(Value::Class(Rc::clone(parent))));
                scope
            }
            None => Rc::clone(&self.environment),
        };

        let methods = class
            .methods
            .iter()
            .map(|decl| {
                let is_initializer = decl.name.lexeme == "init";
                let method = Function::new(Rc::clone(decl), Rc::clone(&method_scope), is_initializer);
                (decl.name.lexeme.clone(), Rc::new(method))
            })
            .collect();
        let class_methods = class
            .class_methods
            .iter()
            .map(|decl| {
                let method = Function::new(Rc::clone(decl), Rc::clone(&method_scope), false);
                (decl.name.lexeme.clone(), Rc::new(method))
            })
            .collect();

        let value = Class::new(class.name.lexeme.clone(), superclass, methods, class_methods);
        trace!(class = value.name(), "defined class");
        self.environment
            .borrow_mut()
            .set_slot(slot, Value::Class(Rc::new(value)));
        Ok(())
    }

    fn evaluate(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        match expr {
            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;
                self.assign_variable(*id, name, value.clone())?;
                Ok(value)
            }
            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary(operator, left, right)
            }
            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }
            Expr::Lambda(decl) => Ok(Value::Lambda(Rc::new(Lambda::new(
                Rc::clone(decl),
                Rc::clone(&self.environment),
            )))),
            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;
                let arguments = arguments
                    .iter()
                    .map(|argument| self.evaluate(argument))
                    .collect::<RuntimeResult<Vec<_>>>()?;
                self.call(&callee, paren, arguments)
            }
            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => instance.get(name),
                Value::Class(class) => class.get(name),
                _ => Err(RuntimeError::new(
                    name,
                    RuntimeErrorKind::PropertyOnNonInstance,
                )),
            },
            Expr::Grouping(inner) => self.evaluate(inner),
            Expr::Literal(literal) => Ok(Value::from(literal.clone())),
            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let short_circuits = if operator.kind == TokenKind::Or {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };
                if short_circuits {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }
            Expr::Set {
                object,
                name,
                value,
            } => {
                let object = self.evaluate(object)?;
                match object {
                    Value::Instance(instance) => {
                        let value = self.evaluate(value)?;
                        instance.set(name, value.clone());
                        Ok(value)
                    }
                    Value::Class(class) => {
                        let value = self.evaluate(value)?;
                        class.set(name, value.clone());
                        Ok(value)
                    }
                    _ => Err(RuntimeError::new(
                        name,
                        RuntimeErrorKind::FieldOnNonInstance,
                    )),
                }
            }
            Expr::Super {
                id,
                keyword,
                method,
            } => self.lookup_super(*id, keyword, method),
            Expr::This { id, keyword } => self.lookup_variable(*id, keyword),
            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;
                match operator.kind {
                    TokenKind::Minus => match right {
                        Value::Number(value) => Ok(Value::Number(-value)),
                        _ => Err(RuntimeError::new(
                            operator,
                            RuntimeErrorKind::NumberOperand,
                        )),
                    },
                    _ => Ok(Value::Bool(!right.is_truthy())),
                }
            }
            Expr::Variable { id, name } => self.lookup_variable(*id, name),
        }
    }

    fn call(&mut self, callee: &Value, paren: &Token, arguments: Vec<Value>) -> RuntimeResult<Value> {
        let Some(callable) = callee.as_callable() else {
            return Err(RuntimeError::new(paren, RuntimeErrorKind::NotCallable));
        };
        if arguments.len() != callable.arity() {
            return Err(RuntimeError::new(
                paren,
                RuntimeErrorKind::ArityMismatch {
                    expected: callable.arity(),
                    found: arguments.len(),
                },
            ));
        }
        callable
            .call(self, arguments)
            .map_err(|error| error.at_call_site(paren.line))
    }

    fn lookup_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> RuntimeResult<Value> {
        let Some(&Binding { distance, slot }) = self.bindings.get(&id) else {
            return Err(undefined_variable(keyword));
        };
        let superclass = Environment::get_at(&self.environment, distance, slot).flatten();
        // `this` sits in the scope just inside the one holding `super`.
        let receiver = distance
            .checked_sub(1)
            .and_then(|distance| Environment::get_at(&self.environment, distance, 0))
            .flatten();

        let found = match (&superclass, &receiver) {
            (Some(Value::Class(superclass)), Some(receiver @ Value::Instance(_))) => superclass
                .find_method(&method.lexeme)
                .map(|found| found.bind(receiver.clone())),
            (Some(Value::Class(superclass)), Some(receiver @ Value::Class(_))) => superclass
                .find_class_method(&method.lexeme)
                .map(|found| found.bind(receiver.clone())),
            _ => return Err(undefined_variable(keyword)),
        };
        match found {
            Some(function) => Ok(Value::Function(Rc::new(function))),
            None => Err(RuntimeError::new(
                method,
                RuntimeErrorKind::UndefinedProperty {
                    name: method.lexeme.clone(),
                },
            )),
        }
    }

    fn lookup_variable(&self, id: ExprId, name: &Token) -> RuntimeResult<Value> {
        let stored = match self.bindings.get(&id) {
            Some(binding) => Environment::get_at(&self.environment, binding.distance, binding.slot),
            None => self.globals.borrow().get(&name.lexeme),
        };
        match stored {
            Some(Some(value)) => Ok(value),
            Some(None) => Err(RuntimeError::new(
                name,
                RuntimeErrorKind::UninitializedVariable {
                    name: name.lexeme.clone(),
                },
            )),
            None => Err(undefined_variable(name)),
        }
    }

    fn assign_variable(&self, id: ExprId, name: &Token, value: Value) -> RuntimeResult<()> {
        let assigned = match self.bindings.get(&id) {
            Some(binding) => {
                Environment::assign_at(&self.environment, binding.distance, binding.slot, value)
            }
            None => self.globals.borrow_mut().assign(&name.lexeme, value),
        };
        if assigned {
            Ok(())
        } else {
            Err(undefined_variable(name))
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn binary(operator: &Token, left: Value, right: Value) -> RuntimeResult<Value> {
    let value = match operator.kind {
        TokenKind::Comma => right,
        TokenKind::EqualEqual => Value::Bool(left == right),
        TokenKind::BangEqual => Value::Bool(left != right),
        TokenKind::Plus => match (left, right) {
            (Value::Number(left), Value::Number(right)) => Value::Number(left + right),
            (Value::String(left), Value::String(right)) => Value::string(format!("{left}{right}")),
            (Value::String(left), right @ Value::Number(_)) => {
                Value::string(format!("{left}{right}"))
            }
            (left @ Value::Number(_), Value::String(right)) => {
                Value::string(format!("{left}{right}"))
            }
            _ => return Err(RuntimeError::new(operator, RuntimeErrorKind::AddOperands)),
        },
        _ => {
            let (Value::Number(left), Value::Number(right)) = (left, right) else {
                return Err(RuntimeError::new(
                    operator,
                    RuntimeErrorKind::NumberOperands,
                ));
            };
            match operator.kind {
                TokenKind::Minus => Value::Number(left - right),
                TokenKind::Star => Value::Number(left * right),
                TokenKind::Slash => {
                    if right == 0.0 {
                        return Err(RuntimeError::new(
                            operator,
                            RuntimeErrorKind::DivisionByZero,
                        ));
                    }
                    Value::Number(left / right)
                }
                TokenKind::Greater => Value::Bool(left > right),
                TokenKind::GreaterEqual => Value::Bool(left >= right),
                TokenKind::Less => Value::Bool(left < right),
                TokenKind::LessEqual => Value::Bool(left <= right),
                _ => unreachable!("parser only builds binary nodes from binary operators"),
            }
        }
    };
    Ok(value)
}

fn undefined_variable(name: &Token) -> RuntimeError {
    RuntimeError::new(
        name,
        RuntimeErrorKind::UndefinedVariable {
            name: name.lexeme.clone(),
        },
    )
}

fn output_error(error: io::Error) -> RuntimeError {
    RuntimeError {
        kind: RuntimeErrorKind::Output {
            message: error.to_string(),
        },
        line: 0,
    }
}
