use std::mem;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::ast::{ClassDecl, Expr, ExprId, Stmt};
use crate::token::Token;

pub mod error;

pub use error::{ResolveError, ResolveErrorKind};

/// Where a local variable lives: `distance` environments up from the use, at `slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Binding {
    pub distance: usize,
    pub slot: usize,
}

/// Side table from variable-reference nodes to their bindings. Absent ids are globals.
pub type Resolutions = FxHashMap<ExprId, Binding>;

/// How a local that is declared but never read gets reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolverOptions {
    pub unused_variables: Severity,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resolution {
    pub bindings: Resolutions,
    pub errors: Vec<ResolveError>,
    pub warnings: Vec<ResolveError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VariableState {
    Declared,
    Defined,
    Used,
}

#[derive(Debug)]
struct Variable {
    token: Token,
    state: VariableState,
}

/// One lexical scope; variables keep their declaration order, which is also their slot.
#[derive(Debug, Default)]
struct Scope {
    slots: FxHashMap<String, usize>,
    variables: Vec<Variable>,
}

impl Scope {
    fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        let slot = *self.slots.get(name)?;
        self.variables.get_mut(slot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionKind {
    None,
    Function,
    Lambda,
    Initializer,
    Method,
    ClassMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassKind {
    None,
    Class,
    Subclass,
}

pub struct Resolver {
    options: ResolverOptions,
    scopes: Vec<Scope>,
    resolution: Resolution,
    current_function: FunctionKind,
    current_class: ClassKind,
    in_loop: bool,
}

impl Resolver {
    pub fn new(options: ResolverOptions) -> Self {
        Self {
            options,
            scopes: Vec::new(),
            resolution: Resolution::default(),
            current_function: FunctionKind::None,
            current_class: ClassKind::None,
            in_loop: false,
        }
    }

    pub fn resolve_program(mut self, statements: &[Stmt]) -> Resolution {
        self.resolve_statements(statements);
        debug!(
            bindings = self.resolution.bindings.len(),
            errors = self.resolution.errors.len(),
            warnings = self.resolution.warnings.len(),
            "resolved program"
        );
        self.resolution
    }

    fn resolve_statements(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_statement(statement);
        }
    }

    fn resolve_statement(&mut self, statement: &Stmt) {
        match statement {
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_statements(statements);
                self.end_scope();
            }
            Stmt::Class(class) => self.resolve_class(class),
            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),
            Stmt::Function(decl) => {
                self.declare(&decl.name);
                self.define(&decl.name);
                self.resolve_function(&decl.params, &decl.body, FunctionKind::Function);
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_statement(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_statement(else_branch);
                }
            }
            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionKind::None {
                    self.error(keyword, ResolveErrorKind::TopLevelReturn);
                }
                if let Some(value) = value {
                    if self.current_function == FunctionKind::Initializer {
                        self.error(keyword, ResolveErrorKind::ValueReturnFromInitializer);
                    }
                    self.resolve_expr(value);
                }
            }
            Stmt::Break { keyword } => {
                if !self.in_loop {
                    self.error(keyword, ResolveErrorKind::BreakOutsideLoop);
                }
            }
            Stmt::Var { name, initializer } => {
                self.declare(name);
                if let Some(initializer) = initializer {
                    self.resolve_expr(initializer);
                }
                self.define(name);
            }
            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                let enclosing = mem::replace(&mut self.in_loop, true);
                self.resolve_statement(body);
                self.in_loop = enclosing;
            }
        }
    }

    fn resolve_class(&mut self, class: &ClassDecl) {
        let enclosing_class = mem::replace(&mut self.current_class, ClassKind::Class);
        self.declare(&class.name);
        self.define(&class.name);

        if let Some(superclass) = &class.superclass {
            if superclass.name.lexeme == class.name.lexeme {
                self.error(&superclass.name, ResolveErrorKind::InheritsFromItself);
            }
            self.current_class = ClassKind::Subclass;
            self.resolve_variable(superclass.id, &superclass.name);
            self.begin_scope();
            self.define_synthetic("super");
        }

        self.begin_scope();
        self.define_synthetic("this");
        for method in &class.methods {
            let kind = if method.name.lexeme == "init" {
                FunctionKind::Initializer
            } else {
                FunctionKind::Method
            };
            self.resolve_function(&method.params, &method.body, kind);
        }
        for method in &class.class_methods {
            self.resolve_function(&method.params, &method.body, FunctionKind::ClassMethod);
        }
        self.end_scope();

        if class.superclass.is_some() {
            self.end_scope();
        }
        self.current_class = enclosing_class;
    }

    fn resolve_function(&mut self, params: &[Token], body: &[Stmt], kind: FunctionKind) {
        let enclosing_function = mem::replace(&mut self.current_function, kind);
        // Loops do not reach into nested function bodies.
        let enclosing_loop = mem::replace(&mut self.in_loop, false);

        self.begin_scope();
        for param in params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_statements(body);
        self.end_scope();

        self.in_loop = enclosing_loop;
        self.current_function = enclosing_function;
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_branch);
                self.resolve_expr(else_branch);
            }
            Expr::Lambda(lambda) => {
                self.resolve_function(&lambda.params, &lambda.body, FunctionKind::Lambda);
            }
            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for argument in arguments {
                    self.resolve_expr(argument);
                }
            }
            Expr::Get { object, .. } => self.resolve_expr(object),
            Expr::Grouping(inner) => self.resolve_expr(inner),
            Expr::Literal(_) => {}
            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }
            Expr::Super { id, keyword, .. } => {
                match self.current_class {
                    ClassKind::None => self.error(keyword, ResolveErrorKind::SuperOutsideClass),
                    ClassKind::Class => {
                        self.error(keyword, ResolveErrorKind::SuperWithoutSuperclass)
                    }
                    ClassKind::Subclass => {}
                }
                self.resolve_local(*id, keyword);
            }
            Expr::This { id, keyword } => {
                if self.current_class == ClassKind::None {
                    self.error(keyword, ResolveErrorKind::ThisOutsideClass);
                } else if self.current_function == FunctionKind::ClassMethod {
                    self.error(keyword, ResolveErrorKind::ThisInClassMethod);
                }
                self.resolve_local(*id, keyword);
            }
            Expr::Unary { right, .. } => self.resolve_expr(right),
            Expr::Variable { id, name } => self.resolve_variable(*id, name),
        }
    }

    fn resolve_variable(&mut self, id: ExprId, name: &Token) {
        let declared_only = self
            .scopes
            .last_mut()
            .and_then(|scope| scope.get_mut(&name.lexeme))
            .is_some_and(|variable| variable.state == VariableState::Declared);
        if declared_only {
            self.error(name, ResolveErrorKind::ReadInOwnInitializer);
        }
        self.mark_used(name);
        self.resolve_local(id, name);
    }

    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (distance, scope) in self.scopes.iter().rev().enumerate() {
            if let Some(&slot) = scope.slots.get(&name.lexeme) {
                self.resolution
                    .bindings
                    .insert(id, Binding { distance, slot });
                return;
            }
        }
    }

    fn mark_used(&mut self, name: &Token) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(variable) = scope.get_mut(&name.lexeme) {
                variable.state = VariableState::Used;
                return;
            }
        }
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };
        if scope.slots.contains_key(&name.lexeme) {
            self.error(name, ResolveErrorKind::AlreadyDeclared);
            return;
        }
        scope.slots.insert(name.lexeme.clone(), scope.variables.len());
        scope.variables.push(Variable {
            token: name.clone(),
            state: VariableState::Declared,
        });
    }

    fn define(&mut self, name: &Token) {
        if let Some(variable) = self
            .scopes
            .last_mut()
            .and_then(|scope| scope.get_mut(&name.lexeme))
            && variable.state == VariableState::Declared
        {
            variable.state = VariableState::Defined;
        }
    }

    fn define_synthetic(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.slots.insert(name.to_string(), scope.variables.len());
            scope.variables.push(Variable {
                token: Token::synthetic(name),
                state: VariableState::Used,
            });
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    fn end_scope(&mut self) {
        let Some(scope) = self.scopes.pop() else {
            return;
        };
        for variable in scope.variables {
            if variable.state == VariableState::Used {
                continue;
            }
            let unused = ResolveError::at(&variable.token, ResolveErrorKind::UnusedVariable);
            match self.options.unused_variables {
                Severity::Error => self.resolution.errors.push(unused),
                Severity::Warning => {
                    debug!(line = unused.line, name = %variable.token.lexeme, "unused local");
                    self.resolution.warnings.push(unused);
                }
            }
        }
    }

    fn error(&mut self, token: &Token, kind: ResolveErrorKind) {
        self.resolution.errors.push(ResolveError::at(token, kind));
    }
}

pub fn resolve(statements: &[Stmt], options: ResolverOptions) -> Resolution {
    Resolver::new(options).resolve_program(statements)
}
