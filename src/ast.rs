use std::rc::Rc;

use crate::token::{Literal, Token};

/// Identity of a variable-reference node; the resolver keys its bindings on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    Lambda(Rc<LambdaDecl>),
    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },
    Get {
        object: Box<Expr>,
        name: Token,
    },
    Grouping(Box<Expr>),
    Literal(Literal),
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },
    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },
    This {
        id: ExprId,
        keyword: Token,
    },
    Unary {
        operator: Token,
        right: Box<Expr>,
    },
    Variable {
        id: ExprId,
        name: Token,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

/// An anonymous `fun (params) { body }` expression; `keyword` is the `fun` token.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaDecl {
    pub keyword: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

/// Superclass reference in a class declaration, resolved like any variable read.
#[derive(Debug, Clone, PartialEq)]
pub struct SuperclassRef {
    pub id: ExprId,
    pub name: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: Token,
    pub superclass: Option<SuperclassRef>,
    pub methods: Vec<Rc<FunctionDecl>>,
    pub class_methods: Vec<Rc<FunctionDecl>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Block(Vec<Stmt>),
    Class(ClassDecl),
    Expression(Expr),
    Function(Rc<FunctionDecl>),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    Print(Expr),
    Return {
        keyword: Token,
        value: Option<Expr>,
    },
    Break {
        keyword: Token,
    },
    Var {
        name: Token,
        initializer: Option<Expr>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
}
