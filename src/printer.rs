//! Parenthesised prefix rendering of the syntax tree, for debugging the parser.

use crate::ast::{Expr, Stmt};
use crate::token::{Literal, Token};

pub fn print_program(statements: &[Stmt]) -> String {
    statements
        .iter()
        .map(print_stmt)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn print_expr(expr: &Expr) -> String {
    match expr {
        Expr::Assign { name, value, .. } => parenthesize("=", [name.lexeme.clone(), print_expr(value)]),
        Expr::Binary {
            left,
            operator,
            right,
        }
        | Expr::Logical {
            left,
            operator,
            right,
        } => parenthesize(&operator.lexeme, [print_expr(left), print_expr(right)]),
        Expr::Ternary {
            condition,
            then_branch,
            else_branch,
        } => parenthesize(
            "ternary",
            [
                print_expr(condition),
                print_expr(then_branch),
                print_expr(else_branch),
            ],
        ),
        Expr::Lambda(lambda) => {
            let mut parts = vec![params(&lambda.params)];
            parts.extend(lambda.body.iter().map(print_stmt));
            parenthesize("lambda", parts)
        }
        Expr::Call {
            callee, arguments, ..
        } => {
            let mut parts = vec![print_expr(callee)];
            parts.extend(arguments.iter().map(print_expr));
            parenthesize("call", parts)
        }
        Expr::Get { object, name } => parenthesize(".", [print_expr(object), name.lexeme.clone()]),
        Expr::Grouping(inner) => parenthesize("group", [print_expr(inner)]),
        Expr::Literal(literal) => print_literal(literal),
        Expr::Set {
            object,
            name,
            value,
        } => parenthesize(
            "set",
            [print_expr(object), name.lexeme.clone(), print_expr(value)],
        ),
        Expr::Super { method, .. } => parenthesize("super", [method.lexeme.clone()]),
        Expr::This { .. } => "this".to_string(),
        Expr::Unary { operator, right } => parenthesize(&operator.lexeme, [print_expr(right)]),
        Expr::Variable { name, .. } => name.lexeme.clone(),
    }
}

pub fn print_stmt(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Block(statements) => parenthesize("block", statements.iter().map(print_stmt)),
        Stmt::Class(class) => {
            let mut parts = vec![class.name.lexeme.clone()];
            if let Some(superclass) = &class.superclass {
                parts.push(format!("< {}", superclass.name.lexeme));
            }
            for method in &class.methods {
                parts.push(function("fun", &method.name, &method.params, &method.body));
            }
            for method in &class.class_methods {
                parts.push(function("class", &method.name, &method.params, &method.body));
            }
            parenthesize("class", parts)
        }
        Stmt::Expression(expr) => parenthesize(";", [print_expr(expr)]),
        Stmt::Function(decl) => function("fun", &decl.name, &decl.params, &decl.body),
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => {
            let mut parts = vec![print_expr(condition), print_stmt(then_branch)];
            if let Some(else_branch) = else_branch {
                parts.push(print_stmt(else_branch));
            }
            parenthesize("if", parts)
        }
        Stmt::Print(expr) => parenthesize("print", [print_expr(expr)]),
        Stmt::Return { value, .. } => parenthesize("return", value.iter().map(print_expr)),
        Stmt::Break { .. } => "(break)".to_string(),
        Stmt::Var { name, initializer } => match initializer {
            Some(initializer) => parenthesize(
                "var",
                [name.lexeme.clone(), "=".to_string(), print_expr(initializer)],
            ),
            None => parenthesize("var", [name.lexeme.clone()]),
        },
        Stmt::While { condition, body } => {
            parenthesize("while", [print_expr(condition), print_stmt(body)])
        }
    }
}

fn print_literal(literal: &Literal) -> String {
    match literal {
        Literal::String(value) => format!("\"{value}\""),
        other => other.to_string(),
    }
}

fn function(keyword: &str, name: &Token, parameters: &[Token], body: &[Stmt]) -> String {
    let mut parts = vec![name.lexeme.clone(), params(parameters)];
    parts.extend(body.iter().map(print_stmt));
    parenthesize(keyword, parts)
}

fn params(parameters: &[Token]) -> String {
    let names = parameters
        .iter()
        .map(|param| param.lexeme.as_str())
        .collect::<Vec<_>>();
    format!("({})", names.join(" "))
}

fn parenthesize(name: &str, parts: impl IntoIterator<Item = String>) -> String {
    let mut rendered = format!("({name}");
    for part in parts {
        rendered.push(' ');
        rendered.push_str(&part);
    }
    rendered.push(')');
    rendered
}
