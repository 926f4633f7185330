use std::rc::Rc;

use tracing::debug;

use crate::ast::{ClassDecl, Expr, ExprId, FunctionDecl, LambdaDecl, Stmt, SuperclassRef};
use crate::error::Location;
use crate::token::{Literal, Token, TokenKind};

pub mod error;

pub use error::ParseError;

const MAX_ARGUMENTS: usize = 255;

type ParseResult<T> = Result<T, ParseError>;

/// Best-effort parse output. Statements that failed to parse are dropped and their
/// errors recorded; `next_id` is the first expression id this parse did not use.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub statements: Vec<Stmt>,
    pub errors: Vec<ParseError>,
    pub next_id: u32,
}

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<ParseError>,
    next_id: u32,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>, first_id: u32) -> Self {
        if tokens.last().map(|token| token.kind) != Some(TokenKind::Eof) {
            let line = tokens.last().map_or(1, |token| token.line);
            tokens.push(Token::new(TokenKind::Eof, "", line));
        }
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
            next_id: first_id,
        }
    }

    pub fn parse_program(mut self) -> Parsed {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            if let Some(statement) = self.declaration() {
                statements.push(statement);
            }
        }
        debug!(
            statements = statements.len(),
            errors = self.errors.len(),
            "parsed program"
        );
        Parsed {
            statements,
            errors: self.errors,
            next_id: self.next_id,
        }
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.advance_if(TokenKind::Class) {
            self.class_declaration()
        } else if self.advance_if(TokenKind::Fun) {
            if self.check(TokenKind::LeftParen) {
                // `fun (` starts a lambda expression statement.
                self.recede();
                self.statement()
            } else {
                self.function("function").map(Stmt::Function)
            }
        } else if self.advance_if(TokenKind::Var) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(statement) => Some(statement),
            Err(error) => {
                self.errors.push(error);
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expect class name.")?;
        let superclass = if self.advance_if(TokenKind::Less) {
            let name = self.consume(TokenKind::Identifier, "Expect superclass name.")?;
            Some(SuperclassRef {
                id: self.new_id(),
                name,
            })
        } else {
            None
        };
        self.consume(TokenKind::LeftBrace, "Expect '{' before class body.")?;

        let mut methods = Vec::new();
        let mut class_methods = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if self.advance_if(TokenKind::Class) {
                class_methods.push(self.function("method")?);
            } else {
                methods.push(self.function("method")?);
            }
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after class body.")?;

        Ok(Stmt::Class(ClassDecl {
            name,
            superclass,
            methods,
            class_methods,
        }))
    }

    fn function(&mut self, kind: &str) -> ParseResult<Rc<FunctionDecl>> {
        let name = self.consume(TokenKind::Identifier, &format!("Expect {kind} name."))?;
        self.consume(
            TokenKind::LeftParen,
            &format!("Expect '(' after {kind} name."),
        )?;
        let params = self.parameters()?;
        self.consume(
            TokenKind::LeftBrace,
            &format!("Expect '{{' before {kind} body."),
        )?;
        let body = self.block()?;
        Ok(Rc::new(FunctionDecl { name, params, body }))
    }

    fn lambda(&mut self) -> ParseResult<Expr> {
        let keyword = self.previous().clone();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'fun'.")?;
        let params = self.parameters()?;
        self.consume(TokenKind::LeftBrace, "Expect '{' before lambda body.")?;
        let body = self.block()?;
        Ok(Expr::Lambda(Rc::new(LambdaDecl {
            keyword,
            params,
            body,
        })))
    }

    /// Parses a parameter list after its opening parenthesis, including the closing one.
    fn parameters(&mut self) -> ParseResult<Vec<Token>> {
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_ARGUMENTS {
                    let token = self.peek().clone();
                    self.report(&token, "Can't have more than 255 parameters.");
                }
                params.push(self.consume(TokenKind::Identifier, "Expect parameter name.")?);
                if !self.advance_if(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.")?;
        Ok(params)
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expect variable name.")?;
        let initializer = if self.advance_if(TokenKind::Equal) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(
            TokenKind::Semicolon,
            "Expect ';' after variable declaration.",
        )?;
        Ok(Stmt::Var { name, initializer })
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        if self.advance_if(TokenKind::For) {
            return self.for_statement();
        }
        if self.advance_if(TokenKind::If) {
            return self.if_statement();
        }
        if self.advance_if(TokenKind::Print) {
            let value = self.expression()?;
            self.consume(TokenKind::Semicolon, "Expect ';' after value.")?;
            return Ok(Stmt::Print(value));
        }
        if self.advance_if(TokenKind::Return) {
            let keyword = self.previous().clone();
            let value = if self.check(TokenKind::Semicolon) {
                None
            } else {
                Some(self.expression()?)
            };
            self.consume(TokenKind::Semicolon, "Expect ';' after return value.")?;
            return Ok(Stmt::Return { keyword, value });
        }
        if self.advance_if(TokenKind::Break) {
            let keyword = self.previous().clone();
            self.consume(TokenKind::Semicolon, "Expect ';' after 'break'.")?;
            return Ok(Stmt::Break { keyword });
        }
        if self.advance_if(TokenKind::While) {
            self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.")?;
            let condition = self.expression()?;
            self.consume(TokenKind::RightParen, "Expect ')' after condition.")?;
            let body = Box::new(self.statement()?);
            return Ok(Stmt::While { condition, body });
        }
        if self.advance_if(TokenKind::LeftBrace) {
            return Ok(Stmt::Block(self.block()?));
        }
        self.expression_statement()
    }

    /// Rewrites `for (init; cond; incr) body` into an equivalent `while` loop.
    fn for_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.")?;
        let initializer = if self.advance_if(TokenKind::Semicolon) {
            None
        } else if self.advance_if(TokenKind::Var) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;
        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }
        let condition = condition.unwrap_or(Expr::Literal(Literal::Bool(true)));
        body = Stmt::While {
            condition,
            body: Box::new(body),
        };
        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }
        Ok(body)
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after if condition.")?;
        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.advance_if(TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(statement) = self.declaration() {
                statements.push(statement);
            }
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.comma()
    }

    fn comma(&mut self) -> ParseResult<Expr> {
        let mut expr = self.assignment()?;
        while self.advance_if(TokenKind::Comma) {
            let operator = self.previous().clone();
            let right = self.assignment()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.or()?;
        if !self.advance_if(TokenKind::Equal) {
            return Ok(expr);
        }

        let equals = self.previous().clone();
        let value = Box::new(self.assignment()?);
        match expr {
            Expr::Variable { id, name } => Ok(Expr::Assign { id, name, value }),
            Expr::Get { object, name } => Ok(Expr::Set {
                object,
                name,
                value,
            }),
            other => {
                self.report(&equals, "Invalid assignment target.");
                Ok(other)
            }
        }
    }

    fn or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and()?;
        while self.advance_if(TokenKind::Or) {
            let operator = self.previous().clone();
            let right = self.and()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.ternary()?;
        while self.advance_if(TokenKind::And) {
            let operator = self.previous().clone();
            let right = self.ternary()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn ternary(&mut self) -> ParseResult<Expr> {
        let condition = self.equality()?;
        if !self.advance_if(TokenKind::Question) {
            return Ok(condition);
        }
        let then_branch = self.expression()?;
        self.consume(TokenKind::Colon, "Expect ':' after expression.")?;
        let else_branch = self.assignment()?;
        Ok(Expr::Ternary {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        self.binary(
            &[TokenKind::BangEqual, TokenKind::EqualEqual],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        self.binary(
            &[
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> ParseResult<Expr> {
        self.binary(&[TokenKind::Minus, TokenKind::Plus], Self::factor)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        self.binary(&[TokenKind::Slash, TokenKind::Star], Self::unary)
    }

    /// Left-associative binary level: `operand (op operand)*`.
    fn binary(
        &mut self,
        operators: &[TokenKind],
        operand: fn(&mut Self) -> ParseResult<Expr>,
    ) -> ParseResult<Expr> {
        let mut expr = operand(self)?;
        while operators.iter().any(|kind| self.check(*kind)) {
            let operator = self.advance();
            let right = operand(self)?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if self.check(TokenKind::Bang) || self.check(TokenKind::Minus) {
            let operator = self.advance();
            let right = self.unary()?;
            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }
        self.call()
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = if self.advance_if(TokenKind::Fun) {
            self.lambda()?
        } else {
            self.primary()?
        };

        loop {
            if self.advance_if(TokenKind::LeftParen) {
                expr = self.finish_call(expr)?;
            } else if self.advance_if(TokenKind::Dot) {
                let name =
                    self.consume(TokenKind::Identifier, "Expect property name after '.'.")?;
                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut arguments = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if arguments.len() >= MAX_ARGUMENTS {
                    let token = self.peek().clone();
                    self.report(&token, "Can't have more than 255 arguments.");
                }
                arguments.push(self.assignment()?);
                if !self.advance_if(TokenKind::Comma) {
                    break;
                }
            }
        }
        let paren = self.consume(TokenKind::RightParen, "Expect ')' after arguments.")?;
        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        if self.is_at_end() {
            let token = self.peek().clone();
            return Err(self.error(&token, "Expect expression."));
        }
        let token = self.advance();
        match token.kind {
            TokenKind::False => Ok(Expr::Literal(Literal::Bool(false))),
            TokenKind::True => Ok(Expr::Literal(Literal::Bool(true))),
            TokenKind::Nil => Ok(Expr::Literal(Literal::Nil)),
            TokenKind::Number | TokenKind::String => {
                Ok(Expr::Literal(token.literal.unwrap_or(Literal::Nil)))
            }
            TokenKind::Super => {
                self.consume(TokenKind::Dot, "Expect '.' after 'super'.")?;
                let method =
                    self.consume(TokenKind::Identifier, "Expect superclass method name.")?;
                Ok(Expr::Super {
                    id: self.new_id(),
                    keyword: token,
                    method,
                })
            }
            TokenKind::This => Ok(Expr::This {
                id: self.new_id(),
                keyword: token,
            }),
            TokenKind::Identifier => Ok(Expr::Variable {
                id: self.new_id(),
                name: token,
            }),
            TokenKind::LeftParen => {
                let expr = self.expression()?;
                self.consume(TokenKind::RightParen, "Expect ')' after expression.")?;
                Ok(Expr::Grouping(Box::new(expr)))
            }
            TokenKind::Comma => self.missing_left_operand(token, Self::assignment),
            TokenKind::BangEqual | TokenKind::EqualEqual => {
                self.missing_left_operand(token, Self::comparison)
            }
            TokenKind::Greater
            | TokenKind::GreaterEqual
            | TokenKind::Less
            | TokenKind::LessEqual => self.missing_left_operand(token, Self::term),
            TokenKind::Plus => self.missing_left_operand(token, Self::factor),
            TokenKind::Slash | TokenKind::Star => self.missing_left_operand(token, Self::unary),
            _ => {
                self.recede();
                Err(self.error(&token, "Expect expression."))
            }
        }
    }

    /// Reports a binary operator with no left operand after consuming its right operand.
    fn missing_left_operand(
        &mut self,
        operator: Token,
        operand: fn(&mut Self) -> ParseResult<Expr>,
    ) -> ParseResult<Expr> {
        operand(self)?;
        Err(self.error(
            &operator,
            &format!(
                "Binary operator '{}' not allowed at beginning of expression.",
                operator.lexeme
            ),
        ))
    }

    /// Skips tokens until a likely statement boundary.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon || self.peek().kind.starts_statement()
            {
                return;
            }
            self.advance();
        }
    }
}

impl Parser {
    fn new_id(&mut self) -> ExprId {
        let id = ExprId(self.next_id);
        self.next_id += 1;
        id
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> ParseResult<Token> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let token = self.peek().clone();
        Err(self.error(&token, message))
    }

    fn advance_if(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous().clone()
    }

    fn recede(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn error(&self, token: &Token, message: &str) -> ParseError {
        ParseError {
            line: token.line,
            location: Location::at(token),
            message: message.to_string(),
        }
    }

    /// Records an error without unwinding the current production.
    fn report(&mut self, token: &Token, message: &str) {
        let error = self.error(token, message);
        self.errors.push(error);
    }
}

pub fn parse(tokens: Vec<Token>, first_id: u32) -> Parsed {
    Parser::new(tokens, first_id).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer;
    use crate::printer::print_program;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn parse_source(input: &str) -> Parsed {
        let scanned = lexer::scan(input);
        assert!(scanned.errors.is_empty(), "lex errors: {:?}", scanned.errors);
        parse(scanned.tokens, 0)
    }

    fn render(input: &str) -> String {
        let parsed = parse_source(input);
        assert!(parsed.errors.is_empty(), "parse errors: {:?}", parsed.errors);
        print_program(&parsed.statements)
    }

    fn messages(input: &str) -> Vec<String> {
        parse_source(input)
            .errors
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn parses_simple_program() {
        let input = indoc! {"
            var n = 1 + 2 * 3;
            print -n == 7 or !false;
        "};
        assert_eq!(
            render(input),
            "(var n = (+ 1 (* 2 3)))\n(print (or (== (- n) 7) (! false)))"
        );
    }

    #[test]
    fn ternary_is_right_associated() {
        assert_eq!(
            render("print a ? b : c ? d : e;"),
            "(print (ternary a b (ternary c d e)))"
        );
        assert_eq!(
            render("x = a and b ? 1 : 2;"),
            "(; (= x (and a (ternary b 1 2))))"
        );
    }

    #[test]
    fn comma_binds_looser_than_assignment_but_not_in_arguments() {
        assert_eq!(render("a = 1, b = 2;"), "(; (, (= a 1) (= b 2)))");
        assert_eq!(render("f(1, (2, 3));"), "(; (call f 1 (group (, 2 3))))");
    }

    #[test]
    fn desugars_for_into_while() {
        assert_eq!(
            render("for (var i = 0; i < 3; i = i + 1) print i;"),
            "(block (var i = 0) (while (< i 3) (block (print i) (; (= i (+ i 1))))))"
        );
        assert_eq!(render("for (;;) break;"), "(while true (break))");
    }

    #[test]
    fn parses_classes_with_class_methods() {
        let input = indoc! {"
            class Circle < Shape {
                init(r) { this.r = r; }
                class unit() { return Circle(1); }
                area() { return super.area() * this.r; }
            }
        "};
        let parsed = parse_source(input);
        assert!(parsed.errors.is_empty());
        let Stmt::Class(class) = &parsed.statements[0] else {
            panic!("expected class declaration");
        };
        assert_eq!(class.name.lexeme, "Circle");
        assert_eq!(
            class.superclass.as_ref().map(|superclass| superclass.name.lexeme.as_str()),
            Some("Shape")
        );
        let methods = class
            .methods
            .iter()
            .map(|method| method.name.lexeme.as_str())
            .collect::<Vec<_>>();
        assert_eq!(methods, vec!["init", "area"]);
        assert_eq!(class.class_methods.len(), 1);
        assert_eq!(class.class_methods[0].name.lexeme, "unit");
    }

    #[test]
    fn distinguishes_lambda_from_function_declaration() {
        assert_eq!(
            render("fun named(a) { return a; }"),
            "(fun named (a) (return a))"
        );
        assert_eq!(render("fun (x) { print x; }(1);"), "(; (call (lambda (x) (print x)) 1))");
        assert_eq!(
            render("var f = fun () { return 1; };"),
            "(var f = (lambda () (return 1)))"
        );
    }

    #[test]
    fn assigns_fresh_ids_from_first_id() {
        let scanned = lexer::scan("a = b; this; super.c;");
        let parsed = parse(scanned.tokens, 10);
        assert_eq!(parsed.next_id, 14);
        let Stmt::Expression(Expr::Assign { id, value, .. }) = &parsed.statements[0] else {
            panic!("expected assignment");
        };
        assert_eq!(*id, ExprId(10));
        assert!(matches!(**value, Expr::Variable { id: ExprId(11), .. }));
    }

    #[test]
    fn reports_invalid_assignment_target_without_unwinding() {
        let parsed = parse_source("1 + 2 = 3; print 4;");
        assert_eq!(
            parsed.errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["[line 1] Error at '=': Invalid assignment target."]
        );
        assert_eq!(parsed.statements.len(), 2);
    }

    #[test]
    fn recovers_and_collects_multiple_errors() {
        let input = indoc! {"
            var = 1;
            print (2;
            var ok = 3;
            fun f( { }
        "};
        let parsed = parse_source(input);
        assert_eq!(
            parsed.errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec![
                "[line 1] Error at '=': Expect variable name.",
                "[line 2] Error at ';': Expect ')' after expression.",
                "[line 4] Error at '{': Expect parameter name.",
            ]
        );
        assert_eq!(print_program(&parsed.statements), "(var ok = 3)");
    }

    #[test]
    fn reports_errors_at_end() {
        assert_eq!(
            messages("print 1"),
            vec!["[line 1] Error at end: Expect ';' after value."]
        );
        assert_eq!(
            messages("class A {"),
            vec!["[line 1] Error at end: Expect '}' after class body."]
        );
    }

    #[test]
    fn rejects_binary_operator_without_left_operand() {
        assert_eq!(
            messages("print * 3;"),
            vec!["[line 1] Error at '*': Binary operator '*' not allowed at beginning of expression."]
        );
        assert_eq!(
            messages("print ;"),
            vec!["[line 1] Error at ';': Expect expression."]
        );
    }

    #[test]
    fn caps_parameter_lists() {
        let params = (0..256)
            .map(|index| format!("p{index}"))
            .collect::<Vec<_>>()
            .join(", ");

        let parsed = parse_source(&format!("fun f({params}) {{}}"));
        assert_eq!(parsed.statements.len(), 1);
        let Stmt::Function(decl) = &parsed.statements[0] else {
            panic!("expected function declaration");
        };
        assert_eq!(decl.params.len(), 256);
        assert_eq!(
            parsed.errors.iter().map(|error| error.message.as_str()).collect::<Vec<_>>(),
            vec!["Can't have more than 255 parameters."]
        );
        assert_eq!(parsed.errors[0].location, Location::Lexeme("p255".to_string()));

        let parsed = parse_source(&format!("var g = fun ({params}) {{}};"));
        assert_eq!(parsed.statements.len(), 1);
        assert!(matches!(
            &parsed.statements[0],
            Stmt::Var { initializer: Some(Expr::Lambda(lambda)), .. } if lambda.params.len() == 256
        ));
        assert_eq!(
            parsed.errors.iter().map(|error| error.message.as_str()).collect::<Vec<_>>(),
            vec!["Can't have more than 255 parameters."]
        );
    }

    #[test]
    fn caps_argument_lists() {
        let arguments = vec!["1"; 256].join(", ");
        let parsed = parse_source(&format!("f({arguments});"));
        assert_eq!(parsed.statements.len(), 1);
        assert_eq!(
            parsed.errors.iter().map(|error| error.message.as_str()).collect::<Vec<_>>(),
            vec!["Can't have more than 255 arguments."]
        );
    }
}
