use std::{iter::Peekable, rc::Rc, str::CharIndices};

use tracing::debug;

use crate::token::{Literal, Token, TokenKind};

pub mod error;

pub use error::{LexError, LexErrorKind};

/// Output of a scan: the token stream always ends in `Eof`, even when errors were recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct Scanned {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    tokens: Vec<Token>,
    errors: Vec<LexError>,
    line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            tokens: Vec::new(),
            errors: Vec::new(),
            line: 1,
        }
    }

    pub fn scan(mut self) -> Scanned {
        while let Some(&(start, ch)) = self.chars.peek() {
            self.scan_token(start, ch);
        }
        self.tokens.push(Token::new(TokenKind::Eof, "", self.line));
        debug!(
            tokens = self.tokens.len(),
            errors = self.errors.len(),
            "scanned source"
        );
        Scanned {
            tokens: self.tokens,
            errors: self.errors,
        }
    }

    fn scan_token(&mut self, start: usize, ch: char) {
        self.advance_char();
        let kind = match ch {
            ' ' | '\r' | '\t' | '\n' => return,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '-' => TokenKind::Minus,
            '+' => TokenKind::Plus,
            ';' => TokenKind::Semicolon,
            '*' => TokenKind::Star,
            '?' => TokenKind::Question,
            ':' => TokenKind::Colon,
            '!' => self.either('=', TokenKind::BangEqual, TokenKind::Bang),
            '=' => self.either('=', TokenKind::EqualEqual, TokenKind::Equal),
            '<' => self.either('=', TokenKind::LessEqual, TokenKind::Less),
            '>' => self.either('=', TokenKind::GreaterEqual, TokenKind::Greater),
            '/' => {
                if self.advance_if('/') {
                    self.skip_line_comment();
                    return;
                }
                if self.advance_if('*') {
                    self.skip_block_comment();
                    return;
                }
                TokenKind::Slash
            }
            '"' => return self.read_string(start),
            c if c.is_ascii_digit() => return self.read_number(start),
            c if c.is_ascii_alphabetic() || c == '_' => return self.read_identifier(start),
            character => {
                self.error(LexErrorKind::UnexpectedCharacter { character });
                return;
            }
        };
        self.push(kind, start);
    }

    fn skip_line_comment(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c == '\n' {
                break;
            }
            self.advance_char();
        }
    }

    fn skip_block_comment(&mut self) {
        // Ends at the first `*/`; comments do not nest.
        while let Some((_, c)) = self.advance_char() {
            if c == '*' && self.advance_if('/') {
                return;
            }
        }
        self.error(LexErrorKind::UnterminatedComment);
    }

    fn read_string(&mut self, start: usize) {
        let line = self.line;
        while let Some((idx, c)) = self.advance_char() {
            if c == '"' {
                let content = &self.input[start + 1..idx];
                let token = Token::new(TokenKind::String, &self.input[start..=idx], line)
                    .with_literal(Literal::String(Rc::from(content)));
                self.tokens.push(token);
                return;
            }
        }
        self.error(LexErrorKind::UnterminatedString);
    }

    fn read_number(&mut self, start: usize) {
        self.consume_digits();
        let fractional = matches!(self.chars.peek(), Some(&(_, '.')))
            && matches!(self.peek_next(), Some(c) if c.is_ascii_digit());
        if fractional {
            self.advance_char();
            self.consume_digits();
        }

        let lexeme = &self.input[start..self.current_index()];
        // Only ASCII digits and one '.' reach here, so the parse cannot fail.
        let value = lexeme.parse::<f64>().unwrap_or_default();
        let token = Token::new(TokenKind::Number, lexeme, self.line)
            .with_literal(Literal::Number(value));
        self.tokens.push(token);
    }

    fn read_identifier(&mut self, start: usize) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance_char();
            } else {
                break;
            }
        }

        let ident = &self.input[start..self.current_index()];
        let kind = TokenKind::keyword(ident).unwrap_or(TokenKind::Identifier);
        self.push(kind, start);
    }

    fn consume_digits(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_digit() {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    fn either(&mut self, expected: char, matched: TokenKind, otherwise: TokenKind) -> TokenKind {
        if self.advance_if(expected) {
            matched
        } else {
            otherwise
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        let lexeme = &self.input[start..self.current_index()];
        self.tokens.push(Token::new(kind, lexeme, self.line));
    }

    fn error(&mut self, kind: LexErrorKind) {
        self.errors.push(LexError {
            kind,
            line: self.line,
        });
    }
}

impl<'a> Lexer<'a> {
    fn advance_char(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((_, '\n')) = next {
            self.line += 1;
        }
        next
    }

    fn advance_if(&mut self, expected: char) -> bool {
        if matches!(self.chars.peek(), Some(&(_, c)) if c == expected) {
            self.advance_char();
            true
        } else {
            false
        }
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.clone().nth(1).map(|(_, c)| c)
    }

    fn current_index(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(idx, _)| *idx)
            .unwrap_or(self.input.len())
    }
}

pub fn scan(input: &str) -> Scanned {
    Lexer::new(input).scan()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let scanned = scan(input);
        assert!(scanned.errors.is_empty(), "unexpected errors: {:?}", scanned.errors);
        scanned.tokens.into_iter().map(|token| token.kind).collect()
    }

    #[test]
    fn test_simple_program() {
        let input = indoc! {"
            fun add(a, b) {
                return a + b;
            }
            print add(1, 2) >= 3 ? \"yes\" : \"no\";
        "};
        let expected = vec![
            TokenKind::Fun,
            TokenKind::Identifier,
            TokenKind::LeftParen,
            TokenKind::Identifier,
            TokenKind::Comma,
            TokenKind::Identifier,
            TokenKind::RightParen,
            TokenKind::LeftBrace,
            TokenKind::Return,
            TokenKind::Identifier,
            TokenKind::Plus,
            TokenKind::Identifier,
            TokenKind::Semicolon,
            TokenKind::RightBrace,
            TokenKind::Print,
            TokenKind::Identifier,
            TokenKind::LeftParen,
            TokenKind::Number,
            TokenKind::Comma,
            TokenKind::Number,
            TokenKind::RightParen,
            TokenKind::GreaterEqual,
            TokenKind::Number,
            TokenKind::Question,
            TokenKind::String,
            TokenKind::Colon,
            TokenKind::String,
            TokenKind::Semicolon,
            TokenKind::Eof,
        ];
        assert_eq!(kinds(input), expected);
    }

    #[test]
    fn skips_comments_and_counts_their_lines() {
        let input = indoc! {"
            // line comment
            /* block
               comment */ var
            x;
        "};
        let scanned = scan(input);
        assert!(scanned.errors.is_empty());
        let lines = scanned
            .tokens
            .iter()
            .map(|token| (token.kind, token.line))
            .collect::<Vec<_>>();
        assert_eq!(
            lines,
            vec![
                (TokenKind::Var, 3),
                (TokenKind::Identifier, 4),
                (TokenKind::Semicolon, 4),
                (TokenKind::Eof, 5),
            ]
        );
    }

    #[test]
    fn block_comment_ends_at_first_terminator() {
        assert_eq!(
            kinds("/* a /* b */ 1 */"),
            vec![TokenKind::Number, TokenKind::Star, TokenKind::Slash, TokenKind::Eof]
        );
    }

    #[test]
    fn scans_number_literals() {
        let scanned = scan("12 3.5 7.");
        let literals = scanned
            .tokens
            .iter()
            .map(|token| token.literal.clone())
            .collect::<Vec<_>>();
        assert_eq!(
            literals,
            vec![
                Some(Literal::Number(12.0)),
                Some(Literal::Number(3.5)),
                Some(Literal::Number(7.0)),
                None,
                None,
            ]
        );
        assert_eq!(scanned.tokens[3].kind, TokenKind::Dot);
    }

    #[test]
    fn multi_line_string_keeps_starting_line() {
        let scanned = scan("\"one\ntwo\" x");
        assert_eq!(scanned.tokens[0].line, 1);
        assert_eq!(
            scanned.tokens[0].literal,
            Some(Literal::String(Rc::from("one\ntwo")))
        );
        assert_eq!(scanned.tokens[1].line, 2);
    }

    #[test]
    fn keeps_scanning_after_invalid_character() {
        let scanned = scan("var x = 1 @ 2;\n#");
        assert_eq!(
            scanned.errors,
            vec![
                LexError {
                    kind: LexErrorKind::UnexpectedCharacter { character: '@' },
                    line: 1,
                },
                LexError {
                    kind: LexErrorKind::UnexpectedCharacter { character: '#' },
                    line: 2,
                },
            ]
        );
        assert_eq!(scanned.tokens.last().map(|token| token.kind), Some(TokenKind::Eof));
        assert_eq!(scanned.tokens.len(), 7);
    }

    #[test]
    fn reports_unterminated_string_and_comment() {
        let string = scan("print \"abc");
        assert_eq!(string.errors[0].kind, LexErrorKind::UnterminatedString);
        assert_eq!(string.errors[0].to_string(), "[line 1] Error: Unterminated string.");

        let comment = scan("/* never\nclosed");
        assert_eq!(comment.errors[0].kind, LexErrorKind::UnterminatedComment);
        assert_eq!(comment.errors[0].line, 2);
    }
}
