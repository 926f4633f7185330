use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Single-character tokens
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,
    Question,
    Colon,

    // One or two character tokens
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // Literals
    Identifier,
    String,
    Number,

    // Keywords
    And,
    Break,
    Class,
    Else,
    False,
    For,
    Fun,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,

    Eof,
}

impl TokenKind {
    /// Reclassifies an identifier lexeme as a reserved word.
    pub fn keyword(ident: &str) -> Option<Self> {
        let kind = match ident {
            "and" => Self::And,
            "break" => Self::Break,
            "class" => Self::Class,
            "else" => Self::Else,
            "false" => Self::False,
            "for" => Self::For,
            "fun" => Self::Fun,
            "if" => Self::If,
            "nil" => Self::Nil,
            "or" => Self::Or,
            "print" => Self::Print,
            "return" => Self::Return,
            "super" => Self::Super,
            "this" => Self::This,
            "true" => Self::True,
            "var" => Self::Var,
            "while" => Self::While,
            _ => return None,
        };
        Some(kind)
    }

    /// Tokens that can begin a declaration or statement; the parser resumes here after an error.
    pub fn starts_statement(self) -> bool {
        matches!(
            self,
            Self::Class
                | Self::Fun
                | Self::Var
                | Self::For
                | Self::If
                | Self::While
                | Self::Print
                | Self::Break
                | Self::Return
        )
    }
}

/// Literal payload carried by number and string tokens and by literal expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Nil,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Nil => write!(f, "nil"),
            Literal::Bool(value) => write!(f, "{value}"),
            Literal::Number(value) => write!(f, "{value}"),
            Literal::String(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub literal: Option<Literal>,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            literal: None,
            line,
        }
    }

    pub fn with_literal(mut self, literal: Literal) -> Self {
        self.literal = Some(literal);
        self
    }

    /// A token that never came from source text, used to name natives and synthetic scopes.
    pub fn synthetic(lexeme: &str) -> Self {
        Self::new(TokenKind::Identifier, lexeme, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_case_sensitive() {
        assert_eq!(TokenKind::keyword("class"), Some(TokenKind::Class));
        assert_eq!(TokenKind::keyword("break"), Some(TokenKind::Break));
        assert_eq!(TokenKind::keyword("Class"), None);
        assert_eq!(TokenKind::keyword("classy"), None);
    }

    #[test]
    fn literal_display_drops_integral_fraction() {
        assert_eq!(Literal::Number(3.0).to_string(), "3");
        assert_eq!(Literal::Number(2.5).to_string(), "2.5");
        assert_eq!(Literal::Nil.to_string(), "nil");
    }
}
