pub mod ast;
pub mod builtins;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod resolver;
pub mod runtime;
pub mod session;
pub mod token;

pub use error::LoxError;
pub use session::{Session, SessionOptions};
