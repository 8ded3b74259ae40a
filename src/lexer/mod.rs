mod lexer;
mod token;

pub use lexer::Lexer;
pub use token::{Position, Token, TokenKind};
pub(crate) use token::EOF;
