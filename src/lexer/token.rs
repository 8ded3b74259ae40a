use std::fmt;
use crate::error::{quote, LexError};

/// Where a token starts: script path plus 1-based row and column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Position {
    pub path: String,
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(path: &str, row: usize, col: usize) -> Self {
        Position {
            path: path.to_string(),
            row,
            col,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path, self.row, self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Eof,
    Separator,     // ; or newline
    Integer,
    Word,          // Quoted or mixed string
    BareWord,      // Unquoted, alphabetic only
    Help, Exit, Echo, Cd, Let, Export, // Keywords
    And,           // &&
    Or,            // ||
    Equals,        // =
    LParen,        // (
    RParen,        // )
    Error(LexError),
}

impl TokenKind {
    pub fn keyword(word: &str) -> Option<TokenKind> {
        match word {
            "help" => Some(TokenKind::Help),
            "exit" => Some(TokenKind::Exit),
            "echo" => Some(TokenKind::Echo),
            "cd" => Some(TokenKind::Cd),
            "let" => Some(TokenKind::Let),
            "export" => Some(TokenKind::Export),
            _ => None,
        }
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Help
                | TokenKind::Exit
                | TokenKind::Echo
                | TokenKind::Cd
                | TokenKind::Let
                | TokenKind::Export
        )
    }

    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::And | TokenKind::Or | TokenKind::Equals | TokenKind::LParen | TokenKind::RParen
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Eof => write!(f, "end of file"),
            TokenKind::Separator => write!(f, "separator"),
            TokenKind::Integer => write!(f, "integer"),
            TokenKind::Word => write!(f, "string"),
            TokenKind::BareWord => write!(f, "word"),
            TokenKind::Help => write!(f, "keyword help"),
            TokenKind::Exit => write!(f, "keyword exit"),
            TokenKind::Echo => write!(f, "keyword echo"),
            TokenKind::Cd => write!(f, "keyword cd"),
            TokenKind::Let => write!(f, "keyword let"),
            TokenKind::Export => write!(f, "keyword export"),
            TokenKind::And => write!(f, "&&"),
            TokenKind::Or => write!(f, "||"),
            TokenKind::Equals => write!(f, "="),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Error(_) => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,       // Unquoted, unescaped data
    pub span: (usize, usize), // Byte range in the source [start, end)
    pub pos: Position,
}

pub(crate) static EOF: Token = Token {
    kind: TokenKind::Eof,
    lexeme: String::new(),
    span: (0, 0),
    pos: Position {
        path: String::new(),
        row: 0,
        col: 0,
    },
};

impl Token {
    /// Length of the token as written in the source.
    pub fn len(&self) -> usize {
        self.span.1 - self.span.0
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw source text of the token.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.span.0..self.span.1]
    }

    pub fn is_statement_end(&self) -> bool {
        matches!(self.kind, TokenKind::Separator | TokenKind::Eof)
    }

    /// Tokens that close an argument list.
    pub fn is_args_end(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Separator | TokenKind::Eof | TokenKind::And | TokenKind::Or | TokenKind::RParen
        )
    }

    pub fn is_name(&self) -> bool {
        matches!(self.kind, TokenKind::Word | TokenKind::BareWord)
    }

    pub fn is_arg(&self) -> bool {
        self.is_name() || self.kind == TokenKind::Integer || self.kind.is_keyword()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Word | TokenKind::BareWord | TokenKind::Integer => {
                write!(f, "{} {}", self.kind, quote(&self.lexeme))
            }
            TokenKind::And | TokenKind::Or | TokenKind::Equals | TokenKind::LParen | TokenKind::RParen => {
                write!(f, "{}", quote(&self.kind.to_string()))
            }
            _ => write!(f, "{}", self.kind),
        }
    }
}
