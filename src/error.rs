use std::fmt;
use thiserror::Error;
use crate::io::ansi;
use crate::lexer::{Position, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("String not terminated")]
    UnterminatedString,
    #[error("String exceeds line")]
    StringExceedsLine,
    #[error("Unknown escape sequence '\\{0}'")]
    UnknownEscape(char),
    #[error("Unexpected character '{0}' in number")]
    UnexpectedCharInNumber(char),
    #[error("Unexpected character '{0}', did you mean \"{0}{0}\"?")]
    LoneOperator(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unexpected {found}")]
    UnexpectedToken { found: String },
    #[error("Expected type \"{wanted}\", got {found}")]
    ExpectedToken { wanted: TokenKind, found: String },
    #[error("Exit code {} is out of range", quote(.0))]
    ExitCodeRange(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("Command {} not found", quote(.0))]
    CmdNotFound(String),
    #[error("File/directory {} not found", quote(.0))]
    FileNotFound(String),
    #[error("Cannot expand \"~\" in {}, $HOME is not set", quote(.0))]
    HomeNotSet(String),
    #[error("Variable {} not found", quote(.0))]
    VarNotFound(String),
    #[error("Unexpected character '{ch}' at {index} in variable identifier")]
    InvalidIdentifier { ch: char, index: usize },
    #[error("Variable identifier cannot be empty")]
    EmptyIdentifier,
    #[error("Could not run {}: {reason}", quote(.cmd))]
    Spawn { cmd: String, reason: String },
    #[error("Could not write output: {0}")]
    Output(String),
}

impl EvalError {
    pub fn exit_status(&self) -> i32 {
        match self {
            EvalError::CmdNotFound(_) => 127,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Any lexing, parsing or evaluation failure, tied to the source position it
/// came from. Renders as `path:row:col: message`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{pos}: {kind}")]
pub struct ShellError {
    pub pos: Position,
    pub kind: ErrorKind,
}

impl ShellError {
    pub fn new(pos: Position, kind: impl Into<ErrorKind>) -> Self {
        ShellError {
            pos,
            kind: kind.into(),
        }
    }

    /// Session exit status left behind by this error.
    pub fn exit_status(&self) -> i32 {
        match &self.kind {
            ErrorKind::Eval(err) => err.exit_status(),
            _ => 1,
        }
    }
}

/// Escape control characters and wrap in double quotes.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\x1b' => out.push_str("\\e"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0b' => out.push_str("\\v"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            '"' => out.push_str("\\\""),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Print a user-facing diagnostic to stderr.
pub fn report_error(err: &dyn fmt::Display) {
    eprintln!(
        "{}{}Error:{} {}",
        ansi::BOLD,
        ansi::BRIGHT_RED,
        ansi::RESET,
        err
    );
}
