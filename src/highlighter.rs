use std::path::Path;
use crate::environment::Environment;
use crate::error::{EvalError, ShellError};
use crate::executor::PathResolver;
use crate::io::ansi::*;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::parser::{DefaultParser, Parser};

const COLOR_ERROR: &str = "\x1b[4m\x1b[91m";
const COLOR_COMMENT: &str = "\x1b[3m\x1b[90m";
const COLOR_KEYWORD: &str = "\x1b[1m\x1b[94m";
const COLOR_OPERATOR: &str = "\x1b[1m\x1b[35m";
const COLOR_CMD: &str = "\x1b[1m\x1b[93m";
const COLOR_PATH: &str = "\x1b[4m\x1b[92m";
const COLOR_INTEGER: &str = BRIGHT_CYAN;
const COLOR_STRING: &str = BRIGHT_GREEN;
const COLOR_ESCAPE: &str = BRIGHT_MAGENTA;

/// Colored source plus the first problem found in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Highlighted {
    pub text: String,
    pub diagnostic: Option<ShellError>,
}

/// Colors a whole input buffer. Never fails: broken input still comes
/// back colored, with the problem reported as a diagnostic.
pub struct Highlighter<'a> {
    env: &'a Environment,
}

impl<'a> Highlighter<'a> {
    pub fn new(env: &'a Environment) -> Self {
        Highlighter { env }
    }

    pub fn highlight(&self, code: &str, path: &str) -> Highlighted {
        let tokens: Vec<Token> = Lexer::new(code, path).collect();

        let mut text = String::with_capacity(code.len() * 2);
        let mut first: Option<ShellError> = None;
        let mut prev_end = 0;

        for (i, tok) in tokens.iter().enumerate() {
            let (start, end) = tok.span;
            if start > prev_end {
                text.push_str(&color_gap(&code[prev_end..start]));
            }

            if tok.kind != TokenKind::Eof {
                let (color, problem) = self.classify(&tokens, i);
                if first.is_none() {
                    first = problem;
                }
                text.push_str(color);
                if color.is_empty() && tok.is_name() {
                    text.push_str(&color_quotes(tok.text(code)));
                } else {
                    text.push_str(tok.text(code));
                }
            }
            text.push_str(RESET);
            prev_end = end.max(prev_end);
        }
        if prev_end < code.len() {
            text.push_str(&color_gap(&code[prev_end..]));
        }
        text.push_str(RESET);

        // A parse error can sit before the first token-level problem
        let parsed = DefaultParser::new(&tokens).parse().err();
        let diagnostic = match (first, parsed) {
            (Some(a), Some(b)) => Some(if (b.pos.row, b.pos.col) < (a.pos.row, a.pos.col) { b } else { a }),
            (a, b) => a.or(b),
        };

        Highlighted { text, diagnostic }
    }

    fn classify(&self, tokens: &[Token], i: usize) -> (&'static str, Option<ShellError>) {
        let tok = &tokens[i];
        match &tok.kind {
            TokenKind::Error(err) => (COLOR_ERROR, Some(ShellError::new(tok.pos.clone(), err.clone()))),
            TokenKind::Integer => (COLOR_INTEGER, None),
            kind if kind.is_keyword() => (COLOR_KEYWORD, None),
            kind if kind.is_operator() => (COLOR_OPERATOR, None),
            _ if tok.is_name() && is_command_position(tokens, i) => {
                if PathResolver.exists(&tok.lexeme, self.env.get("PATH")) {
                    (COLOR_CMD, None)
                } else {
                    let err = ShellError::new(tok.pos.clone(), EvalError::CmdNotFound(tok.lexeme.clone()));
                    (COLOR_ERROR, Some(err))
                }
            }
            _ if tok.is_name() && !tok.lexeme.is_empty() && Path::new(&tok.lexeme).exists() => {
                (COLOR_PATH, None)
            }
            _ => ("", None),
        }
    }
}

/// Would the parser read this token as a command name?
fn is_command_position(tokens: &[Token], i: usize) -> bool {
    let after_boundary = match i.checked_sub(1).map(|p| &tokens[p].kind) {
        None => true,
        Some(kind) => matches!(
            kind,
            TokenKind::Separator | TokenKind::And | TokenKind::Or | TokenKind::LParen
        ),
    };
    let assigned = tokens.get(i + 1).is_some_and(|t| t.kind == TokenKind::Equals);
    after_boundary && !assigned
}

/// Text between tokens is blanks and comments.
fn color_gap(gap: &str) -> String {
    match gap.find('#') {
        Some(idx) => format!("{}{}{}{}", &gap[..idx], COLOR_COMMENT, &gap[idx..], RESET),
        None => gap.to_string(),
    }
}

/// Color the quoted parts of a word and the escapes inside them.
fn color_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    let mut quote: Option<char> = None;
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (None, '\'' | '"' | '`') => {
                quote = Some(ch);
                out.push_str(COLOR_STRING);
                out.push(ch);
            }
            (Some(q), _) if q == ch => {
                quote = None;
                out.push(ch);
                out.push_str(RESET);
            }
            (Some('"' | '`'), '\\') => {
                out.push_str(COLOR_ESCAPE);
                out.push(ch);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
                out.push_str(RESET);
                out.push_str(COLOR_STRING);
            }
            _ => out.push(ch),
        }
    }
    if quote.is_some() {
        out.push_str(RESET);
    }
    out
}
