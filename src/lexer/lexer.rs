use std::iter::Peekable;
use std::str::CharIndices;
use super::token::{Position, Token, TokenKind};
use crate::error::{LexError, ShellError};

fn is_blank(ch: char) -> bool {
    matches!(ch, ' ' | '\r' | '\t' | '\x0b' | '\x0c')
}

/// Characters that end an unquoted word.
fn is_delimiter(ch: char) -> bool {
    is_blank(ch) || matches!(ch, '\n' | ';' | '&' | '|' | '(' | ')')
}

fn unescape(ch: char) -> Option<char> {
    match ch {
        'e' => Some('\x1b'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        'v' => Some('\x0b'),
        'b' => Some('\x08'),
        'f' => Some('\x0c'),
        _ => None,
    }
}

/// Turns a source string into tokens, one at a time.
///
/// Error tokens do not stop the lexer: the next call resumes after the
/// offending text, so highlighting can keep going. The stream ends with a
/// single `Eof` token.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    current: Option<char>,
    offset: usize, // Byte offset of `current`
    pos: Position,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, path: &str) -> Self {
        let mut lexer = Lexer {
            source,
            chars: source.char_indices().peekable(),
            current: None,
            offset: 0,
            pos: Position::new(path, 1, 0),
            finished: false,
        };
        lexer.advance();
        lexer
    }

    /// Lex the whole source, failing on the first error token.
    pub fn tokenize(self) -> Result<Vec<Token>, ShellError> {
        let mut tokens = Vec::new();
        for token in self {
            if let TokenKind::Error(err) = &token.kind {
                return Err(ShellError::new(token.pos.clone(), err.clone()));
            }
            tokens.push(token);
        }
        Ok(tokens)
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            let Some(ch) = self.current else {
                return Token {
                    kind: TokenKind::Eof,
                    lexeme: String::new(),
                    span: (self.source.len(), self.source.len()),
                    pos: self.pos.clone(),
                };
            };

            match ch {
                '\n' | ';' => return self.single(TokenKind::Separator, false),
                '(' => return self.single(TokenKind::LParen, true),
                ')' => return self.single(TokenKind::RParen, true),
                '&' | '|' => return self.lex_logical(ch),
                '#' => self.skip_comment(),
                c if is_blank(c) => self.advance(),
                c if c.is_ascii_digit() => return self.lex_integer(),
                _ => return self.lex_string(),
            }
        }
    }

    fn advance(&mut self) {
        match self.chars.next() {
            Some((idx, ch)) => {
                self.offset = idx;
                self.current = Some(ch);
            }
            None => {
                self.offset = self.source.len();
                self.current = None;
            }
        }

        if self.current == Some('\n') {
            self.pos.col = 0;
            self.pos.row += 1;
        } else {
            self.pos.col += 1;
        }
    }

    fn single(&mut self, kind: TokenKind, keep_text: bool) -> Token {
        let start = self.offset;
        let pos = self.pos.clone();
        self.advance();
        let lexeme = if keep_text {
            self.source[start..self.offset].to_string()
        } else {
            String::new()
        };
        Token {
            kind,
            lexeme,
            span: (start, self.offset),
            pos,
        }
    }

    fn skip_comment(&mut self) {
        while let Some(ch) = self.current {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn lex_logical(&mut self, ch: char) -> Token {
        let start = self.offset;
        let pos = self.pos.clone();
        self.advance();

        let kind = if self.current == Some(ch) {
            self.advance();
            if ch == '&' { TokenKind::And } else { TokenKind::Or }
        } else {
            TokenKind::Error(LexError::LoneOperator(ch))
        };

        Token {
            kind,
            lexeme: self.source[start..self.offset].to_string(),
            span: (start, self.offset),
            pos,
        }
    }

    fn lex_integer(&mut self) -> Token {
        let start = self.offset;
        let pos = self.pos.clone();
        let mut error = None;

        // Consume the whole word even after a bad character, so lexing resumes
        // at the next delimiter
        while let Some(ch) = self.current {
            if is_delimiter(ch) {
                break;
            }
            if !ch.is_ascii_digit() && error.is_none() {
                error = Some(LexError::UnexpectedCharInNumber(ch));
            }
            self.advance();
        }

        let lexeme = self.source[start..self.offset].to_string();
        Token {
            kind: error.map_or(TokenKind::Integer, TokenKind::Error),
            lexeme,
            span: (start, self.offset),
            pos,
        }
    }

    fn lex_string(&mut self) -> Token {
        let start = self.offset;
        let pos = self.pos.clone();

        let mut data = String::new();
        let mut quote: Option<char> = None;
        let mut quoted = false;
        let mut escape = false;
        let mut bare = true; // Only alphabetic characters so far
        let mut error = None;

        loop {
            let Some(ch) = self.current else {
                if quote.is_some() {
                    error.get_or_insert(LexError::UnterminatedString);
                }
                break;
            };

            if quote.is_none() && is_delimiter(ch) {
                break;
            }
            if ch == '\n' && quote != Some('`') {
                // Leave the newline for the separator
                error.get_or_insert(LexError::StringExceedsLine);
                break;
            }

            bare = bare && ch.is_ascii_alphabetic();

            match ch {
                '\'' | '"' | '`' => {
                    if escape {
                        data.push(ch);
                        escape = false;
                    } else if quote == Some(ch) {
                        quote = None;
                    } else if quote.is_none() {
                        quote = Some(ch);
                        quoted = true;
                    } else {
                        data.push(ch);
                    }
                }
                '\\' => {
                    if !matches!(quote, Some('"') | Some('`')) {
                        data.push(ch);
                    } else if escape {
                        data.push(ch);
                        escape = false;
                    } else {
                        escape = true;
                    }
                }
                _ if escape => {
                    match unescape(ch) {
                        Some(unescaped) => data.push(unescaped),
                        None => {
                            error.get_or_insert(LexError::UnknownEscape(ch));
                        }
                    }
                    escape = false;
                }
                _ => data.push(ch),
            }

            self.advance();
        }

        let kind = if let Some(err) = error {
            TokenKind::Error(err)
        } else if bare {
            TokenKind::keyword(&data).unwrap_or(TokenKind::BareWord)
        } else if !quoted && data == "=" {
            TokenKind::Equals
        } else {
            TokenKind::Word
        };

        Token {
            kind,
            lexeme: data,
            span: (start, self.offset),
            pos,
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.finished = true;
        }
        Some(token)
    }
}
