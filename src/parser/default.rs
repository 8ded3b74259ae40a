use crate::ast::{AstNode, LogicalOp};
use crate::error::{ParseError, ShellError};
use crate::lexer::{Token, TokenKind, EOF};
use crate::parser::{expected, unexpected, Parser};

/// Recursive descent parser over a lexed token slice.
///
/// ```text
/// statement := factor (("&&" | "||") factor)*
/// factor    := let | export | assign | help | exit | echo | cd | cmd | "(" statement ")"
/// ```
pub struct DefaultParser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> DefaultParser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn current(&self) -> &'a Token {
        self.tokens.get(self.pos).unwrap_or(&EOF)
    }

    fn peek(&self) -> &'a Token {
        let current = self.current();
        if current.kind == TokenKind::Eof {
            return current;
        }
        self.tokens.get(self.pos + 1).unwrap_or(&EOF)
    }

    // Never moves past the end of the slice
    fn next(&mut self) -> &'a Token {
        let tok = self.current();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect_args_end(&self) -> Result<(), ShellError> {
        if self.current().is_args_end() {
            Ok(())
        } else {
            Err(expected(self.current(), TokenKind::Separator))
        }
    }
}

// Top-down recursive descent parser
impl Parser for DefaultParser<'_> {
    fn parse(&mut self) -> Result<AstNode, ShellError> {
        let mut list = Vec::new();
        loop {
            match self.current().kind {
                TokenKind::Eof => break,
                TokenKind::Separator => {
                    self.next();
                    continue;
                }
                _ => {}
            }

            let statement = self.parse_statement()?;
            if !self.current().is_statement_end() {
                return Err(expected(self.current(), TokenKind::Separator));
            }
            list.push(statement);
        }
        Ok(AstNode::Statements(list))
    }
}

impl<'a> DefaultParser<'a> {
    fn parse_statement(&mut self) -> Result<AstNode, ShellError> {
        self.parse_logical()
    }

    // Flat, equal precedence, folded to the left
    fn parse_logical(&mut self) -> Result<AstNode, ShellError> {
        let mut node = self.parse_factor()?;
        loop {
            let op = match self.current().kind {
                TokenKind::And => LogicalOp::And,
                TokenKind::Or => LogicalOp::Or,
                _ => break,
            };
            let token = self.next().clone();
            let right = self.parse_factor()?;
            node = AstNode::BinOp {
                token,
                op,
                left: Box::new(node),
                right: Box::new(right),
            };
        }
        Ok(node)
    }

    fn parse_factor(&mut self) -> Result<AstNode, ShellError> {
        let tok = self.current();
        match tok.kind {
            TokenKind::Word | TokenKind::BareWord => {
                if self.peek().kind == TokenKind::Equals {
                    self.parse_assign()
                } else {
                    self.parse_cmd()
                }
            }
            TokenKind::Let => self.parse_let(),
            TokenKind::Export => self.parse_export(),
            TokenKind::Help => self.parse_help(),
            TokenKind::Exit => self.parse_exit(),
            TokenKind::Echo => self.parse_echo(),
            TokenKind::Cd => self.parse_cd(),
            TokenKind::LParen => {
                self.next();
                let node = self.parse_statement()?;
                if self.current().kind != TokenKind::RParen {
                    return Err(expected(self.current(), TokenKind::RParen));
                }
                self.next();
                Ok(node)
            }
            _ => Err(unexpected(tok)),
        }
    }

    fn expect_name(&mut self) -> Result<String, ShellError> {
        let tok = self.next();
        if tok.is_name() {
            Ok(tok.lexeme.clone())
        } else {
            Err(expected(tok, TokenKind::Word))
        }
    }

    fn expect_value(&mut self) -> Result<String, ShellError> {
        let tok = self.next();
        if tok.is_arg() {
            Ok(tok.lexeme.clone())
        } else {
            Err(expected(tok, TokenKind::Word))
        }
    }

    fn expect_equals(&mut self) -> Result<(), ShellError> {
        let tok = self.next();
        if tok.kind == TokenKind::Equals {
            Ok(())
        } else {
            Err(expected(tok, TokenKind::Equals))
        }
    }

    fn parse_args(&mut self) -> Result<Vec<String>, ShellError> {
        let mut args = Vec::new();
        while !self.current().is_args_end() {
            let tok = self.next();
            if !tok.is_arg() {
                return Err(unexpected(tok));
            }
            args.push(tok.lexeme.clone());
        }
        Ok(args)
    }

    fn parse_cmd(&mut self) -> Result<AstNode, ShellError> {
        let token = self.next().clone();
        let args = self.parse_args()?;
        Ok(AstNode::Cmd {
            name: token.lexeme.clone(),
            token,
            args,
        })
    }

    fn parse_assign(&mut self) -> Result<AstNode, ShellError> {
        let token = self.next().clone();
        self.expect_equals()?;
        let value = self.expect_value()?;
        self.expect_args_end()?;
        Ok(AstNode::Assign {
            name: token.lexeme.clone(),
            token,
            value,
        })
    }

    fn parse_let(&mut self) -> Result<AstNode, ShellError> {
        let token = self.next().clone();
        let name = self.expect_name()?;
        self.expect_equals()?;
        let value = self.expect_value()?;
        self.expect_args_end()?;
        Ok(AstNode::Let { token, name, value })
    }

    fn parse_export(&mut self) -> Result<AstNode, ShellError> {
        let token = self.next().clone();
        let name = self.expect_name()?;
        self.expect_args_end()?;
        Ok(AstNode::Export { token, name })
    }

    fn parse_help(&mut self) -> Result<AstNode, ShellError> {
        let token = self.next().clone();
        self.expect_args_end()?;
        Ok(AstNode::Help { token })
    }

    fn parse_exit(&mut self) -> Result<AstNode, ShellError> {
        let token = self.next().clone();

        // Without an operand, exit with the last status
        let code = if self.current().is_args_end() {
            None
        } else if self.current().kind == TokenKind::Integer {
            let tok = self.next();
            let code = tok.lexeme.parse::<i32>().map_err(|_| {
                ShellError::new(tok.pos.clone(), ParseError::ExitCodeRange(tok.lexeme.clone()))
            })?;
            Some(code)
        } else {
            return Err(expected(self.current(), TokenKind::Integer));
        };

        self.expect_args_end()?;
        Ok(AstNode::Exit { token, code })
    }

    fn parse_echo(&mut self) -> Result<AstNode, ShellError> {
        let token = self.next().clone();
        let message = self
            .parse_args()?
            .into_iter()
            .map(|arg| arg + " ")
            .collect();
        Ok(AstNode::Echo { token, message })
    }

    fn parse_cd(&mut self) -> Result<AstNode, ShellError> {
        let token = self.next().clone();

        let path = if self.current().is_args_end() {
            "~/".to_string()
        } else if self.current().is_arg() {
            self.next().lexeme.clone()
        } else {
            return Err(expected(self.current(), TokenKind::Word));
        };

        self.expect_args_end()?;
        Ok(AstNode::Cd { token, path })
    }
}
