use crate::lexer::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// A parsed statement. Every node keeps the token it started at, for
/// diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    Statements(Vec<AstNode>),
    Cmd {
        token: Token,
        name: String,
        args: Vec<String>,
    },
    Exit {
        token: Token,
        code: Option<i32>,
    },
    Echo {
        token: Token,
        message: String,
    },
    Cd {
        token: Token,
        path: String,
    },
    Help {
        token: Token,
    },
    Let {
        token: Token,
        name: String,
        value: String,
    },
    Assign {
        token: Token,
        name: String,
        value: String,
    },
    Export {
        token: Token,
        name: String,
    },
    BinOp {
        token: Token,
        op: LogicalOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
}

impl AstNode {
    /// The originating token; a statement list reports its first statement's.
    pub fn token(&self) -> Option<&Token> {
        match self {
            AstNode::Statements(list) => list.first().and_then(AstNode::token),
            AstNode::Cmd { token, .. }
            | AstNode::Exit { token, .. }
            | AstNode::Echo { token, .. }
            | AstNode::Cd { token, .. }
            | AstNode::Help { token }
            | AstNode::Let { token, .. }
            | AstNode::Assign { token, .. }
            | AstNode::Export { token, .. }
            | AstNode::BinOp { token, .. } => Some(token),
        }
    }
}
