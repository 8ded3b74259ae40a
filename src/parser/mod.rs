pub mod default;

use crate::ast::AstNode;
use crate::error::{ParseError, ShellError};
use crate::lexer::{Lexer, Token, TokenKind};

pub use default::DefaultParser;

pub trait Parser {
    fn parse(&mut self) -> Result<AstNode, ShellError>;
}

/// Lex and parse a whole source string. The first lexical error aborts.
pub fn parse_source(source: &str, path: &str) -> Result<AstNode, ShellError> {
    let tokens = Lexer::new(source, path).tokenize()?;
    DefaultParser::new(&tokens).parse()
}

pub(crate) fn unexpected(token: &Token) -> ShellError {
    if let TokenKind::Error(err) = &token.kind {
        return ShellError::new(token.pos.clone(), err.clone());
    }
    ShellError::new(
        token.pos.clone(),
        ParseError::UnexpectedToken {
            found: token.to_string(),
        },
    )
}

pub(crate) fn expected(token: &Token, wanted: TokenKind) -> ShellError {
    if let TokenKind::Error(err) = &token.kind {
        return ShellError::new(token.pos.clone(), err.clone());
    }
    ShellError::new(
        token.pos.clone(),
        ParseError::ExpectedToken {
            wanted,
            found: token.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::LogicalOp;
    use crate::error::ErrorKind;

    fn parse(src: &str) -> Vec<AstNode> {
        match parse_source(src, "test").unwrap() {
            AstNode::Statements(list) => list,
            other => panic!("expected statements, got {:?}", other),
        }
    }

    fn parse_err(src: &str) -> ShellError {
        parse_source(src, "test").unwrap_err()
    }

    /// Strip tokens so trees can be compared structurally.
    fn shape(node: &AstNode) -> String {
        match node {
            AstNode::Statements(list) => {
                let parts: Vec<_> = list.iter().map(shape).collect();
                format!("[{}]", parts.join("; "))
            }
            AstNode::Cmd { name, args, .. } => format!("cmd({} {:?})", name, args),
            AstNode::Exit { code, .. } => format!("exit({:?})", code),
            AstNode::Echo { message, .. } => format!("echo({:?})", message),
            AstNode::Cd { path, .. } => format!("cd({})", path),
            AstNode::Help { .. } => "help".to_string(),
            AstNode::Let { name, value, .. } => format!("let({}={})", name, value),
            AstNode::Assign { name, value, .. } => format!("assign({}={})", name, value),
            AstNode::Export { name, .. } => format!("export({})", name),
            AstNode::BinOp { op, left, right, .. } => {
                let op = match op {
                    LogicalOp::And => "And",
                    LogicalOp::Or => "Or",
                };
                format!("{}({}, {})", op, shape(left), shape(right))
            }
        }
    }

    fn parse_shape(src: &str) -> String {
        shape(&parse_source(src, "test").unwrap())
    }

    #[test]
    fn test_simple_command() {
        let list = parse("grep -n foo 42");
        assert_eq!(list.len(), 1);
        match &list[0] {
            AstNode::Cmd { name, args, token } => {
                assert_eq!(name, "grep");
                assert_eq!(args, &vec!["-n".to_string(), "foo".to_string(), "42".to_string()]);
                assert_eq!(token.pos.col, 1);
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_statement_list() {
        assert_eq!(
            parse_shape("ls; help\n\n;echo a b"),
            "[cmd(ls []); help; echo(\"a b \")]"
        );
        assert_eq!(parse_shape(""), "[]");
        assert_eq!(parse_shape(";;\n"), "[]");
    }

    #[test]
    fn test_logical_ops_fold_left() {
        assert_eq!(
            parse_shape("a && b || c"),
            "[Or(And(cmd(a []), cmd(b [])), cmd(c []))]"
        );
        assert_eq!(
            parse_shape("a || b && c"),
            "[And(Or(cmd(a []), cmd(b [])), cmd(c []))]"
        );
    }

    #[test]
    fn test_parenthesized_group() {
        assert_eq!(
            parse_shape("a && (b || c)"),
            "[And(cmd(a []), Or(cmd(b []), cmd(c [])))]"
        );
    }

    #[test]
    fn test_missing_rparen() {
        let err = parse_err("(a && b");
        assert!(matches!(
            err.kind,
            ErrorKind::Parse(ParseError::ExpectedToken { wanted: TokenKind::RParen, .. })
        ));
    }

    #[test]
    fn test_builtins() {
        assert_eq!(parse_shape("exit"), "[exit(None)]");
        assert_eq!(parse_shape("exit 7"), "[exit(Some(7))]");
        assert_eq!(parse_shape("cd"), "[cd(~/)]");
        assert_eq!(parse_shape("cd /tmp"), "[cd(/tmp)]");
        assert_eq!(parse_shape("echo"), "[echo(\"\")]");
        assert_eq!(parse_shape("echo exit 1"), "[echo(\"exit 1 \")]");
        assert_eq!(parse_shape("let X = 1"), "[let(X=1)]");
        assert_eq!(parse_shape("X = two"), "[assign(X=two)]");
        assert_eq!(parse_shape("export X"), "[export(X)]");
    }

    #[test]
    fn test_builtins_inside_logical_chain() {
        assert_eq!(
            parse_shape("false || exit 3 && echo x"),
            "[And(Or(cmd(false []), exit(Some(3))), echo(\"x \"))]"
        );
    }

    #[test]
    fn test_exit_requires_integer() {
        let err = parse_err("exit now");
        assert!(matches!(
            err.kind,
            ErrorKind::Parse(ParseError::ExpectedToken { wanted: TokenKind::Integer, .. })
        ));
        let err = parse_err("exit 99999999999");
        assert!(matches!(err.kind, ErrorKind::Parse(ParseError::ExitCodeRange(_))));
    }

    #[test]
    fn test_let_requires_equals() {
        let err = parse_err("let X 1");
        assert_eq!(
            err.to_string(),
            "test:1:7: Expected type \"=\", got integer \"1\""
        );
    }

    #[test]
    fn test_help_takes_no_arguments() {
        let err = parse_err("help me");
        assert!(matches!(
            err.kind,
            ErrorKind::Parse(ParseError::ExpectedToken { wanted: TokenKind::Separator, .. })
        ));
    }

    #[test]
    fn test_unexpected_token() {
        let err = parse_err("&& ls");
        assert_eq!(err.to_string(), "test:1:1: Unexpected \"&&\"");
        let err = parse_err("ls )");
        assert!(matches!(err.kind, ErrorKind::Parse(ParseError::ExpectedToken { .. })));
        let err = parse_err("ls a =");
        assert!(matches!(err.kind, ErrorKind::Parse(ParseError::UnexpectedToken { .. })));
    }

    #[test]
    fn test_assign_without_value() {
        // `WORD =` starts an assignment, so the value is what is missing
        let err = parse_err("ls =");
        assert!(matches!(
            err.kind,
            ErrorKind::Parse(ParseError::ExpectedToken { wanted: TokenKind::Word, .. })
        ));
    }

    #[test]
    fn test_lex_error_aborts_parse() {
        let err = parse_err("echo ok; echo 'oops");
        assert!(matches!(err.kind, ErrorKind::Lex(_)));
    }

    #[test]
    fn test_parser_reports_error_tokens() {
        let tokens: Vec<_> = Lexer::new("ls & x", "test").collect();
        let err = DefaultParser::new(&tokens).parse().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Lex(_)));
    }
}
