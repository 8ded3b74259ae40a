mod executor;
mod default_executor;
mod path_resolver;

pub use executor::{Executor, ExecStatus};
pub use default_executor::DefaultExecutor;
pub use path_resolver::PathResolver;

use crate::environment::Environment;
use crate::parser::parse_source;

/// Lex, parse and run `source`. Nothing runs if lexing or parsing fails;
/// the session status is set to 1 in that case.
pub fn evaluate<E: Executor>(
    executor: &mut E,
    env: &mut Environment,
    source: &str,
    path: &str,
) -> ExecStatus {
    let ast = match parse_source(source, path) {
        Ok(ast) => ast,
        Err(e) => {
            env.last_status = 1;
            return Err(e);
        }
    };
    executor.exec(&ast, env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstNode, LogicalOp};

    struct TestExecutor {
        pub log: Vec<String>,
    }

    impl Executor for TestExecutor {
        fn exec(&mut self, node: &AstNode, env: &mut Environment) -> ExecStatus {
            match node {
                AstNode::Statements(list) => {
                    self.log.push("statements".to_string());
                    let mut status = 0;
                    for node in list {
                        status = self.exec(node, env)?;
                    }
                    Ok(status)
                }
                AstNode::Cmd { name, args, .. } => {
                    self.log.push(format!("command: {} {:?}", name, args));
                    Ok(if name == "false" { 1 } else { 0 })
                }
                AstNode::BinOp { op, left, right, .. } => {
                    self.log.push(format!("{:?}", op));
                    let status = self.exec(left, env)?;
                    match op {
                        LogicalOp::And if status == 0 => self.exec(right, env),
                        LogicalOp::Or if status != 0 => self.exec(right, env),
                        _ => Ok(status),
                    }
                }
                other => {
                    self.log.push(format!("builtin: {:?}", other.token().map(|t| &t.kind)));
                    Ok(0)
                }
            }
        }
    }

    impl TestExecutor {
        fn new() -> Self {
            Self { log: vec![] }
        }
    }

    #[test]
    fn test_evaluate_runs_parsed_tree() {
        let mut env = Environment::empty();
        let mut exec = TestExecutor::new();
        let result = evaluate(&mut exec, &mut env, "ls -l; false || echo x", "test");
        assert!(matches!(result, Ok(0)));
        assert_eq!(
            exec.log,
            vec![
                "statements",
                "command: ls [\"-l\"]",
                "Or",
                "command: false []",
                "builtin: Some(Echo)",
            ]
        );
    }

    #[test]
    fn test_parse_error_runs_nothing() {
        let mut env = Environment::empty();
        let mut exec = TestExecutor::new();
        let result = evaluate(&mut exec, &mut env, "ls; echo 'open", "test");
        assert!(result.is_err());
        assert!(exec.log.is_empty());
        assert_eq!(env.last_status, 1);
    }
}
