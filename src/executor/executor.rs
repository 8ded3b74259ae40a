use crate::ast::AstNode;
use crate::environment::Environment;
use crate::error::ShellError;

/// Exit status of the evaluated node, or the error that stopped it.
pub type ExecStatus = Result<i32, ShellError>;

pub trait Executor {
    fn exec(&mut self, node: &AstNode, env: &mut Environment) -> ExecStatus;
}
