use std::io::{self, Write};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Command, ExitStatus};
use crate::ast::{AstNode, LogicalOp};
use crate::environment::Environment;
use crate::error::{EvalError, ShellError};
use crate::executor::{ExecStatus, Executor};
use crate::io::ansi;
use crate::lexer::Token;
use super::path_resolver::PathResolver;

/// Runs builtins in-process and everything else as a child process.
/// Builtin output (`echo`, `help`) goes to `out`; children inherit the
/// process stdio.
pub struct DefaultExecutor<W: Write> {
    out: W,
}

impl DefaultExecutor<io::Stdout> {
    pub fn stdout() -> Self {
        DefaultExecutor { out: io::stdout() }
    }
}

impl<W: Write> DefaultExecutor<W> {
    pub fn new(out: W) -> Self {
        DefaultExecutor { out }
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }
}

impl<W: Write> Executor for DefaultExecutor<W> {
    fn exec(&mut self, node: &AstNode, env: &mut Environment) -> ExecStatus {
        let result = match node {
            // Each statement records its own status
            AstNode::Statements(list) => return self.exec_statements(list, env),
            AstNode::BinOp { op, left, right, .. } => self.exec_logical(*op, left, right, env),
            AstNode::Cmd { token, name, args } => self.exec_command(token, name, args, env),
            AstNode::Exit { code, .. } => Ok(self.exec_exit(*code, env)),
            AstNode::Echo { token, message } => self.exec_echo(token, message),
            AstNode::Cd { token, path } => self.exec_cd(token, path, env),
            AstNode::Help { token } => self.exec_help(token),
            AstNode::Let { token, name, value } => self.exec_let(token, name, value, env),
            AstNode::Assign { token, name, value } => self.exec_assign(token, name, value, env),
            AstNode::Export { token, name } => self.exec_export(token, name, env),
        };

        env.last_status = match &result {
            Ok(status) => *status,
            Err(e) => e.exit_status(),
        };
        result
    }
}

impl<W: Write> DefaultExecutor<W> {
    fn exec_statements(&mut self, list: &[AstNode], env: &mut Environment) -> ExecStatus {
        let mut status = env.last_status;
        for node in list {
            status = self.exec(node, env)?;
            if env.forced_exit {
                break;
            }
        }
        Ok(status)
    }

    fn exec_logical(
        &mut self,
        op: LogicalOp,
        left: &AstNode,
        right: &AstNode,
        env: &mut Environment,
    ) -> ExecStatus {
        let status = self.exec(left, env)?;
        let run_right = match op {
            LogicalOp::And => status == 0,
            LogicalOp::Or => status != 0,
        };
        if run_right && !env.forced_exit {
            self.exec(right, env)
        } else {
            Ok(status)
        }
    }

    fn exec_command(
        &mut self,
        token: &Token,
        name: &str,
        args: &[String],
        env: &mut Environment,
    ) -> ExecStatus {
        let error = |kind: EvalError| ShellError::new(token.pos.clone(), kind);

        let program = PathResolver
            .resolve(name, env.get("PATH"))
            .ok_or_else(|| error(EvalError::CmdNotFound(name.to_string())))?;

        let mut command = Command::new(&program);
        command
            .arg0(name)
            .args(args)
            .env_clear()
            .envs(env.exported_vars());

        tracing::debug!(cmd = %name, program = %program.display(), "spawning");
        let status = command.status().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => error(EvalError::CmdNotFound(name.to_string())),
            _ => error(EvalError::Spawn {
                cmd: name.to_string(),
                reason: e.to_string(),
            }),
        })?;

        let code = exit_code(status);
        tracing::debug!(cmd = %name, code, "exited");
        Ok(code)
    }

    fn exec_exit(&mut self, code: Option<i32>, env: &mut Environment) -> i32 {
        env.forced_exit = true;
        code.unwrap_or(env.last_status)
    }

    fn exec_echo(&mut self, token: &Token, message: &str) -> ExecStatus {
        writeln!(self.out, "{}", message)
            .and_then(|_| self.out.flush())
            .map_err(|e| ShellError::new(token.pos.clone(), EvalError::Output(e.to_string())))?;
        Ok(0)
    }

    fn exec_cd(&mut self, token: &Token, path: &str, env: &mut Environment) -> ExecStatus {
        let error = |kind: EvalError| ShellError::new(token.pos.clone(), kind);

        let target = match path.strip_prefix('~') {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => match env.get("HOME") {
                Some(home) => format!("{}{}", home, rest),
                None => return Err(error(EvalError::HomeNotSet(path.to_string()))),
            },
            _ => path.to_string(),
        };

        std::env::set_current_dir(&target)
            .map_err(|_| error(EvalError::FileNotFound(path.to_string())))?;

        if let Ok(cwd) = std::env::current_dir() {
            env.global_mut().create("PWD", &cwd.to_string_lossy(), true);
        }
        Ok(0)
    }

    fn exec_help(&mut self, token: &Token) -> ExecStatus {
        write_help(&mut self.out)
            .map_err(|e| ShellError::new(token.pos.clone(), EvalError::Output(e.to_string())))?;
        Ok(0)
    }

    fn exec_let(&mut self, token: &Token, name: &str, value: &str, env: &mut Environment) -> ExecStatus {
        validate_identifier(name).map_err(|e| ShellError::new(token.pos.clone(), e))?;
        env.global_mut().create(name, value, false);
        Ok(0)
    }

    fn exec_assign(&mut self, token: &Token, name: &str, value: &str, env: &mut Environment) -> ExecStatus {
        if !env.global_mut().set_value(name, value) {
            return Err(ShellError::new(token.pos.clone(), EvalError::VarNotFound(name.to_string())));
        }
        Ok(0)
    }

    fn exec_export(&mut self, token: &Token, name: &str, env: &mut Environment) -> ExecStatus {
        if !env.global_mut().set_exported(name, true) {
            return Err(ShellError::new(token.pos.clone(), EvalError::VarNotFound(name.to_string())));
        }
        Ok(0)
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1)
}

/// Identifiers are `[A-Za-z0-9_]+`.
pub(crate) fn validate_identifier(name: &str) -> Result<(), EvalError> {
    if name.is_empty() {
        return Err(EvalError::EmptyIdentifier);
    }
    match name
        .chars()
        .enumerate()
        .find(|(_, ch)| !ch.is_ascii_alphanumeric() && *ch != '_')
    {
        Some((index, ch)) => Err(EvalError::InvalidIdentifier { ch, index }),
        None => Ok(()),
    }
}

fn write_help<W: Write>(out: &mut W) -> io::Result<()> {
    let keyword = |name: &str| format!("{}{}{}{}", ansi::BOLD, ansi::BRIGHT_BLUE, name, ansi::RESET);

    writeln!(
        out,
        "{}{}snash{} help, version {}{}{}",
        ansi::BOLD,
        ansi::GREEN,
        ansi::RESET,
        ansi::CYAN,
        env!("CARGO_PKG_VERSION"),
        ansi::RESET
    )?;
    writeln!(
        out,
        "\n  {}{}A small shell for Unix-like systems{}\n",
        ansi::GREEN,
        ansi::ITALICS,
        ansi::RESET
    )?;
    writeln!(out, "Built-in commands:")?;
    writeln!(out, "  {}                Show this message", keyword("help"))?;
    writeln!(out, "  {} [str...]       Output a string", keyword("echo"))?;
    writeln!(out, "  {} [int]          Exit the shell with an exit code", keyword("exit"))?;
    writeln!(out, "  {} [path]           Change the current directory", keyword("cd"))?;
    writeln!(out, "  {} NAME = VALUE    Create a variable", keyword("let"))?;
    writeln!(out, "  {} NAME         Pass a variable on to commands", keyword("export"))?;
    writeln!(out, "\nCommands chain with {}&&{} and {}||{}, and group with ( ).",
        ansi::MAGENTA, ansi::RESET, ansi::MAGENTA, ansi::RESET)?;
    out.flush()
}
