use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use crate::config::{Config, DEFAULT_PROMPT_MULTILINE};
use crate::environment::Environment;
use crate::error::{quote, report_error};
use crate::executor::{evaluate, DefaultExecutor};
use crate::highlighter::Highlighter;
use crate::history::History;
use crate::io::{install_signal_handlers, Tty};
use crate::prompt::{expand_template, Prompt, PromptFlags};

const SOURCE_NAME: &str = "stdin";

fn session(config: &Config) -> Environment {
    let mut env = Environment::new();
    config.apply(&mut env);
    if let Some(shell) = std::env::args().next() {
        env.global_mut().create("SHELL", &shell, true);
    }
    env
}

/// Interactive session on the terminal. Falls back to reading plain lines
/// when stdin is not a terminal. Returns the exit status of the session.
pub fn run(config: &Config) -> i32 {
    let mut env = session(config);
    let mut executor = DefaultExecutor::stdout();

    if !io::stdin().is_terminal() {
        env.refresh();
        return run_lines(&mut env, &mut executor, io::stdin().lock());
    }

    if let Err(e) = install_signal_handlers() {
        tracing::warn!("could not install signal handlers: {}", e);
    }

    let history_file = config.history_path(&env);
    let history = match &history_file {
        Some(path) => History::load(path, config.history_max).unwrap_or_else(|e| {
            tracing::warn!("history load failed: {}", e);
            report_error(&format!("Could not load history file {}: {}", quote(path), e));
            History::new(config.history_max)
        }),
        None => History::new(config.history_max),
    };
    let flags = PromptFlags {
        interactive: config.interactive,
        show_possible_errors: config.show_possible_errors,
        syntax_highlighting: config.syntax_highlighting,
    };
    let mut prompt = Prompt::new(history, flags);
    let mut tty = Tty::new();

    loop {
        for err in env.refresh() {
            report_error(&err);
        }

        let template = if env.last_status == 0 { "PROMPT" } else { "PROMPT_ERROR" };
        let text = expand_template(env.get(template).unwrap_or_default(), &env);
        let multiline = env.get("PROMPT_MULTILINE").unwrap_or(DEFAULT_PROMPT_MULTILINE);
        prompt.continuation = expand_template(multiline, &env);

        let input = {
            let highlighter = Highlighter::new(&env);
            prompt.read_line(&mut tty, &text, Some(&highlighter))
        };
        let input = match input {
            Ok(input) => input,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => {
                report_error(&format!("Could not read input: {}", e));
                env.last_status = 1;
                break;
            }
        };

        if let Err(e) = evaluate(&mut executor, &mut env, &input, SOURCE_NAME) {
            report_error(&e);
        }
        if env.forced_exit {
            break;
        }
    }

    if let Some(path) = &history_file {
        if let Err(e) = prompt.history.save(path) {
            tracing::warn!("history save failed: {}", e);
            report_error(&format!("Could not save history file {}", quote(path)));
        }
    }

    env.last_status
}

/// Evaluate each line of `reader` in turn.
pub fn run_lines<W: Write, R: BufRead>(
    env: &mut Environment,
    executor: &mut DefaultExecutor<W>,
    reader: R,
) -> i32 {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                report_error(&format!("Could not read input: {}", e));
                return 1;
            }
        };

        if let Err(e) = evaluate(executor, env, &line, SOURCE_NAME) {
            report_error(&e);
        }
        if env.forced_exit {
            break;
        }
    }
    env.last_status
}

/// Run script files in order against one session. Any failure ends the
/// run with status 1.
pub fn run_scripts(config: &Config, paths: &[String]) -> i32 {
    let mut env = session(config);
    let mut executor = DefaultExecutor::stdout();
    run_script_files(&mut env, &mut executor, paths)
}

fn run_script_files<W: Write>(
    env: &mut Environment,
    executor: &mut DefaultExecutor<W>,
    paths: &[String],
) -> i32 {
    for path in paths {
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                report_error(&format!("Could not read file {}: {}", quote(path), e));
                return 1;
            }
        };

        env.refresh();
        if let Err(e) = evaluate(executor, env, &source, path) {
            report_error(&e);
            return 1;
        }
        if env.forced_exit {
            break;
        }
    }
    env.last_status
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_env() -> Environment {
        let mut env = Environment::empty();
        let path = std::env::var("PATH").unwrap_or_else(|_| "/usr/bin:/bin".to_string());
        env.global_mut().create("PATH", &path, true);
        env
    }

    fn output(executor: DefaultExecutor<Vec<u8>>) -> String {
        String::from_utf8(executor.into_output()).unwrap()
    }

    #[test]
    fn test_session_seeds_shell_and_prompts() {
        let env = session(&Config::default());
        assert_eq!(env.get("SHELL"), std::env::args().next().as_deref());
        assert!(env.global().variable("SHELL").unwrap().exported);
        assert_eq!(env.get("PROMPT_MULTILINE"), Some(DEFAULT_PROMPT_MULTILINE));
    }

    #[test]
    fn test_run_lines_until_exit() {
        let mut env = test_env();
        let mut executor = DefaultExecutor::new(Vec::new());
        let input = io::Cursor::new("echo a\nexit 3\necho b\n");
        let status = run_lines(&mut env, &mut executor, input);
        assert_eq!(status, 3);
        assert_eq!(output(executor), "a \n");
    }

    #[test]
    fn test_run_lines_continues_after_errors() {
        let mut env = test_env();
        let mut executor = DefaultExecutor::new(Vec::new());
        let input = io::Cursor::new("nonexistent_cmd_xyz\necho 'open\necho ok\n");
        let status = run_lines(&mut env, &mut executor, input);
        assert_eq!(status, 0);
        assert_eq!(output(executor), "ok \n");
    }

    #[test]
    fn test_run_lines_last_status() {
        let mut env = test_env();
        let mut executor = DefaultExecutor::new(Vec::new());
        let status = run_lines(&mut env, &mut executor, io::Cursor::new("false\n"));
        assert_eq!(status, 1);
    }

    #[test]
    fn test_scripts_share_one_session() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.snash");
        let second = dir.path().join("second.snash");
        fs::write(&first, "let GREETING = hello\nexport GREETING\n").unwrap();
        fs::write(&second, "sh -c 'test \"$GREETING\" = hello' && echo shared\n").unwrap();

        let paths = vec![
            first.to_string_lossy().to_string(),
            second.to_string_lossy().to_string(),
        ];
        let mut env = test_env();
        let mut executor = DefaultExecutor::new(Vec::new());
        let status = run_script_files(&mut env, &mut executor, &paths);
        assert_eq!(status, 0);
        assert_eq!(output(executor), "shared \n");
    }

    #[test]
    fn test_script_failures_exit_one() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("bad.snash");
        fs::write(&script, "echo before\nnonexistent_cmd_xyz\necho after\n").unwrap();

        let mut env = test_env();
        let mut executor = DefaultExecutor::new(Vec::new());
        let paths = vec![script.to_string_lossy().to_string()];
        assert_eq!(run_script_files(&mut env, &mut executor, &paths), 1);
        assert_eq!(output(executor), "before \n");

        let mut executor = DefaultExecutor::new(Vec::new());
        let missing = vec![dir.path().join("missing").to_string_lossy().to_string()];
        assert_eq!(run_script_files(&mut env, &mut executor, &missing), 1);
    }

    #[test]
    fn test_script_exit_stops_later_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.snash");
        let second = dir.path().join("second.snash");
        fs::write(&first, "exit 4\n").unwrap();
        fs::write(&second, "echo unreachable\n").unwrap();

        let paths = vec![
            first.to_string_lossy().to_string(),
            second.to_string_lossy().to_string(),
        ];
        let mut env = test_env();
        let mut executor = DefaultExecutor::new(Vec::new());
        assert_eq!(run_script_files(&mut env, &mut executor, &paths), 4);
        assert_eq!(output(executor), "");
    }
}
