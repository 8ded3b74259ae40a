use std::fs;
use std::sync::{Mutex, MutexGuard};
use snash::environment::{Environment, RefreshError};
use snash::error::{ErrorKind, EvalError};
use snash::executor::{evaluate, DefaultExecutor};

// Tests that move the working directory run one at a time
static CWD: Mutex<()> = Mutex::new(());

fn lock_cwd() -> MutexGuard<'static, ()> {
    CWD.lock().unwrap_or_else(|e| e.into_inner())
}

struct Session {
    env: Environment,
    executor: DefaultExecutor<Vec<u8>>,
}

impl Session {
    fn new() -> Self {
        let mut env = Environment::empty();
        let path = std::env::var("PATH").unwrap_or_else(|_| "/usr/bin:/bin".to_string());
        env.global_mut().create("PATH", &path, true);
        Session {
            env,
            executor: DefaultExecutor::new(Vec::new()),
        }
    }

    fn eval(&mut self, src: &str) -> Result<i32, snash::error::ShellError> {
        evaluate(&mut self.executor, &mut self.env, src, "session")
    }

    fn output(&self) -> String {
        String::from_utf8_lossy(self.executor.output()).to_string()
    }
}

#[test]
fn echo_prints_trailing_spaces() {
    let mut s = Session::new();
    assert_eq!(s.eval("echo a b c").unwrap(), 0);
    assert_eq!(s.output(), "a b c \n");
}

#[test]
fn logical_operators_follow_exit_status() {
    let mut s = Session::new();
    s.eval("true && echo hi").unwrap();
    assert_eq!(s.env.last_status, 0);
    s.eval("false && echo hidden").unwrap();
    assert_eq!(s.env.last_status, 1);
    assert_eq!(s.output(), "hi \n");
}

#[test]
fn exit_ends_session() {
    let mut s = Session::new();
    assert_eq!(s.eval("echo one; exit 7; echo two").unwrap(), 7);
    assert!(s.env.forced_exit);
    assert_eq!(s.env.last_status, 7);
    assert_eq!(s.output(), "one \n");
}

#[test]
fn missing_command_stops_input() {
    let mut s = Session::new();
    let err = s.eval("nonexistent_cmd_xyz; echo after").unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::Eval(EvalError::CmdNotFound("nonexistent_cmd_xyz".into()))
    );
    assert_eq!(err.to_string(), "session:1:1: Command \"nonexistent_cmd_xyz\" not found");
    assert_eq!(s.env.last_status, 127);
    assert_eq!(s.output(), "");
}

#[test]
fn variables_and_export() {
    let mut s = Session::new();
    s.eval("let X = 1").unwrap();
    s.eval("X = 2").unwrap();
    assert_eq!(s.env.get("X"), Some("2"));

    let err = s.eval("Y = 1").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Eval(EvalError::VarNotFound("Y".into())));
    assert_eq!(s.env.last_status, 1);

    s.eval("let FOO = bar; export FOO").unwrap();
    assert_eq!(s.eval("sh -c 'test \"$FOO\" = bar'").unwrap(), 0);
    // Only exported variables are passed on
    assert_eq!(s.eval("sh -c 'test -z \"$X\"'").unwrap(), 0);
}

#[test]
fn syntax_errors_run_nothing() {
    let mut s = Session::new();
    assert!(s.eval("echo first; echo \"unterminated").is_err());
    assert!(s.eval("echo first; let X 1").is_err());
    assert_eq!(s.env.last_status, 1);
    assert_eq!(s.output(), "");
}

#[test]
fn cd_changes_directory() {
    let _cwd = lock_cwd();
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().canonicalize().unwrap();
    let original = std::env::current_dir().unwrap();

    let mut s = Session::new();
    s.env.global_mut().create("HOME", &target.to_string_lossy(), true);
    let status = s.eval("cd ~/");
    let cwd = std::env::current_dir().unwrap();
    std::env::set_current_dir(&original).unwrap();

    assert_eq!(status.unwrap(), 0);
    assert_eq!(cwd, target);
    assert_eq!(s.env.get("PWD"), Some(target.to_string_lossy().as_ref()));
}

#[test]
fn refresh_keeps_going_without_a_working_directory() {
    let _cwd = lock_cwd();
    let dir = tempfile::tempdir().unwrap();
    let gone = dir.path().join("gone");
    fs::create_dir(&gone).unwrap();
    let original = std::env::current_dir().unwrap();

    std::env::set_current_dir(&gone).unwrap();
    fs::remove_dir(&gone).unwrap();
    let mut env = Environment::empty();
    let errors = env.refresh();
    std::env::set_current_dir(&original).unwrap();

    assert_eq!(errors.len(), 1, "{:?}", errors);
    assert!(matches!(errors[0], RefreshError::Pwd(_)));
    assert!(env.get("PWD").is_none());
    assert!(env.get("HOSTNAME").is_some());
    assert!(env.get("HOME").is_some());
}
