use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use nix::unistd::{self, User};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub value: String,
    pub exported: bool,
}

/// One level of shell variables.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scope {
    vars: HashMap<String, Variable>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite a variable.
    pub fn create(&mut self, name: &str, value: &str, exported: bool) {
        self.vars.insert(
            name.to_string(),
            Variable {
                value: value.to_string(),
                exported,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(|v| v.value.as_str())
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.vars.get(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Update the value of an existing variable, keeping its export flag.
    /// Returns false if the variable does not exist.
    pub fn set_value(&mut self, name: &str, value: &str) -> bool {
        match self.vars.get_mut(name) {
            Some(var) => {
                var.value = value.to_string();
                true
            }
            None => false,
        }
    }

    pub fn set_exported(&mut self, name: &str, exported: bool) -> bool {
        match self.vars.get_mut(name) {
            Some(var) => {
                var.exported = exported;
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self, name: &str) -> Option<Variable> {
        self.vars.remove(name)
    }

    /// Exported variables, sorted by name.
    pub fn exported_vars(&self) -> Vec<(String, String)> {
        let mut vars: Vec<_> = self
            .vars
            .iter()
            .filter(|(_, v)| v.exported)
            .map(|(k, v)| (k.clone(), v.value.clone()))
            .collect();
        vars.sort();
        vars
    }
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("Failed to set \"$HOSTNAME\": {0}")]
    Hostname(#[source] nix::Error),
    #[error("Failed to set \"$PWD\": {0}")]
    Pwd(#[source] io::Error),
    #[error("Failed to set \"$HOME\": no home directory found")]
    Home,
}

/// Session state threaded through every evaluation: a stack of scopes
/// (index 0 is the global scope and is never popped), the last exit status
/// and the forced-exit flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    scopes: Vec<Scope>,
    pub last_status: i32,
    pub forced_exit: bool,
}

impl Default for Environment {
    fn default() -> Self {
        Environment {
            scopes: vec![Scope::new()],
            last_status: 0,
            forced_exit: false,
        }
    }
}

impl Environment {
    /// A session seeded with the process environment, all exported.
    pub fn new() -> Self {
        let mut env = Self::default();
        for (k, v) in std::env::vars() {
            env.global_mut().create(&k, &v, true);
        }
        env
    }

    /// A session with no variables at all.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn global(&self) -> &Scope {
        &self.scopes[0]
    }

    pub fn global_mut(&mut self) -> &mut Scope {
        &mut self.scopes[0]
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    /// Pop the innermost scope. The global scope stays.
    pub fn pop_scope(&mut self) -> Option<Scope> {
        if self.scopes.len() > 1 {
            self.scopes.pop()
        } else {
            None
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.global().get(name)
    }

    pub fn exported_vars(&self) -> Vec<(String, String)> {
        self.global().exported_vars()
    }

    /// Recompute PWD, HOSTNAME and HOME. Each fact is refreshed on its own;
    /// the failures are returned for the caller to report.
    pub fn refresh(&mut self) -> Vec<RefreshError> {
        let mut errors = Vec::new();

        match unistd::gethostname() {
            Ok(name) => {
                let name = name.to_string_lossy();
                self.global_mut().create("HOSTNAME", name.trim_end(), true);
            }
            Err(e) => errors.push(RefreshError::Hostname(e)),
        }

        match std::env::current_dir() {
            Ok(dir) => self.global_mut().create("PWD", &dir.to_string_lossy(), true),
            Err(e) => errors.push(RefreshError::Pwd(e)),
        }

        match home_dir() {
            Some(home) => self.global_mut().create("HOME", &home.to_string_lossy(), true),
            None => errors.push(RefreshError::Home),
        }

        for err in &errors {
            tracing::warn!("environment refresh: {}", err);
        }
        errors
    }
}

fn home_dir() -> Option<PathBuf> {
    if let Some(home) = std::env::var_os("HOME").filter(|h| !h.is_empty()) {
        return Some(PathBuf::from(home));
    }
    User::from_uid(unistd::getuid())
        .ok()
        .flatten()
        .map(|user| user.dir)
}
