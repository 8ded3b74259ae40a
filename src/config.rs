use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use crate::environment::Environment;

pub const DEFAULT_PROMPT: &str = "\\u@\\h \\w $ ";
pub const DEFAULT_PROMPT_ERROR: &str = "\\[\\e[1m\\e[91m\\][\\ex]\\[\\e[0m\\] \\u@\\h \\w $ ";
pub const DEFAULT_PROMPT_MULTILINE: &str = "> ";
/// History file under `$HOME` used when none is configured.
pub const DEFAULT_HISTORY_FILE: &str = ".snash_history";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub prompt: String,
    pub prompt_error: String,
    pub prompt_multiline: String,
    pub history_file: Option<String>,
    pub history_max: usize,
    pub interactive: bool,
    pub show_possible_errors: bool,
    pub syntax_highlighting: bool,
    pub env_vars: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        ConfigLoader::default_config()
    }
}

impl Config {
    /// Seed scope 0 with the configured variables and the prompt templates.
    /// Existing variables win over the prompt defaults.
    pub fn apply(&self, env: &mut Environment) {
        for (name, value) in &self.env_vars {
            env.global_mut().create(name, value, false);
        }
        let prompts = [
            ("PROMPT", &self.prompt),
            ("PROMPT_ERROR", &self.prompt_error),
            ("PROMPT_MULTILINE", &self.prompt_multiline),
        ];
        for (name, value) in prompts {
            if !env.global().exists(name) {
                env.global_mut().create(name, value, false);
            }
        }
    }

    /// The configured history file, else `$HOME/.snash_history`.
    pub fn history_path(&self, env: &Environment) -> Option<String> {
        if let Some(path) = &self.history_file {
            return Some(path.clone());
        }
        let home = env.get("HOME").filter(|h| !h.is_empty())?;
        Some(format!("{}/{}", home.trim_end_matches('/'), DEFAULT_HISTORY_FILE))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Line {line}: {msg}")]
    Parse { line: usize, msg: String },
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn default_config() -> Config {
        Config {
            prompt: DEFAULT_PROMPT.to_string(),
            prompt_error: DEFAULT_PROMPT_ERROR.to_string(),
            prompt_multiline: DEFAULT_PROMPT_MULTILINE.to_string(),
            history_file: None,
            history_max: 500,
            interactive: true,
            show_possible_errors: true,
            syntax_highlighting: true,
            env_vars: BTreeMap::new(),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let src = fs::read_to_string(path)?;
        Self::load_from_str(&src)
    }

    /// `key=value` lines; blank lines and `#` comments are skipped. Values
    /// keep their spacing so prompts can end in a space.
    pub fn load_from_str(src: &str) -> Result<Config, ConfigError> {
        let mut config = Self::default_config();

        for (lineno, line) in src.lines().enumerate() {
            let lineno = lineno + 1;
            let parse_err = |msg: String| ConfigError::Parse { line: lineno, msg };

            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(parse_err(format!("No '=' found: {}", line)));
            };
            let key = key.trim();

            match key {
                "prompt" => config.prompt = value.to_string(),
                "prompt_error" => config.prompt_error = value.to_string(),
                "prompt_multiline" => config.prompt_multiline = value.to_string(),
                "history_file" => {
                    let value = value.trim();
                    config.history_file = (!value.is_empty()).then(|| value.to_string());
                }
                "history_max" => {
                    config.history_max = value
                        .trim()
                        .parse()
                        .map_err(|_| parse_err(format!("Invalid number: {}", value.trim())))?;
                }
                "interactive" => config.interactive = parse_bool(value).ok_or_else(|| parse_err(bool_msg(value)))?,
                "show_possible_errors" => {
                    config.show_possible_errors = parse_bool(value).ok_or_else(|| parse_err(bool_msg(value)))?
                }
                "syntax_highlighting" => {
                    config.syntax_highlighting = parse_bool(value).ok_or_else(|| parse_err(bool_msg(value)))?
                }
                k if k.starts_with("env.") => {
                    let var = k.trim_start_matches("env.");
                    if var.is_empty() {
                        return Err(parse_err("Empty variable name".to_string()));
                    }
                    config.env_vars.insert(var.to_string(), value.to_string());
                }
                _ => return Err(parse_err(format!("Unknown key: {}", key))),
            }
        }

        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn bool_msg(value: &str) -> String {
    format!("Invalid boolean: {}", value.trim())
}
