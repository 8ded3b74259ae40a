use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Finds the program a command name refers to.
pub struct PathResolver;

impl PathResolver {
    /// Names containing a `/` are taken as paths and only need to exist, so
    /// a missing exec bit surfaces as a spawn error. Bare names are looked
    /// up in `path_var` and must be executable.
    pub fn resolve(&self, command: &str, path_var: Option<&str>) -> Option<PathBuf> {
        if command.is_empty() {
            return None;
        }

        if command.contains('/') {
            let path = Path::new(command);
            return path.is_file().then(|| path.to_path_buf());
        }

        let paths = path_var?;
        std::env::split_paths(paths)
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(|dir| dir.join(command))
            .find(|full_path| is_executable(full_path))
    }

    pub fn exists(&self, command: &str, path_var: Option<&str>) -> bool {
        self.resolve(command, path_var).is_some()
    }
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
