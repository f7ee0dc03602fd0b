use crate::command::{EXIT_SUCCESS, ExitCode};
use crate::history::HistoryLog;
use std::collections::HashMap;
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// Session state shared by the engine and every builtin.
///
/// The environment contains:
/// - `vars`: variables handed to spawned programs; `PATH`, `HOME`, `HISTFILE` and
///   `BROWSER` are also read from here.
/// - `current_dir`: the working directory used for new stages, redirections and
///   relative command paths. The process's own working directory is never changed.
/// - `history`: the lines accepted so far.
/// - `last_status`: status of the most recent pipeline.
/// - `exit_request`: set by `exit`; an interactive loop stops when it is present.
#[derive(Debug, Clone)]
pub struct Environment {
    pub vars: HashMap<String, String>,
    pub current_dir: PathBuf,
    pub history: HistoryLog,
    pub last_status: ExitCode,
    pub exit_request: Option<ExitCode>,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    ///
    /// This copies variables from `std::env::vars()` and initializes `current_dir`
    /// from `std::env::current_dir()`. History starts empty.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        Self::with_vars(vars, current_dir)
    }

    /// Build an environment from explicit parts, without looking at the process.
    pub fn with_vars(vars: HashMap<String, String>, current_dir: PathBuf) -> Self {
        Self {
            vars,
            current_dir,
            history: HistoryLog::default(),
            last_status: EXIT_SUCCESS,
            exit_request: None,
        }
    }

    /// Get the value of a variable tracked by this session.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    /// Set or override a variable.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// The `HOME` directory, if set and non-empty.
    pub fn home_dir(&self) -> Option<PathBuf> {
        self.get_var("HOME")
            .filter(|home| !home.is_empty())
            .map(PathBuf::from)
    }

    /// Expands a leading `~` and anchors relative paths at `current_dir`.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        let expanded = match (path.strip_prefix("~"), self.home_dir()) {
            (Ok(rest), Some(home)) if rest.as_os_str().is_empty() => home,
            (Ok(rest), Some(home)) => home.join(rest),
            _ => path.to_path_buf(),
        };
        self.current_dir.join(expanded)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
