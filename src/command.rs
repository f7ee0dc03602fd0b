use crate::builtin::Builtin;
use crate::env::Environment;
use crate::external::find_command_path;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

pub const EXIT_SUCCESS: ExitCode = 0;
pub const EXIT_FAILURE: ExitCode = 1;
/// Malformed line or invalid builtin arguments.
pub const EXIT_USAGE: ExitCode = 2;
/// The program was found but the OS refused to run it.
pub const EXIT_CANNOT_EXECUTE: ExitCode = 126;
/// The command name did not resolve to anything.
pub const EXIT_NOT_FOUND: ExitCode = 127;

/// Outcome of running one input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Status of the last stage, or the status forced by a stage that could not start.
    pub exit_code: ExitCode,
    /// Number of stages in the pipeline (0 for blank lines and syntax errors).
    pub stage_count: usize,
}

impl ExecutionResult {
    pub fn new(exit_code: ExitCode, stage_count: usize) -> Self {
        Self {
            exit_code,
            stage_count,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == EXIT_SUCCESS
    }
}

/// What a command name refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Implemented in-process.
    Builtin(Builtin),
    /// Executable found on disk.
    External(PathBuf),
    /// Neither a builtin nor an executable on the search path.
    Unknown,
}

/// Classifies a command name against the builtin registry and the search path.
///
/// Builtins take precedence. Names containing a path separator are checked
/// relative to the session directory; bare names are looked up in each `PATH`
/// entry in order. `PATH` is read from the environment on every call, so a
/// change is picked up by the next command. This function has no side effects;
/// both `type` and the execution engine rely on it.
pub fn classify(name: &str, env: &Environment) -> Resolution {
    if let Some(builtin) = Builtin::from_name(name) {
        return Resolution::Builtin(builtin);
    }
    let search_paths = env.get_var("PATH").unwrap_or_default();
    match find_command_path(
        OsStr::new(&search_paths),
        &env.current_dir,
        Path::new(name),
    ) {
        Some(path) => Resolution::External(path),
        None => Resolution::Unknown,
    }
}
