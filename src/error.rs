use crate::command::{EXIT_CANNOT_EXECUTE, EXIT_FAILURE, EXIT_NOT_FOUND, EXIT_USAGE, ExitCode};
use std::io;
use std::path::PathBuf;

/// Errors produced while parsing or running a command line.
///
/// None of these end the interactive loop: the engine reports them on the
/// relevant stderr and turns them into an exit status.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// Malformed input line. Nothing from the line is executed.
    #[error("syntax error: {0}")]
    Syntax(&'static str),

    /// A stage named a command that is neither builtin nor on the search path.
    #[error("{0}: command not found")]
    CommandNotFound(String),

    /// `cd` target is missing or not a directory.
    #[error("cd: {path}: {reason}")]
    Directory { path: String, reason: String },

    /// A file (redirection target or history file) could not be accessed.
    #[error("{}: {error}", path.display())]
    Io { path: PathBuf, error: io::Error },

    /// The OS refused to start a resolved program.
    #[error("{name}: {error}")]
    Process { name: String, error: io::Error },
}

impl ShellError {
    pub fn io(path: impl Into<PathBuf>, error: io::Error) -> Self {
        ShellError::Io {
            path: path.into(),
            error,
        }
    }

    /// Status a stage (or the whole line, for syntax errors) reports for this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ShellError::Syntax(_) => EXIT_USAGE,
            ShellError::CommandNotFound(_) => EXIT_NOT_FOUND,
            ShellError::Directory { .. } | ShellError::Io { .. } => EXIT_FAILURE,
            ShellError::Process { error, .. } if error.kind() == io::ErrorKind::NotFound => {
                EXIT_NOT_FOUND
            }
            ShellError::Process { .. } => EXIT_CANNOT_EXECUTE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_shell_conventions() {
        assert_eq!(
            ShellError::CommandNotFound("frob".into()).to_string(),
            "frob: command not found"
        );
        assert_eq!(
            ShellError::Syntax("unterminated quote").to_string(),
            "syntax error: unterminated quote"
        );
        let err = ShellError::Directory {
            path: "/nope".into(),
            reason: "No such file or directory".into(),
        };
        assert_eq!(err.to_string(), "cd: /nope: No such file or directory");
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        assert_eq!(ShellError::Syntax("x").exit_code(), EXIT_USAGE);
        assert_eq!(
            ShellError::CommandNotFound("x".into()).exit_code(),
            EXIT_NOT_FOUND
        );
        let denied = ShellError::Process {
            name: "x".into(),
            error: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(denied.exit_code(), EXIT_CANNOT_EXECUTE);
        let vanished = ShellError::Process {
            name: "x".into(),
            error: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(vanished.exit_code(), EXIT_NOT_FOUND);
    }
}
