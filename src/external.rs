use crate::command::ExitCode;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it is an executable file.
/// - Path with more than one component (e.g. `bin/tool`, `./tool`): resolved
///   against `current_dir` and returned if it is an executable file.
/// - Single component: each directory in `search_paths` (PATH syntax) is tried in
///   order and the first executable match is returned.
/// - Empty path: returns `None`.
pub fn find_command_path(search_paths: &OsStr, current_dir: &Path, path: &Path) -> Option<PathBuf> {
    if path.is_absolute() {
        return find_by_path(path);
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, _) => None,
        (Some(single), None) if !path.starts_with(".") => {
            find_in_path(search_paths, current_dir, single.as_os_str())
        }
        _ => find_by_path(&current_dir.join(path)),
    }
}

fn find_in_path(search_paths: &OsStr, current_dir: &Path, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| {
            // An empty PATH entry means the current directory.
            if dir.as_os_str().is_empty() {
                current_dir.join(cmd)
            } else {
                current_dir.join(dir).join(cmd)
            }
        })
        .find_map(|candidate| find_by_path(&candidate))
}

fn find_by_path(path: &Path) -> Option<PathBuf> {
    if is_executable(path) {
        Some(path.to_path_buf())
    } else {
        None
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    fs::metadata(path).map(|meta| meta.is_file()).unwrap_or(false)
}

/// Converts a child's exit status into a shell status code.
pub fn exit_code_of(status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(code) => code,
        None => terminated_by_signal(status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> ExitCode {
    -1
}
