use crate::builtin::Builtin;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Path;

/// Line-editor helper: completes the command word of a line.
#[derive(Debug, Default)]
pub struct ShellHelper {
    search_path: Option<String>,
}

impl ShellHelper {
    /// Updates the `PATH` value used to list executables.
    pub fn set_search_path(&mut self, search_path: Option<String>) {
        self.search_path = search_path;
    }

    /// Builtin names and `PATH` executables starting with `prefix`, sorted and
    /// without duplicates.
    pub fn command_candidates(&self, prefix: &str) -> Vec<String> {
        let mut names: BTreeSet<String> = Builtin::ALL
            .iter()
            .map(|b| b.name())
            .filter(|name| name.starts_with(prefix))
            .map(str::to_owned)
            .collect();
        if let Some(search_path) = &self.search_path {
            for dir in env::split_paths(search_path) {
                collect_executables(&dir, prefix, &mut names);
            }
        }
        names.into_iter().collect()
    }
}

fn collect_executables(dir: &Path, prefix: &str, names: &mut BTreeSet<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.starts_with(prefix) && is_executable(&entry.path()) {
            names.insert(name);
        }
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Start of the word under the cursor, or `None` when it is not the first word.
fn command_word_start(line: &str, pos: usize) -> Option<usize> {
    let before = &line[..pos];
    let start = before
        .rfind(char::is_whitespace)
        .map_or(0, |i| i + before[i..].chars().next().map_or(1, char::len_utf8));
    if before[..start].trim().is_empty() {
        Some(start)
    } else {
        None
    }
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let Some(start) = command_word_start(line, pos) else {
            return Ok((pos, Vec::new()));
        };
        let candidates = self.command_candidates(&line[start..pos]);
        let unique = candidates.len() == 1;
        let pairs = candidates
            .into_iter()
            .map(|name| Pair {
                replacement: if unique { format!("{name} ") } else { name.clone() },
                display: name,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}
