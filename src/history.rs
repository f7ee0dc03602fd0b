//! In-memory command history and its plain-text file format.
//!
//! The file format is one raw line per entry, newline-terminated, without escaping.

use crate::error::ShellError;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Ordered, append-only list of accepted input lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLog {
    entries: Vec<String>,
    /// Number of leading entries already appended to a history file.
    appended: usize,
}

impl HistoryLog {
    /// Records an accepted line. Blank lines are ignored.
    pub fn record_line(&mut self, raw: &str) {
        if !raw.trim().is_empty() {
            self.entries.push(raw.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries with their 1-based index.
    pub fn list_all(&self) -> impl Iterator<Item = (usize, &str)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, line)| (i + 1, line.as_str()))
    }

    /// Writes every entry to `path`, replacing its contents.
    pub fn write_to(&self, path: &Path) -> Result<(), ShellError> {
        let file = File::create(path).map_err(|e| ShellError::io(path, e))?;
        write_lines(file, &self.entries).map_err(|e| ShellError::io(path, e))
    }

    /// Appends the entries not yet appended by a previous call to `path`.
    pub fn append_to(&mut self, path: &Path) -> Result<(), ShellError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| ShellError::io(path, e))?;
        write_lines(file, &self.entries[self.appended..]).map_err(|e| ShellError::io(path, e))?;
        self.appended = self.entries.len();
        Ok(())
    }

    /// Appends every non-blank line of `path` to the log.
    pub fn read_from(&mut self, path: &Path) -> Result<(), ShellError> {
        let contents = fs::read_to_string(path).map_err(|e| ShellError::io(path, e))?;
        for line in contents.lines() {
            self.record_line(line);
        }
        Ok(())
    }

    /// Loads a history file at startup. Loaded entries count as already persisted,
    /// so [`HistoryLog::append_to`] will not write them back.
    pub fn load(&mut self, path: &Path) -> Result<(), ShellError> {
        self.read_from(path)?;
        self.appended = self.entries.len();
        Ok(())
    }
}

fn write_lines(file: File, lines: &[String]) -> std::io::Result<()> {
    let mut out = BufWriter::new(file);
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()
}
