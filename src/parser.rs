use crate::error::ShellError;
use crate::lexer::{self, Token};
use std::path::PathBuf;

/// Where a redirected stream goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    /// File path as written on the command line. Relative paths are resolved
    /// against the session directory when the stage is wired.
    pub path: PathBuf,
    /// `>>` appends instead of truncating.
    pub append: bool,
}

/// Per-stage redirections, recorded but not yet opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectionSpec {
    pub stdout: Option<RedirectTarget>,
    pub stderr: Option<RedirectTarget>,
}

impl RedirectionSpec {
    pub fn is_empty(&self) -> bool {
        self.stdout.is_none() && self.stderr.is_none()
    }
}

/// One command of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    pub name: String,
    pub args: Vec<String>,
    pub redirection: RedirectionSpec,
}

/// Stages parsed from one input line, in execution order.
///
/// An empty pipeline stands for a blank line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<StageSpec>,
}

impl Pipeline {
    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Maps a redirection operator to the stream it targets and whether it appends.
fn redirect_operator(token: &Token) -> Option<(Stream, bool)> {
    if token.quoted {
        return None;
    }
    match token.text.as_str() {
        ">" | "1>" => Some((Stream::Stdout, false)),
        ">>" | "1>>" => Some((Stream::Stdout, true)),
        "2>" => Some((Stream::Stderr, false)),
        "2>>" => Some((Stream::Stderr, true)),
        _ => None,
    }
}

fn is_operator(token: &Token) -> bool {
    token.is_pipe() || redirect_operator(token).is_some()
}

/// Removes redirection operators and their targets from one stage's tokens.
///
/// Returns the remaining words (command name first) and the collected
/// redirections. When a stream is redirected twice the later one wins.
///
/// # Errors
/// `ShellError::Syntax("missing redirection target")` when an operator is the
/// last token or is followed by another operator.
pub fn extract_redirections(
    tokens: Vec<Token>,
) -> Result<(Vec<String>, RedirectionSpec), ShellError> {
    let mut words = Vec::new();
    let mut spec = RedirectionSpec::default();
    let mut iter = tokens.into_iter();

    while let Some(token) = iter.next() {
        let Some((stream, append)) = redirect_operator(&token) else {
            words.push(token.text);
            continue;
        };
        let target = match iter.next() {
            Some(t) if !is_operator(&t) => RedirectTarget {
                path: PathBuf::from(t.text),
                append,
            },
            _ => return Err(ShellError::Syntax("missing redirection target")),
        };
        match stream {
            Stream::Stdout => spec.stdout = Some(target),
            Stream::Stderr => spec.stderr = Some(target),
        }
    }

    Ok((words, spec))
}

/// Builds a pipeline from the tokens of one line.
///
/// Tokens are split on unquoted `|`, then redirections are extracted from every
/// stage independently.
///
/// # Errors
/// `ShellError::Syntax("missing command before pipe")` when a stage has no command
/// name, plus any error from [`extract_redirections`].
pub fn construct_pipeline(tokens: Vec<Token>) -> Result<Pipeline, ShellError> {
    if tokens.is_empty() {
        return Ok(Pipeline::default());
    }

    let mut groups: Vec<Vec<Token>> = vec![Vec::new()];
    for token in tokens {
        if token.is_pipe() {
            groups.push(Vec::new());
        } else if let Some(group) = groups.last_mut() {
            group.push(token);
        }
    }

    let mut stages = Vec::with_capacity(groups.len());
    for group in groups {
        let (words, redirection) = extract_redirections(group)?;
        let mut words = words.into_iter();
        let name = words
            .next()
            .ok_or(ShellError::Syntax("missing command before pipe"))?;
        stages.push(StageSpec {
            name,
            args: words.collect(),
            redirection,
        });
    }

    Ok(Pipeline { stages })
}

/// Tokenizes and parses a raw input line.
pub fn parse_line(line: &str) -> Result<Pipeline, ShellError> {
    construct_pipeline(lexer::split_into_tokens(line)?)
}
