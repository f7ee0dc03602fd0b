use crate::builtin::Builtin;
use crate::command::{
    EXIT_FAILURE, EXIT_SUCCESS, ExecutionResult, ExitCode, Resolution, classify,
};
use crate::completion::ShellHelper;
use crate::env::Environment;
use crate::error::ShellError;
use crate::external::exit_code_of;
use crate::io_adapters::{OpenedRedirects, Upstream, Workers};
use crate::parser::{self, Pipeline, StageSpec};
use crate::signal;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

const PROMPT: &str = "$ ";

/// Where the last stage of a pipeline writes when it is not redirected.
enum FinalOutput<'a> {
    Terminal,
    Writer(&'a mut dyn Write),
}

impl FinalOutput<'_> {
    fn writer(&mut self) -> Option<&mut dyn Write> {
        match self {
            FinalOutput::Terminal => None,
            FinalOutput::Writer(w) => Some(&mut **w),
        }
    }
}

/// Result of wiring and starting a single stage.
enum Started {
    /// A builtin ran to completion.
    Finished { status: ExitCode, next: Upstream },
    /// An external process is running.
    Spawned { child: Child, next: Upstream },
    /// The stage did not run; the error was already reported.
    /// `start_failure` marks a command that could not be started at all.
    Failed { status: ExitCode, start_failure: bool },
}

struct Running {
    index: usize,
    name: String,
    child: Child,
}

/// The command-line interpreter and pipeline execution engine.
///
/// Owns the session [`Environment`]; every line is parsed, each stage is
/// classified with [`classify`] when it starts, and stages are wired together
/// with OS pipes (external to external) or in-memory buffers (after a builtin).
///
/// Example
/// ```
/// use minishell::Interpreter;
/// let mut sh = Interpreter::default();
/// let mut out = Vec::new();
/// let result = sh.execute_line_captured("echo hello world", &mut out);
/// assert_eq!(result.exit_code, 0);
/// assert_eq!(out, b"hello world\n");
/// ```
pub struct Interpreter {
    env: Environment,
}

impl Interpreter {
    /// Create an interpreter over an explicit session environment.
    pub fn new(env: Environment) -> Self {
        Self { env }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Runs one input line with the last stage writing to the terminal.
    pub fn execute_line(&mut self, line: &str) -> ExecutionResult {
        self.execute(line, FinalOutput::Terminal)
    }

    /// Runs one input line, sending the last stage's standard output to `out`
    /// instead of the terminal. Redirections still take precedence.
    pub fn execute_line_captured(&mut self, line: &str, out: &mut dyn Write) -> ExecutionResult {
        self.execute(line, FinalOutput::Writer(out))
    }

    fn execute(&mut self, line: &str, out: FinalOutput<'_>) -> ExecutionResult {
        let pipeline = match parser::parse_line(line) {
            Ok(pipeline) => pipeline,
            Err(err) => {
                eprintln!("{err}");
                self.env.last_status = err.exit_code();
                return ExecutionResult::new(err.exit_code(), 0);
            }
        };
        if pipeline.is_empty() {
            return ExecutionResult::new(EXIT_SUCCESS, 0);
        }
        let result = self.run_pipeline(&pipeline, out);
        self.env.last_status = result.exit_code;
        result
    }

    fn run_pipeline(&mut self, pipeline: &Pipeline, mut out: FinalOutput<'_>) -> ExecutionResult {
        // Discard an interrupt that arrived while nothing was running.
        signal::take_interrupt();

        let last = pipeline.len() - 1;
        let mut upstream = Upstream::Terminal;
        let mut running: Vec<Running> = Vec::new();
        let mut workers = Workers::default();
        let mut last_status = EXIT_SUCCESS;
        let mut start_failure: Option<ExitCode> = None;

        for (index, stage) in pipeline.stages().iter().enumerate() {
            let input = std::mem::replace(&mut upstream, Upstream::Closed);
            let is_last = index == last;
            match self.start_stage(stage, input, is_last, &mut out, &mut workers) {
                Started::Finished { status, next } => {
                    upstream = next;
                    if is_last {
                        last_status = status;
                    }
                }
                Started::Spawned { child, next } => {
                    upstream = next;
                    running.push(Running {
                        index,
                        name: stage.name.clone(),
                        child,
                    });
                }
                Started::Failed {
                    status,
                    start_failure: failed_to_start,
                } => {
                    if failed_to_start {
                        start_failure.get_or_insert(status);
                    }
                    if is_last {
                        last_status = status;
                    }
                }
            }
        }

        // Only a captured last stage leaves a live connection behind.
        if let Upstream::Process(mut tail) = upstream {
            if let Some(w) = out.writer() {
                if let Err(e) = io::copy(&mut tail, w) {
                    log::warn!("copying pipeline output failed: {e}");
                }
            }
        }

        let mut interrupted = false;
        for i in 0..running.len() {
            let status = match running[i].child.wait() {
                Ok(status) => exit_code_of(status),
                Err(e) => {
                    log::warn!("waiting for {} failed: {e}", running[i].name);
                    EXIT_FAILURE
                }
            };
            log::debug!("stage {} ({}) exited with {status}", running[i].index, running[i].name);
            if running[i].index == last {
                last_status = status;
            }
            if !interrupted && signal::take_interrupt() {
                interrupted = true;
                for rest in &mut running[i + 1..] {
                    let _ = rest.child.kill();
                }
            }
        }
        workers.join();
        if interrupted {
            log::info!("pipeline interrupted");
        }

        ExecutionResult::new(start_failure.unwrap_or(last_status), pipeline.len())
    }

    /// Wires one stage to its input, output and error streams and starts it.
    fn start_stage(
        &mut self,
        stage: &StageSpec,
        input: Upstream,
        is_last: bool,
        out: &mut FinalOutput<'_>,
        workers: &mut Workers,
    ) -> Started {
        let mut redirects = match OpenedRedirects::open(&stage.redirection, &self.env) {
            Ok(redirects) => redirects,
            Err(err) => {
                eprintln!("{err}");
                input.discard(workers);
                return Started::Failed {
                    status: err.exit_code(),
                    start_failure: false,
                };
            }
        };

        let resolution = classify(&stage.name, &self.env);
        log::debug!("stage {:?} resolved to {:?}", stage.name, resolution);
        match resolution {
            Resolution::Builtin(builtin) => {
                self.run_builtin(builtin, stage, input, redirects, is_last, out, workers)
            }
            Resolution::External(path) => {
                self.spawn_external(&path, stage, input, redirects, is_last, out, workers)
            }
            Resolution::Unknown => {
                let err = ShellError::CommandNotFound(stage.name.clone());
                redirects.report(&err);
                input.discard(workers);
                Started::Failed {
                    status: err.exit_code(),
                    start_failure: true,
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run_builtin(
        &mut self,
        builtin: Builtin,
        stage: &StageSpec,
        input: Upstream,
        redirects: OpenedRedirects,
        is_last: bool,
        out: &mut FinalOutput<'_>,
        workers: &mut Workers,
    ) -> Started {
        let mut stdin = input.into_reader();
        let mut stderr: Box<dyn Write> = match redirects.stderr {
            Some(file) => Box::new(file),
            None => Box::new(io::stderr()),
        };
        let args = &stage.args;
        let env = &mut self.env;

        let (status, next) = match redirects.stdout {
            Some(mut file) => (
                builtin.run(args, &mut stdin, &mut file, &mut stderr, env),
                Upstream::Closed,
            ),
            None if !is_last => {
                let mut captured = Vec::new();
                let status = builtin.run(args, &mut stdin, &mut captured, &mut stderr, env);
                (status, Upstream::Buffer(captured))
            }
            None => {
                let status = match out.writer() {
                    Some(w) => builtin.run(args, &mut stdin, w, &mut stderr, env),
                    None => {
                        let mut terminal = io::stdout().lock();
                        builtin.run(args, &mut stdin, &mut terminal, &mut stderr, env)
                    }
                };
                (status, Upstream::Closed)
            }
        };
        let _ = stderr.flush();
        stdin.release(workers);
        Started::Finished { status, next }
    }

    #[allow(clippy::too_many_arguments)]
    fn spawn_external(
        &self,
        path: &Path,
        stage: &StageSpec,
        input: Upstream,
        mut redirects: OpenedRedirects,
        is_last: bool,
        out: &mut FinalOutput<'_>,
        workers: &mut Workers,
    ) -> Started {
        let (stdin, leftover) = input.into_stdio();
        let capture_tail = is_last && out.writer().is_some();
        let stdout = match redirects.stdout.take() {
            Some(file) => Stdio::from(file),
            None if is_last && !capture_tail => Stdio::inherit(),
            None => Stdio::piped(),
        };
        // Keep a handle for reporting a spawn failure on the stage's own stderr.
        let mut report_to = OpenedRedirects {
            stdout: None,
            stderr: redirects.stderr.as_ref().and_then(|f| f.try_clone().ok()),
        };
        let stderr = redirects.stderr.take().map_or_else(Stdio::inherit, Stdio::from);

        let mut command = Command::new(path);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.arg0(&stage.name);
        }
        command
            .args(&stage.args)
            .env_clear()
            .envs(&self.env.vars)
            .current_dir(&self.env.current_dir)
            .stdin(stdin)
            .stdout(stdout)
            .stderr(stderr);

        match command.spawn() {
            Ok(mut child) => {
                log::debug!("spawned {} as pid {}", path.display(), child.id());
                leftover.attach(child.stdin.take(), workers);
                let next = child.stdout.take().map_or(Upstream::Closed, Upstream::Process);
                Started::Spawned { child, next }
            }
            Err(error) => {
                let err = ShellError::Process {
                    name: stage.name.clone(),
                    error,
                };
                report_to.report(&err);
                leftover.abandon(workers);
                Started::Failed {
                    status: err.exit_code(),
                    start_failure: true,
                }
            }
        }
    }

    /// Interactive read-eval loop.
    ///
    /// Reads lines with a `rustyline` editor until end-of-input or `exit`, records
    /// every non-blank line in the history and runs it. Returns the status the
    /// process should exit with.
    pub fn repl(&mut self) -> anyhow::Result<ExitCode> {
        let mut rl: Editor<ShellHelper, DefaultHistory> = Editor::new()?;
        rl.set_helper(Some(ShellHelper::default()));

        self.load_history();
        for (_, line) in self.env.history.list_all() {
            rl.add_history_entry(line)?;
        }

        loop {
            if let Some(helper) = rl.helper_mut() {
                helper.set_search_path(self.env.get_var("PATH"));
            }
            match rl.readline(PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                        self.env.history.record_line(&line);
                    }
                    self.execute_line(&line);
                    if self.env.exit_request.is_some() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    self.terminate();
                    return Err(err.into());
                }
            }
        }

        Ok(self.terminate())
    }

    /// Ends the session: appends new history entries to the history file and
    /// returns the status the process should exit with (the `exit` argument if
    /// one was given, otherwise the last pipeline's status).
    pub fn terminate(&mut self) -> ExitCode {
        if let Some(path) = self.history_file() {
            if let Err(e) = self.env.history.append_to(&path) {
                log::warn!("could not save history: {e}");
            }
        }
        self.env.exit_request.unwrap_or(self.env.last_status)
    }

    fn load_history(&mut self) {
        let Some(path) = self.history_file() else {
            return;
        };
        if !path.exists() {
            return;
        }
        match self.env.history.load(&path) {
            Ok(()) => log::debug!("loaded {} history entries", self.env.history.len()),
            Err(e) => log::warn!("could not load history: {e}"),
        }
    }

    fn history_file(&self) -> Option<PathBuf> {
        self.env
            .get_var("HISTFILE")
            .filter(|p| !p.is_empty())
            .map(|p| self.env.resolve_path(p))
    }
}

impl Default for Interpreter {
    /// Create an interpreter over a snapshot of the current process environment.
    fn default() -> Self {
        Self::new(Environment::new())
    }
}
