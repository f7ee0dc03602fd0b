use crate::env::Environment;
use crate::error::ShellError;
use crate::parser::{RedirectTarget, RedirectionSpec};
use std::fs::{File, OpenOptions};
use std::io::{self, Cursor, Read, Write};
use std::process::{ChildStdin, ChildStdout, Stdio};
use std::thread::{self, JoinHandle};

/// What feeds a stage's standard input.
pub(crate) enum Upstream {
    /// The interactive terminal; only ever used for the first stage.
    Terminal,
    /// Read end of the pipe attached to the previous external stage.
    Process(ChildStdout),
    /// Output captured from a builtin stage.
    Buffer(Vec<u8>),
    /// Immediate end-of-input.
    Closed,
}

impl Upstream {
    /// Converts the input into a handle for a child process.
    ///
    /// Buffered builtin output cannot be handed to a child directly; in that case
    /// the stage gets a pipe and the bytes come back as [`Leftover::Bytes`] for
    /// [`Workers::feed`]. A pipe from an earlier process is duplicated so it can
    /// still be drained if the child never starts.
    pub(crate) fn into_stdio(self) -> (Stdio, Leftover) {
        match self {
            Upstream::Terminal => (Stdio::inherit(), Leftover::Nothing),
            Upstream::Process(out) => pipe_with_spare(out),
            Upstream::Buffer(bytes) => (Stdio::piped(), Leftover::Bytes(bytes)),
            Upstream::Closed => (Stdio::null(), Leftover::Nothing),
        }
    }

    /// Wraps the input for an in-process builtin.
    pub(crate) fn into_reader(self) -> StageReader {
        match self {
            Upstream::Terminal => StageReader::Terminal(io::stdin()),
            Upstream::Process(out) => StageReader::Process(out),
            Upstream::Buffer(bytes) => StageReader::Memory(Cursor::new(bytes)),
            Upstream::Closed => StageReader::Empty,
        }
    }

    /// Throws the input away without stalling the producer.
    pub(crate) fn discard(self, workers: &mut Workers) {
        self.into_reader().release(workers);
    }
}

/// Part of a stage's input the engine still owns after handing a [`Stdio`] to
/// the child.
pub(crate) enum Leftover {
    Nothing,
    /// Builtin output still to be written into the child's stdin.
    Bytes(Vec<u8>),
    /// Second read end of the upstream pipe.
    Pipe(File),
}

impl Leftover {
    /// Wires the leftover into a child that started.
    pub(crate) fn attach(self, stdin: Option<ChildStdin>, workers: &mut Workers) {
        if let (Leftover::Bytes(bytes), Some(stdin)) = (self, stdin) {
            workers.feed(stdin, bytes);
        }
    }

    /// Disposes of the input of a child that failed to start, letting the
    /// producer run to completion.
    pub(crate) fn abandon(self, workers: &mut Workers) {
        if let Leftover::Pipe(spare) = self {
            workers.drain(spare);
        }
    }
}

#[cfg(unix)]
fn pipe_with_spare(out: ChildStdout) -> (Stdio, Leftover) {
    use std::os::fd::OwnedFd;
    let fd = OwnedFd::from(out);
    match fd.try_clone() {
        Ok(spare) => (Stdio::from(fd), Leftover::Pipe(File::from(spare))),
        Err(e) => {
            log::debug!("duplicating stage input failed: {e}");
            (Stdio::from(fd), Leftover::Nothing)
        }
    }
}

#[cfg(not(unix))]
fn pipe_with_spare(out: ChildStdout) -> (Stdio, Leftover) {
    (Stdio::from(out), Leftover::Nothing)
}

/// Standard input of a builtin stage.
pub(crate) enum StageReader {
    Terminal(io::Stdin),
    Process(ChildStdout),
    Memory(Cursor<Vec<u8>>),
    Empty,
}

impl StageReader {
    /// Hands whatever the builtin left unread to a background drain, so an
    /// upstream process runs to completion instead of blocking on a full pipe.
    pub(crate) fn release(self, workers: &mut Workers) {
        if let StageReader::Process(out) = self {
            workers.drain(out);
        }
    }
}

impl Read for StageReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            StageReader::Terminal(stdin) => stdin.read(buf),
            StageReader::Process(out) => out.read(buf),
            StageReader::Memory(cursor) => cursor.read(buf),
            StageReader::Empty => Ok(0),
        }
    }
}

/// Helper threads spawned while wiring a pipeline.
///
/// Every thread is joined by [`Workers::join`] before the pipeline is reported
/// as finished.
#[derive(Default)]
pub(crate) struct Workers {
    handles: Vec<JoinHandle<()>>,
}

impl Workers {
    /// Writes builtin output into a child's stdin, then closes it.
    pub(crate) fn feed(&mut self, mut stdin: ChildStdin, bytes: Vec<u8>) {
        self.handles.push(thread::spawn(move || {
            match stdin.write_all(&bytes) {
                Ok(()) => {}
                // The consumer exited early; this is how a producer normally ends.
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                Err(e) => log::debug!("feeding stage input failed: {e}"),
            }
        }));
    }

    /// Reads `source` until end-of-input and discards the bytes.
    pub(crate) fn drain(&mut self, mut source: impl Read + Send + 'static) {
        self.handles.push(thread::spawn(move || {
            if let Err(e) = io::copy(&mut source, &mut io::sink()) {
                log::debug!("draining stage output failed: {e}");
            }
        }));
    }

    pub(crate) fn join(self) {
        for handle in self.handles {
            if handle.join().is_err() {
                log::warn!("pipeline helper thread panicked");
            }
        }
    }
}

/// Redirection targets of one stage, opened and owned by that stage.
#[derive(Default)]
pub(crate) struct OpenedRedirects {
    pub(crate) stdout: Option<File>,
    pub(crate) stderr: Option<File>,
}

impl OpenedRedirects {
    /// Opens (creating when needed) every target of `spec`, relative to the
    /// session directory.
    pub(crate) fn open(spec: &RedirectionSpec, env: &Environment) -> Result<Self, ShellError> {
        let stdout = spec
            .stdout
            .as_ref()
            .map(|target| open_target(target, env))
            .transpose()?;
        let stderr = spec
            .stderr
            .as_ref()
            .map(|target| open_target(target, env))
            .transpose()?;
        Ok(Self { stdout, stderr })
    }

    /// Reports an error on this stage's stderr (the redirect file if any).
    pub(crate) fn report(&mut self, err: &ShellError) {
        match self.stderr.as_mut() {
            Some(file) => {
                let _ = writeln!(file, "{err}");
            }
            None => eprintln!("{err}"),
        }
    }
}

fn open_target(target: &RedirectTarget, env: &Environment) -> Result<File, ShellError> {
    let path = env.resolve_path(&target.path);
    let mut options = OpenOptions::new();
    options.create(true);
    if target.append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    options.open(&path).map_err(|e| ShellError::io(path, e))
}
