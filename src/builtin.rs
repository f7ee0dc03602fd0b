use crate::command::{EXIT_FAILURE, EXIT_SUCCESS, EXIT_USAGE, ExitCode, Resolution, classify};
use crate::env::Environment;
use crate::error::ShellError;
use crate::lexer::interpret_escapes;
use anyhow::{Result, anyhow};
use argh::{EarlyExit, FromArgs};
use std::fs;
use std::io::{self, Read, Write};
use std::process::{Command, Stdio};
use std::thread;

/// The commands implemented in-process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Cd,
    Echo,
    Exit,
    History,
    Pwd,
    Search,
    Type,
}

impl Builtin {
    pub const ALL: [Builtin; 7] = [
        Builtin::Cd,
        Builtin::Echo,
        Builtin::Exit,
        Builtin::History,
        Builtin::Pwd,
        Builtin::Search,
        Builtin::Type,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Cd => Cd::name(),
            Builtin::Echo => Echo::name(),
            Builtin::Exit => Exit::name(),
            Builtin::History => History::name(),
            Builtin::Pwd => Pwd::name(),
            Builtin::Search => Search::name(),
            Builtin::Type => Type::name(),
        }
    }

    /// Parses `args` for this builtin and runs it against the given streams.
    ///
    /// Errors are reported on `stderr` and turned into a status; this never fails.
    pub fn run(
        self,
        args: &[String],
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> ExitCode {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let streams = Streams {
            stdin,
            stdout,
            stderr,
        };
        match self {
            Builtin::Cd => invoke::<Cd>(&args, streams, env),
            Builtin::Echo => invoke::<Echo>(&args, streams, env),
            Builtin::Exit => invoke::<Exit>(&args, streams, env),
            Builtin::History => invoke::<History>(&args, streams, env),
            Builtin::Pwd => invoke::<Pwd>(&args, streams, env),
            Builtin::Search => invoke::<Search>(&args, streams, env),
            Builtin::Type => invoke::<Type>(&args, streams, env),
        }
    }
}

struct Streams<'a> {
    stdin: &'a mut dyn Read,
    stdout: &'a mut dyn Write,
    stderr: &'a mut dyn Write,
}

/// Built-in commands known to the shell at compile time.
///
/// Arguments are parsed with [`argh`] (`FromArgs`) and the command runs
/// directly in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    /// Executes the command using provided IO streams and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode>;
}

fn invoke<T: BuiltinCommand>(args: &[&str], io: Streams<'_>, env: &mut Environment) -> ExitCode {
    let Streams {
        stdin,
        stdout,
        stderr,
    } = io;
    let cmd = match T::from_args(&[T::name()], args) {
        Ok(cmd) => cmd,
        Err(EarlyExit { output, status }) => {
            return if status.is_ok() {
                let _ = stdout.write_all(output.as_bytes());
                EXIT_SUCCESS
            } else {
                let _ = stderr.write_all(output.as_bytes());
                EXIT_USAGE
            };
        }
    };
    let code = match cmd.execute(stdin, stdout, stderr, env) {
        Ok(code) => code,
        Err(e) => {
            let _ = writeln!(stderr, "{e:#}");
            e.downcast_ref::<ShellError>()
                .map_or(EXIT_FAILURE, ShellError::exit_code)
        }
    };
    let _ = stdout.flush();
    code
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        writeln!(stdout, "{}", env.current_dir.display())?;
        Ok(EXIT_SUCCESS)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute, relative to the current directory, or starting with `~`.
    pub target: Option<String>,
}

fn describe(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => "No such file or directory".to_string(),
        io::ErrorKind::PermissionDenied => "Permission denied".to_string(),
        _ => err.to_string(),
    }
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let (shown, new_dir) = match self.target.as_deref() {
            None | Some("") => match env.home_dir() {
                Some(home) => (home.display().to_string(), home),
                None => return Err(anyhow!("cd: HOME not set")),
            },
            Some(t) => (t.to_string(), env.resolve_path(t)),
        };

        let canonical = fs::canonicalize(&new_dir).map_err(|e| ShellError::Directory {
            path: shown.clone(),
            reason: describe(&e),
        })?;
        if !canonical.is_dir() {
            return Err(ShellError::Directory {
                path: shown,
                reason: "Not a directory".to_string(),
            }
            .into());
        }

        log::debug!("cd: {} -> {}", env.current_dir.display(), canonical.display());
        env.current_dir = canonical;
        Ok(EXIT_SUCCESS)
    }
}

/// write the arguments to standard output, separated by spaces.
/// by default, a trailing newline is printed.
///
/// Leading `-n`, `-e` and `-E` words (or combinations like `-ne`) are flags;
/// everything after the first other word is printed as-is.
pub struct Echo {
    /// do not output the trailing newline.
    pub no_newline: bool,
    /// interpret backslash escapes such as `\n` and `\t`.
    pub interpret: bool,
    /// values to print, separated by spaces.
    pub args: Vec<String>,
}

impl FromArgs for Echo {
    fn from_args(_command_name: &[&str], args: &[&str]) -> Result<Self, EarlyExit> {
        let mut echo = Echo {
            no_newline: false,
            interpret: false,
            args: Vec::new(),
        };
        let mut rest = args;
        while let Some((first, tail)) = rest.split_first() {
            let Some(flags) = first.strip_prefix('-') else {
                break;
            };
            if flags.is_empty() || !flags.chars().all(|c| matches!(c, 'n' | 'e' | 'E')) {
                break;
            }
            for flag in flags.chars() {
                match flag {
                    'n' => echo.no_newline = true,
                    'e' => echo.interpret = true,
                    _ => echo.interpret = false,
                }
            }
            rest = tail;
        }
        echo.args = rest.iter().map(|s| s.to_string()).collect();
        Ok(echo)
    }
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        let joined = self.args.join(" ");
        let s = if self.interpret {
            interpret_escapes(&joined)
        } else {
            joined
        };
        if self.no_newline {
            write!(stdout, "{}", s)?;
        } else {
            writeln!(stdout, "{}", s)?;
        }
        Ok(EXIT_SUCCESS)
    }
}

#[derive(FromArgs)]
/// Display how each name would be interpreted if used as a command.
pub struct Type {
    #[argh(positional)]
    /// command names to look up.
    pub names: Vec<String>,
}

impl BuiltinCommand for Type {
    fn name() -> &'static str {
        "type"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        if self.names.is_empty() {
            return Err(anyhow!("type: missing argument"));
        }
        let mut code = EXIT_SUCCESS;
        for name in &self.names {
            match classify(name, env) {
                Resolution::Builtin(_) => writeln!(stdout, "{name} is a shell builtin")?,
                Resolution::External(path) => writeln!(stdout, "{name} is {}", path.display())?,
                Resolution::Unknown => {
                    writeln!(stderr, "{name}: not found")?;
                    code = EXIT_FAILURE;
                }
            }
        }
        Ok(code)
    }
}

#[derive(FromArgs)]
/// Display or manipulate the command history.
pub struct History {
    #[argh(option, short = 'r')]
    /// append the lines of a file to the history.
    pub read: Option<String>,

    #[argh(option, short = 'w')]
    /// write the whole history to a file, replacing its contents.
    pub write: Option<String>,

    #[argh(option, short = 'a')]
    /// append entries not yet appended to a file.
    pub append: Option<String>,

    #[argh(positional)]
    /// show only the last N entries.
    pub count: Option<usize>,
}

impl BuiltinCommand for History {
    fn name() -> &'static str {
        "history"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let file_op = self.read.is_some() || self.write.is_some() || self.append.is_some();
        if let Some(path) = &self.read {
            let path = env.resolve_path(path);
            env.history.read_from(&path).map_err(with_prefix)?;
        }
        if let Some(path) = &self.write {
            let path = env.resolve_path(path);
            env.history.write_to(&path).map_err(with_prefix)?;
        }
        if let Some(path) = &self.append {
            let path = env.resolve_path(path);
            env.history.append_to(&path).map_err(with_prefix)?;
        }
        if file_op {
            return Ok(EXIT_SUCCESS);
        }

        let skip = self
            .count
            .map_or(0, |n| env.history.len().saturating_sub(n));
        for (index, line) in env.history.list_all().skip(skip) {
            writeln!(stdout, "{index:>5}  {line}")?;
        }
        Ok(EXIT_SUCCESS)
    }
}

fn with_prefix(err: ShellError) -> anyhow::Error {
    anyhow::Error::new(err).context("history")
}

#[derive(FromArgs)]
/// Exit the shell.
pub struct Exit {
    #[argh(positional)]
    /// exit status; defaults to the status of the last command.
    pub code: Option<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let code = match self.code.as_deref() {
            None => env.last_status,
            Some(raw) => match raw.parse::<ExitCode>() {
                Ok(code) => code,
                Err(_) => {
                    writeln!(stderr, "exit: {raw}: numeric argument required")?;
                    EXIT_USAGE
                }
            },
        };
        env.exit_request = Some(code);
        Ok(code)
    }
}

#[derive(FromArgs)]
/// Search the web for the given words.
pub struct Search {
    #[argh(positional, greedy)]
    /// words of the query.
    pub query: Vec<String>,
}

const SEARCH_URL: &str = "https://www.google.com/search?q=";

fn search_url(query: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
    format!("{SEARCH_URL}{encoded}")
}

impl BuiltinCommand for Search {
    fn name() -> &'static str {
        "search"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        if self.query.is_empty() {
            return Err(anyhow!("search: missing query"));
        }
        let query = self.query.join(" ");
        let url = search_url(&query);
        writeln!(stdout, "Searching web for: '{query}'...")?;
        writeln!(stdout, "{url}")?;

        let Some(browser) = env.get_var("BROWSER").filter(|b| !b.is_empty()) else {
            return Ok(EXIT_SUCCESS);
        };
        let mut child = Command::new(&browser)
            .arg(&url)
            .current_dir(&env.current_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| anyhow!("search: {browser}: {e}"))?;
        // The browser may stay open; reap it off the prompt's thread.
        thread::spawn(move || {
            if let Err(e) = child.wait() {
                log::debug!("waiting for {browser} failed: {e}");
            }
        });
        Ok(EXIT_SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn env_in(dir: PathBuf) -> Environment {
        Environment::with_vars(HashMap::new(), dir)
    }

    fn run(builtin: Builtin, args: &[&str], env: &mut Environment) -> (ExitCode, String, String) {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = builtin.run(&args, &mut Cursor::new(Vec::new()), &mut out, &mut err, env);
        (
            code,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_registry_names_round_trip() {
        for builtin in Builtin::ALL {
            assert_eq!(Builtin::from_name(builtin.name()), Some(builtin));
        }
        assert_eq!(Builtin::from_name("ls"), None);
        assert_eq!(Builtin::from_name("CD"), None);
    }

    #[test]
    fn test_pwd_prints_current_dir() {
        let mut env = env_in(PathBuf::from("/some/where"));

        let mut out = Vec::new();
        let cmd = Pwd {};
        let res = cmd.execute(&mut Cursor::new(Vec::new()), &mut out, &mut Vec::new(), &mut env);

        assert_eq!(res.unwrap(), 0);
        assert_eq!(String::from_utf8(out).unwrap(), "/some/where\n");
    }

    #[test]
    fn test_echo_with_and_without_newline() {
        let mut env = env_in(PathBuf::from("/"));

        let (code, out, _) = run(Builtin::Echo, &["hello", "world"], &mut env);
        assert_eq!(code, 0);
        assert_eq!(out, "hello world\n");

        let (_, out, _) = run(Builtin::Echo, &["-n", "foo", "bar"], &mut env);
        assert_eq!(out, "foo bar");
    }

    #[test]
    fn test_echo_interprets_escapes_with_e() {
        let mut env = env_in(PathBuf::from("/"));

        let (_, out, _) = run(Builtin::Echo, &["-e", r"apple\nbanana\ncherry"], &mut env);
        assert_eq!(out, "apple\nbanana\ncherry\n");

        let (_, out, _) = run(Builtin::Echo, &[r"apple\nbanana"], &mut env);
        assert_eq!(out, "apple\\nbanana\n");

        let (_, out, _) = run(Builtin::Echo, &["-ne", r"a\tb"], &mut env);
        assert_eq!(out, "a\tb");
    }

    #[test]
    fn test_echo_flags_stop_at_first_word() {
        let mut env = env_in(PathBuf::from("/"));

        let (_, out, _) = run(Builtin::Echo, &["-x", "-n"], &mut env);
        assert_eq!(out, "-x -n\n");

        let (_, out, _) = run(Builtin::Echo, &["hi", "-n"], &mut env);
        assert_eq!(out, "hi -n\n");

        let (_, out, _) = run(Builtin::Echo, &["-"], &mut env);
        assert_eq!(out, "-\n");
    }

    #[test]
    fn test_cd_to_absolute_path() {
        let temp = tempfile::tempdir().unwrap();
        let canonical_temp = fs::canonicalize(temp.path()).unwrap();
        let orig = std::env::current_dir().unwrap();
        let mut env = env_in(PathBuf::from("/"));

        let target = Some(canonical_temp.to_string_lossy().to_string());
        let res = Cd { target }.execute(
            &mut Cursor::new(Vec::new()),
            &mut Vec::new(),
            &mut Vec::new(),
            &mut env,
        );

        assert!(res.is_ok());
        assert_eq!(env.current_dir, canonical_temp);
        // The process directory is left alone.
        assert_eq!(std::env::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_cd_relative_and_parent() {
        let temp = tempfile::tempdir().unwrap();
        let base = fs::canonicalize(temp.path()).unwrap();
        fs::create_dir(base.join("inner")).unwrap();
        let mut env = env_in(base.clone());

        let (code, _, _) = run(Builtin::Cd, &["inner"], &mut env);
        assert_eq!(code, 0);
        assert_eq!(env.current_dir, base.join("inner"));

        let (code, _, _) = run(Builtin::Cd, &[".."], &mut env);
        assert_eq!(code, 0);
        assert_eq!(env.current_dir, base);
    }

    #[test]
    fn test_cd_to_home_when_none_or_tilde() {
        let temp = tempfile::tempdir().unwrap();
        let home = fs::canonicalize(temp.path()).unwrap();
        fs::create_dir(home.join("docs")).unwrap();

        let mut env = env_in(PathBuf::from("/"));
        env.set_var("HOME", home.to_string_lossy().to_string());

        let (code, _, _) = run(Builtin::Cd, &[], &mut env);
        assert_eq!(code, 0);
        assert_eq!(env.current_dir, home);

        env.current_dir = PathBuf::from("/");
        let (code, _, _) = run(Builtin::Cd, &["~"], &mut env);
        assert_eq!(code, 0);
        assert_eq!(env.current_dir, home);

        let (code, _, _) = run(Builtin::Cd, &["~/docs"], &mut env);
        assert_eq!(code, 0);
        assert_eq!(env.current_dir, home.join("docs"));
    }

    #[test]
    fn test_cd_without_home_fails() {
        let mut env = env_in(PathBuf::from("/"));
        let (code, _, err) = run(Builtin::Cd, &[], &mut env);
        assert_eq!(code, 1);
        assert_eq!(err, "cd: HOME not set\n");
        assert_eq!(env.current_dir, PathBuf::from("/"));
    }

    #[test]
    fn test_cd_nonexistent_path_errors() {
        let temp = tempfile::tempdir().unwrap();
        let orig = fs::canonicalize(temp.path()).unwrap();
        let mut env = env_in(orig.clone());

        let res = Cd {
            target: Some("/nonexistent".to_string()),
        }
        .execute(
            &mut Cursor::new(Vec::new()),
            &mut Vec::new(),
            &mut Vec::new(),
            &mut env,
        );

        let err = res.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ShellError>(),
            Some(ShellError::Directory { .. })
        ));
        assert_eq!(env.current_dir, orig);

        let (code, _, err) = run(Builtin::Cd, &["/nonexistent"], &mut env);
        assert_eq!(code, 1);
        assert_eq!(err, "cd: /nonexistent: No such file or directory\n");
    }

    #[test]
    fn test_cd_into_file_errors() {
        let temp = tempfile::tempdir().unwrap();
        let base = fs::canonicalize(temp.path()).unwrap();
        fs::write(base.join("plain.txt"), "x").unwrap();
        let mut env = env_in(base.clone());

        let (code, _, err) = run(Builtin::Cd, &["plain.txt"], &mut env);
        assert_eq!(code, 1);
        assert_eq!(err, "cd: plain.txt: Not a directory\n");
        assert_eq!(env.current_dir, base);
    }

    #[test]
    fn test_cd_rejects_extra_arguments() {
        let mut env = env_in(PathBuf::from("/"));
        let (code, _, err) = run(Builtin::Cd, &["/tmp", "/usr"], &mut env);
        assert_eq!(code, EXIT_USAGE);
        assert!(!err.is_empty());
        assert_eq!(env.current_dir, PathBuf::from("/"));
    }

    #[test]
    #[cfg(unix)]
    fn test_type_reports_each_category() {
        let mut env = env_in(PathBuf::from("/"));
        env.set_var("PATH", "/bin:/usr/bin");

        let (code, out, _) = run(Builtin::Type, &["cd"], &mut env);
        assert_eq!(code, 0);
        assert_eq!(out, "cd is a shell builtin\n");

        let (code, out, _) = run(Builtin::Type, &["sh"], &mut env);
        assert_eq!(code, 0);
        assert_eq!(out, "sh is /bin/sh\n");

        let (code, out, err) = run(Builtin::Type, &["nosuchcmd123"], &mut env);
        assert_eq!(code, 1);
        assert_eq!(out, "");
        assert_eq!(err, "nosuchcmd123: not found\n");
    }

    #[test]
    fn test_type_requires_argument() {
        let mut env = env_in(PathBuf::from("/"));
        let (code, _, err) = run(Builtin::Type, &[], &mut env);
        assert_eq!(code, 1);
        assert_eq!(err, "type: missing argument\n");
    }

    #[test]
    fn test_history_lists_with_indices() {
        let mut env = env_in(PathBuf::from("/"));
        env.history.record_line("echo one");
        env.history.record_line("pwd");
        env.history.record_line("history");

        let (code, out, _) = run(Builtin::History, &[], &mut env);
        assert_eq!(code, 0);
        assert_eq!(out, "    1  echo one\n    2  pwd\n    3  history\n");

        let (_, out, _) = run(Builtin::History, &["2"], &mut env);
        assert_eq!(out, "    2  pwd\n    3  history\n");
    }

    #[test]
    fn test_history_write_and_read_files() {
        let temp = tempfile::tempdir().unwrap();
        let mut env = env_in(temp.path().to_path_buf());
        env.history.record_line("echo one");
        env.history.record_line("echo two");

        let (code, out, _) = run(Builtin::History, &["-w", "saved"], &mut env);
        assert_eq!(code, 0);
        assert_eq!(out, "");
        assert_eq!(
            fs::read_to_string(temp.path().join("saved")).unwrap(),
            "echo one\necho two\n"
        );

        let mut fresh = env_in(temp.path().to_path_buf());
        let (code, _, _) = run(Builtin::History, &["-r", "saved"], &mut fresh);
        assert_eq!(code, 0);
        assert_eq!(fresh.history, {
            let mut expected = crate::history::HistoryLog::default();
            expected.record_line("echo one");
            expected.record_line("echo two");
            expected
        });
    }

    #[test]
    fn test_history_append_and_missing_file() {
        let temp = tempfile::tempdir().unwrap();
        let mut env = env_in(temp.path().to_path_buf());
        env.history.record_line("first");

        let (code, _, _) = run(Builtin::History, &["-a", "log"], &mut env);
        assert_eq!(code, 0);
        env.history.record_line("second");
        run(Builtin::History, &["-a", "log"], &mut env);
        assert_eq!(
            fs::read_to_string(temp.path().join("log")).unwrap(),
            "first\nsecond\n"
        );

        let (code, _, err) = run(Builtin::History, &["-r", "missing"], &mut env);
        assert_eq!(code, 1);
        assert!(err.starts_with("history: "), "unexpected: {err}");
    }

    #[test]
    fn test_exit_records_request() {
        let mut env = env_in(PathBuf::from("/"));
        env.last_status = 3;

        let (code, _, _) = run(Builtin::Exit, &[], &mut env);
        assert_eq!(code, 3);
        assert_eq!(env.exit_request, Some(3));

        let (code, _, _) = run(Builtin::Exit, &["42"], &mut env);
        assert_eq!(code, 42);
        assert_eq!(env.exit_request, Some(42));

        let (code, _, err) = run(Builtin::Exit, &["soon"], &mut env);
        assert_eq!(code, EXIT_USAGE);
        assert_eq!(err, "exit: soon: numeric argument required\n");
    }

    #[test]
    fn test_search_prints_encoded_url() {
        let mut env = env_in(PathBuf::from("/"));

        let (code, out, _) = run(Builtin::Search, &["rust", "pipes", "&", "c++"], &mut env);
        assert_eq!(code, 0);
        assert_eq!(
            out,
            "Searching web for: 'rust pipes & c++'...\n\
             https://www.google.com/search?q=rust+pipes+%26+c%2B%2B\n"
        );

        let (code, _, err) = run(Builtin::Search, &[], &mut env);
        assert_eq!(code, 1);
        assert_eq!(err, "search: missing query\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_search_does_not_wait_for_browser() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::{Duration, Instant};

        let dir = tempfile::tempdir().unwrap();
        let browser = dir.path().join("browser");
        fs::write(&browser, "#!/bin/sh\nsleep 3\n").unwrap();
        fs::set_permissions(&browser, fs::Permissions::from_mode(0o755)).unwrap();
        let mut env = env_in(dir.path().to_path_buf());
        env.set_var("BROWSER", browser.display().to_string());

        let started = Instant::now();
        let (code, out, _) = run(Builtin::Search, &["rust"], &mut env);
        assert_eq!(code, 0);
        assert!(out.ends_with("https://www.google.com/search?q=rust\n"));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
