//! A small interactive command shell.
//!
//! A line of input is split into tokens by [`lexer`], grouped into a pipeline of
//! stages with their redirections by [`parser`], and run by [`Interpreter`]. Each
//! stage is either a builtin implemented in Rust (see [`builtin::Builtin`]) or an
//! external program found on `PATH`; stages are connected with OS pipes or, after
//! a builtin, with in-memory buffers.
//!
//! All session state (variables, working directory, history, last status) lives
//! in [`Environment`]; the shell never changes the working directory of its own
//! process.

pub mod builtin;
pub mod command;
mod completion;
pub mod env;
pub mod error;
mod external;
pub mod history;
mod interpreter;
mod io_adapters;
pub mod lexer;
pub mod parser;
pub mod signal;

pub use command::{ExecutionResult, ExitCode, Resolution, classify};
pub use completion::ShellHelper;
pub use env::Environment;
pub use error::ShellError;
pub use external::find_command_path;
pub use interpreter::Interpreter;
