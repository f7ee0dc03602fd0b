use argh::FromArgs;
use minishell::{Environment, Interpreter};

/// Interactive command shell.
#[derive(FromArgs)]
struct Args {
    /// run a single command line and exit with its status
    #[argh(option, short = 'c')]
    command: Option<String>,

    /// file to load history from and append new history to (overrides $HISTFILE)
    #[argh(option)]
    histfile: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("MINISHELL_LOG", "warn"))
        .init();
    let args: Args = argh::from_env();

    let mut env = Environment::new();
    if let Some(path) = args.histfile {
        env.set_var("HISTFILE", path);
    }
    let mut sh = Interpreter::new(env);

    let code = match args.command {
        Some(line) => {
            sh.execute_line(&line);
            sh.terminate()
        }
        None => {
            if let Err(e) = minishell::signal::install_interrupt_handler() {
                log::warn!("could not install SIGINT handler: {e}");
            }
            sh.repl()?
        }
    };
    std::process::exit(code);
}
