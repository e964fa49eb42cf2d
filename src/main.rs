use anyhow::Result;
use argh::FromArgs;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[cfg(windows)]
const SAMPLE_COMMAND: &str = "cmd.exe /c dir";
#[cfg(not(windows))]
const SAMPLE_COMMAND: &str = "ls -l";

/// Run a command line and print what it wrote to standard output.
#[derive(FromArgs)]
struct Args {
    /// command line to run; defaults to a directory listing
    #[argh(positional)]
    command: Option<String>,

    /// read command lines interactively instead
    #[argh(switch, short = 'i')]
    interactive: bool,

    /// log filter used when RUST_LOG is not set
    #[argh(option, default = "String::from(\"warn\")")]
    log_level: String,
}

fn main() -> Result<ExitCode> {
    let args: Args = argh::from_env();
    init_logging(&args.log_level);

    if args.interactive {
        repl()?;
        return Ok(ExitCode::SUCCESS);
    }

    let line = args.command.as_deref().unwrap_or(SAMPLE_COMMAND);
    Ok(if print_result(line) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_logging(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Returns false when the command could not be started.
fn print_result(line: &str) -> bool {
    match shell_capture::command(line) {
        Some(output) => {
            println!("Output:\n{}", output);
            true
        }
        None => {
            println!("Failed to execute command.");
            false
        }
    }
}

fn repl() -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline("$ ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                rl.add_history_entry(line.as_str())?;
                print_result(&line);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}
