//! Run a command line and collect what it prints.
//!
//! This crate is a small embeddable primitive for shelling out. It starts one
//! child process per call, redirects the child's output into a pipe, drains the
//! pipe until the child closes it and reaps the child before returning.
//!
//! The process model differs per platform:
//! - unix: the command line is split into an argument vector by
//!   [`split_into_tokens`] (whitespace separated, double quotes group) and run
//!   with `fork` + `execvp`. Only standard output is captured.
//! - windows: the command line is handed to `CreateProcessA` unchanged and
//!   standard error is merged into the captured output.
//!
//! The main entry point is [`command()`]. [`capture`] returns raw bytes and the
//! reason a command could not be started, and [`Runner`] accepts any
//! [`CaptureBackend`].
//!
//! The child's exit status is never reported. On unix, naming a program that
//! does not exist still yields `Some("")`: the failure happens inside the child
//! after the fork and only shows up on the child's standard error.

pub mod command;
pub mod error;
mod external;
mod io_adapters;
mod lexer;
mod runner;

pub use command::CaptureBackend;
pub use error::LaunchError;
#[cfg(windows)]
pub use external::CreateProcess;
#[cfg(unix)]
pub use external::ForkExec;
pub use external::SystemBackend;
pub use lexer::split_into_tokens;
pub use runner::Runner;

/// Runs `cmd` and returns everything it wrote to standard output.
///
/// Returns `None` when nothing could be started: an empty or all-whitespace
/// command line on unix, an argument with a NUL byte, or an OS failure to
/// create the pipe or the process.
///
/// ```
/// # #[cfg(unix)]
/// # {
/// assert_eq!(shell_capture::command("printf hi").as_deref(), Some("hi"));
/// assert_eq!(shell_capture::command("   "), None);
/// # }
/// ```
pub fn command(cmd: &str) -> Option<String> {
    Runner::<SystemBackend>::default().run(cmd)
}

/// Like [`command`], but returns the raw bytes and the reason for failure.
pub fn capture(cmd: &str) -> Result<Vec<u8>, LaunchError> {
    Runner::<SystemBackend>::default().capture(cmd)
}
