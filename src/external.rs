//! Platform backends that start a child with its output redirected into a
//! pipe and drain that pipe until the child is done.
//!
//! Exactly one backend exists per target:
//! - unix: [`ForkExec`], which tokenizes the command line into an argument
//!   vector and uses `fork` + `execvp`.
//! - windows: [`CreateProcess`], which hands the raw command line to
//!   `CreateProcessA` and merges stderr into the captured stream.

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::ForkExec;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::CreateProcess;

/// The backend used by [`command`](fn@crate::command) on the current target.
#[cfg(unix)]
pub type SystemBackend = ForkExec;

/// The backend used by [`command`](fn@crate::command) on the current target.
#[cfg(windows)]
pub type SystemBackend = CreateProcess;
