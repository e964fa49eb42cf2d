use crate::command::CaptureBackend;
use crate::error::LaunchError;
use crate::external::SystemBackend;
use tracing::warn;

/// Runs command lines through a [`CaptureBackend`] and hands back their output.
///
/// The default runner uses [`SystemBackend`], the backend for the current platform. A custom
/// backend can be injected with [`Runner::new`], which is mostly useful in tests.
///
/// Example
/// ```
/// use shell_capture::Runner;
/// # #[cfg(unix)]
/// # {
/// let runner: Runner = Runner::default();
/// let out = runner.run("echo hello").unwrap();
/// assert_eq!(out, "hello\n");
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Runner<B = SystemBackend> {
    backend: B,
}

impl<B: CaptureBackend> Runner<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Runs `command` and returns its raw output.
    ///
    /// The error says why nothing could be started; see [`LaunchError`].
    pub fn capture(&self, command: &str) -> Result<Vec<u8>, LaunchError> {
        self.backend.spawn_and_capture(command).inspect_err(|e| {
            warn!(command, error = %e, "command was not started");
        })
    }

    /// Runs `command` and returns its output as text, or `None` if it could not
    /// be started at all.
    ///
    /// Invalid UTF-8 in the output is replaced with U+FFFD.
    pub fn run(&self, command: &str) -> Option<String> {
        let bytes = self.capture(command).ok()?;
        Some(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records every command line and answers with a canned result.
    struct Recording {
        calls: RefCell<Vec<String>>,
        reply: fn() -> Result<Vec<u8>, LaunchError>,
    }

    impl Recording {
        fn new(reply: fn() -> Result<Vec<u8>, LaunchError>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                reply,
            }
        }
    }

    impl CaptureBackend for Recording {
        fn spawn_and_capture(&self, command: &str) -> Result<Vec<u8>, LaunchError> {
            self.calls.borrow_mut().push(command.to_string());
            (self.reply)()
        }
    }

    #[test]
    fn test_run_passes_command_line_through() {
        let backend = Recording::new(|| Ok(b"listing\n".to_vec()));
        let runner = Runner::new(&backend);
        assert_eq!(runner.run(r#"ls -l "my dir""#).as_deref(), Some("listing\n"));
        assert_eq!(*backend.calls.borrow(), vec![r#"ls -l "my dir""#.to_string()]);
    }

    #[test]
    fn test_launch_error_becomes_none() {
        let runner = Runner::new(Recording::new(|| Err(LaunchError::EmptyCommand)));
        assert_eq!(runner.run(""), None);
        assert!(matches!(runner.capture(""), Err(LaunchError::EmptyCommand)));
    }

    #[test]
    fn test_empty_output_is_some() {
        let runner = Runner::new(Recording::new(|| Ok(Vec::new())));
        assert_eq!(runner.run("true").as_deref(), Some(""));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let runner = Runner::new(Recording::new(|| Ok(vec![b'o', b'k', 0xff])));
        assert_eq!(runner.run("x").as_deref(), Some("ok\u{fffd}"));
        assert_eq!(runner.capture("x").unwrap(), vec![b'o', b'k', 0xff]);
    }

    #[test]
    fn test_boxed_backend() {
        let backend: Box<dyn CaptureBackend> = Box::new(Recording::new(|| Ok(b"boxed".to_vec())));
        assert_eq!(Runner::new(backend).run("anything").as_deref(), Some("boxed"));
    }
}
