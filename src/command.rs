use crate::error::LaunchError;

/// A way of running one command line and collecting its standard output.
///
/// Each platform has exactly one implementation, selected at compile time and
/// exported as [`SystemBackend`](crate::SystemBackend). Every call owns its own
/// pipe and child process, so implementations hold no shared mutable state and
/// may be used from several threads at once.
pub trait CaptureBackend {
    /// Runs `command` to completion and returns every byte it wrote to its
    /// output stream.
    ///
    /// Blocks until the child closes its output and has been reaped. The
    /// child's exit status is not reported.
    fn spawn_and_capture(&self, command: &str) -> Result<Vec<u8>, LaunchError>;
}

impl<B: CaptureBackend + ?Sized> CaptureBackend for &B {
    fn spawn_and_capture(&self, command: &str) -> Result<Vec<u8>, LaunchError> {
        (**self).spawn_and_capture(command)
    }
}

impl<B: CaptureBackend + ?Sized> CaptureBackend for Box<B> {
    fn spawn_and_capture(&self, command: &str) -> Result<Vec<u8>, LaunchError> {
        (**self).spawn_and_capture(command)
    }
}
