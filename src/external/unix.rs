use crate::command::CaptureBackend;
use crate::error::LaunchError;
use crate::io_adapters::CaptureBuffer;
use crate::lexer::split_into_tokens;
use nix::errno::Errno;
use nix::sys::wait::waitpid;
use nix::unistd::{ForkResult, Pid, fork};
use std::ffi::{CStr, CString, c_char};
use std::fs::File;
use std::io::{self, Write};
use std::mem::ManuallyDrop;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::ptr;
use tracing::{debug, warn};

const STAGING_SIZE: usize = 1024;

/// Exit status of a child whose program could not be executed, as in POSIX shells.
const EXEC_FAILED: i32 = 127;

/// Runs commands with `fork` and `execvp`, looking the program up in `PATH`.
///
/// The command line is split with [`split_into_tokens`]. Only the child's
/// standard output is captured; its standard error stays attached to ours.
///
/// A program that cannot be executed is reported on the child's standard error
/// and the call still succeeds with whatever was captured, normally nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct ForkExec;

impl CaptureBackend for ForkExec {
    fn spawn_and_capture(&self, command: &str) -> Result<Vec<u8>, LaunchError> {
        let tokens = split_into_tokens(command);
        if tokens.is_empty() {
            return Err(LaunchError::EmptyCommand);
        }
        debug!(program = %tokens[0], args = tokens.len() - 1, "launching command");
        let argv = ArgumentVector::new(tokens)?;
        launch(&argv)
    }
}

/// Tokens as C strings plus the null-terminated pointer array `execvp` reads.
///
/// Built before `fork` so the child never has to allocate.
struct ArgumentVector {
    args: Vec<CString>,
    ptrs: Vec<*const c_char>,
}

impl ArgumentVector {
    fn new(tokens: Vec<String>) -> Result<Self, LaunchError> {
        let args = tokens
            .into_iter()
            .map(|token| {
                CString::new(token).map_err(|e| LaunchError::InteriorNul {
                    argument: String::from_utf8_lossy(&e.into_vec()).into_owned(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        // The pointers target the strings' heap buffers, which stay put when `args` moves.
        let ptrs = args
            .iter()
            .map(|arg| arg.as_ptr())
            .chain(std::iter::once(ptr::null()))
            .collect();
        Ok(Self { args, ptrs })
    }

    fn program(&self) -> &CStr {
        &self.args[0]
    }
}

fn launch(argv: &ArgumentVector) -> Result<Vec<u8>, LaunchError> {
    let (read_end, write_end) = cloexec_pipe().map_err(LaunchError::Pipe)?;

    // SAFETY: until exec or _exit the child only closes descriptors, calls
    // dup2/fcntl and writes to fd 2, all async-signal-safe.
    match unsafe { fork() } {
        Err(errno) => Err(LaunchError::Fork(errno.into())),
        Ok(ForkResult::Child) => exec_child(argv, read_end, write_end),
        Ok(ForkResult::Parent { child }) => {
            // Must be closed here or the read loop never sees end of stream.
            drop(write_end);
            collect_output(child, read_end)
        }
    }
}

/// Creates the output pipe with close-on-exec set on both ends, so children
/// forked concurrently by other threads cannot keep our write end open.
#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
fn cloexec_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    use nix::fcntl::OFlag;
    Ok(nix::unistd::pipe2(OFlag::O_CLOEXEC)?)
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
)))]
fn cloexec_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    let (read_end, write_end) = nix::unistd::pipe()?;
    set_cloexec(read_end.as_raw_fd(), true)?;
    set_cloexec(write_end.as_raw_fd(), true)?;
    Ok((read_end, write_end))
}

fn set_cloexec(fd: RawFd, on: bool) -> io::Result<()> {
    // SAFETY: fcntl on a descriptor owned by the caller.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
    if flags == -1 {
        return Err(io::Error::last_os_error());
    }
    let flags = if on {
        flags | libc::FD_CLOEXEC
    } else {
        flags & !libc::FD_CLOEXEC
    };
    // SAFETY: as above.
    if unsafe { libc::fcntl(fd, libc::F_SETFD, flags) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Child side of the fork: becomes the requested program or exits with
/// [`EXEC_FAILED`]. Never returns into shared code.
fn exec_child(argv: &ArgumentVector, read_end: OwnedFd, write_end: OwnedFd) -> ! {
    drop(read_end);

    let stdout = libc::STDOUT_FILENO;
    if write_end.as_raw_fd() == stdout {
        // The pipe landed on fd 1 already; it only has to survive exec.
        if set_cloexec(stdout, false).is_err() {
            child_failure(argv.program());
        }
        std::mem::forget(write_end);
    } else {
        // SAFETY: both descriptors are open; the copy on fd 1 has no FD_CLOEXEC.
        if unsafe { libc::dup2(write_end.as_raw_fd(), stdout) } == -1 {
            child_failure(argv.program());
        }
        drop(write_end);
    }

    // SAFETY: `ptrs` is null-terminated and points into `args`, both alive here.
    unsafe { libc::execvp(argv.program().as_ptr(), argv.ptrs.as_ptr()) };
    child_failure(argv.program())
}

/// Reports the current errno on fd 2 and terminates the child without running
/// destructors or exit handlers inherited from the parent.
fn child_failure(program: &CStr) -> ! {
    let reason = Errno::last().desc();
    // SAFETY: fd 2 is only borrowed; ManuallyDrop keeps it open.
    let mut stderr = ManuallyDrop::new(unsafe { File::from_raw_fd(libc::STDERR_FILENO) });
    let parts: [&[u8]; 5] = [
        b"shell_capture: ",
        program.to_bytes(),
        b": ",
        reason.as_bytes(),
        b"\n",
    ];
    for part in parts {
        let _ = stderr.write_all(part);
    }
    // SAFETY: _exit is async-signal-safe and does not return.
    unsafe { libc::_exit(EXEC_FAILED) }
}

fn collect_output(child: Pid, read_end: OwnedFd) -> Result<Vec<u8>, LaunchError> {
    debug!(pid = child.as_raw(), "child started");
    let mut reader = File::from(read_end);
    let mut capture = CaptureBuffer::new();
    let drained = capture.fill_from::<_, STAGING_SIZE>(&mut reader);
    drop(reader);
    reap(child);
    drained.map_err(LaunchError::Read)?;
    debug!(pid = child.as_raw(), bytes = capture.len(), "output captured");
    Ok(capture.into_inner())
}

/// Waits for `child` so it does not linger as a zombie. The status is only logged.
fn reap(child: Pid) {
    loop {
        match waitpid(child, None) {
            Ok(status) => {
                debug!(pid = child.as_raw(), ?status, "child exited");
                return;
            }
            Err(Errno::EINTR) => continue,
            Err(errno) => {
                warn!(pid = child.as_raw(), error = %errno, "waitpid failed");
                return;
            }
        }
    }
}
