use crate::command::CaptureBackend;
use crate::error::LaunchError;
use crate::io_adapters::CaptureBuffer;
use std::ffi::CString;
use std::fs::File;
use std::io;
use std::mem;
use std::os::windows::io::{AsRawHandle, FromRawHandle, OwnedHandle};
use std::ptr;
use tracing::{debug, warn};
use windows_sys::Win32::Foundation::{
    HANDLE, HANDLE_FLAG_INHERIT, SetHandleInformation, TRUE, WAIT_FAILED,
};
use windows_sys::Win32::Security::SECURITY_ATTRIBUTES;
use windows_sys::Win32::System::Pipes::CreatePipe;
use windows_sys::Win32::System::Threading::{
    CreateProcessA, INFINITE, PROCESS_INFORMATION, STARTF_USESTDHANDLES, STARTUPINFOA,
    WaitForSingleObject,
};

const STAGING_SIZE: usize = 4096;

/// Runs commands with `CreateProcessA`.
///
/// The command line is passed through untouched; Windows programs parse their
/// own arguments. Standard output and standard error are merged into the
/// captured stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct CreateProcess;

impl CaptureBackend for CreateProcess {
    fn spawn_and_capture(&self, command: &str) -> Result<Vec<u8>, LaunchError> {
        let (read_end, write_end) = inheritable_pipe().map_err(LaunchError::Pipe)?;

        let child = spawn(command, &write_end)?;
        // Must be closed here or the read loop never sees end of stream.
        drop(write_end);
        debug!(pid = child.id, "child started");

        let mut reader = File::from(read_end);
        let mut capture = CaptureBuffer::new();
        // A broken pipe reads as end of stream.
        let drained = capture.fill_from::<_, STAGING_SIZE>(&mut reader);
        drop(reader);
        child.wait();
        drained.map_err(LaunchError::Read)?;
        debug!(pid = child.id, bytes = capture.len(), "output captured");
        Ok(capture.into_inner())
    }
}

/// Handles of a started child; both are closed when this drops.
struct Child {
    process: OwnedHandle,
    _thread: OwnedHandle,
    id: u32,
}

impl Child {
    fn wait(&self) {
        // SAFETY: the process handle stays open for the lifetime of `self`.
        let event = unsafe { WaitForSingleObject(self.process.as_raw_handle() as HANDLE, INFINITE) };
        if event == WAIT_FAILED {
            warn!(pid = self.id, error = %io::Error::last_os_error(), "waiting for child failed");
        } else {
            debug!(pid = self.id, "child exited");
        }
    }
}

/// Anonymous pipe whose write end is inheritable and whose read end is not.
fn inheritable_pipe() -> io::Result<(OwnedHandle, OwnedHandle)> {
    let attributes = SECURITY_ATTRIBUTES {
        nLength: mem::size_of::<SECURITY_ATTRIBUTES>() as u32,
        lpSecurityDescriptor: ptr::null_mut(),
        bInheritHandle: TRUE,
    };
    let mut read: HANDLE = ptr::null_mut();
    let mut write: HANDLE = ptr::null_mut();
    // SAFETY: the out-pointers are valid locals.
    if unsafe { CreatePipe(&mut read, &mut write, &attributes, 0) } == 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: both handles were just created and nothing else owns them.
    let (read, write) = unsafe {
        (
            OwnedHandle::from_raw_handle(read as _),
            OwnedHandle::from_raw_handle(write as _),
        )
    };

    // SAFETY: `read` is a live handle owned by this function.
    if unsafe { SetHandleInformation(read.as_raw_handle() as HANDLE, HANDLE_FLAG_INHERIT, 0) } == 0
    {
        return Err(io::Error::last_os_error());
    }
    Ok((read, write))
}

fn spawn(command: &str, output: &OwnedHandle) -> Result<Child, LaunchError> {
    // CreateProcessA may write into the command line, so it gets its own buffer.
    let mut command_line = CString::new(command)
        .map_err(|_| LaunchError::InteriorNul {
            argument: command.to_string(),
        })?
        .into_bytes_with_nul();

    // SAFETY: STARTUPINFOA is plain data and all-zero is its initial state.
    let mut startup: STARTUPINFOA = unsafe { mem::zeroed() };
    startup.cb = mem::size_of::<STARTUPINFOA>() as u32;
    startup.dwFlags |= STARTF_USESTDHANDLES;
    startup.hStdOutput = output.as_raw_handle() as HANDLE;
    startup.hStdError = output.as_raw_handle() as HANDLE;

    // SAFETY: plain data, filled in by CreateProcessA.
    let mut info: PROCESS_INFORMATION = unsafe { mem::zeroed() };

    // SAFETY: every pointer refers to a live local; `command_line` is NUL-terminated.
    let created = unsafe {
        CreateProcessA(
            ptr::null(),
            command_line.as_mut_ptr(),
            ptr::null(),
            ptr::null(),
            TRUE,
            0,
            ptr::null(),
            ptr::null(),
            &startup,
            &mut info,
        )
    };
    if created == 0 {
        let source = io::Error::last_os_error();
        warn!(command, error = %source, "CreateProcessA failed");
        return Err(LaunchError::Spawn {
            command: command.to_string(),
            source,
        });
    }

    // SAFETY: CreateProcessA succeeded, so both handles are valid and ours to close.
    let child = unsafe {
        Child {
            process: OwnedHandle::from_raw_handle(info.hProcess as _),
            _thread: OwnedHandle::from_raw_handle(info.hThread as _),
            id: info.dwProcessId,
        }
    };
    Ok(child)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_str(command: &str) -> String {
        String::from_utf8(CreateProcess.spawn_and_capture(command).unwrap()).expect("utf8")
    }

    #[test]
    fn test_captures_known_bytes() {
        assert_eq!(run_str("cmd.exe /c echo hello"), "hello\r\n");
    }

    #[test]
    fn test_stderr_is_merged() {
        let out = run_str("cmd.exe /c \"echo out & echo err 1>&2\"");
        assert!(out.contains("out"));
        assert!(out.contains("err"));
    }

    #[test]
    fn test_missing_program_fails_to_spawn() {
        assert!(matches!(
            CreateProcess.spawn_and_capture("shell-capture-no-such-program.exe"),
            Err(LaunchError::Spawn { .. })
        ));
    }

    #[test]
    fn test_empty_command_fails_to_spawn() {
        assert!(CreateProcess.spawn_and_capture("").is_err());
    }

    #[test]
    fn test_no_handle_leak() {
        for _ in 0..500 {
            assert!(run_str("cmd.exe /c exit 0").is_empty());
        }
    }
}
