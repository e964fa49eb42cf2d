use std::io;
use thiserror::Error;

/// Why a command produced no captured output at all.
///
/// A command that started but failed (non-zero exit, missing program on the
/// fork/exec path) is not an error here: its output, possibly empty, is still
/// returned.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("nothing to execute: the command line is empty")]
    EmptyCommand,

    #[error("argument contains an interior NUL byte: {argument:?}")]
    InteriorNul { argument: String },

    #[error("failed to create output pipe: {0}")]
    Pipe(#[source] io::Error),

    #[error("failed to fork child process: {0}")]
    Fork(#[source] io::Error),

    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read child output: {0}")]
    Read(#[source] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            LaunchError::EmptyCommand.to_string(),
            "nothing to execute: the command line is empty"
        );

        let nul = LaunchError::InteriorNul {
            argument: "a\0b".into(),
        };
        assert_eq!(
            nul.to_string(),
            "argument contains an interior NUL byte: \"a\\0b\""
        );

        let spawn = LaunchError::Spawn {
            command: "nope.exe".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(spawn.to_string(), "failed to spawn 'nope.exe': not found");
    }

    #[test]
    fn test_source_is_preserved() {
        use std::error::Error as _;
        let err = LaunchError::Pipe(io::Error::from(io::ErrorKind::Other));
        assert!(err.source().is_some());
        assert!(LaunchError::EmptyCommand.source().is_none());
    }
}
