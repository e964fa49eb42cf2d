use std::io::{ErrorKind, Read, Result as IoResult};

/// Growable accumulator for everything a child writes before closing its end
/// of the pipe.
#[derive(Debug, Default)]
pub(crate) struct CaptureBuffer {
    buf: Vec<u8>,
}

impl CaptureBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Reads `source` through a staging buffer of `N` bytes until a read
    /// returns zero bytes.
    ///
    /// A zero-byte read only happens once every copy of the pipe's write end
    /// is closed, so the child's whole output has been collected when this
    /// returns `Ok`. Interrupted reads are retried.
    pub(crate) fn fill_from<R: Read, const N: usize>(&mut self, source: &mut R) -> IoResult<()> {
        let mut staging = [0u8; N];
        loop {
            match source.read(&mut staging) {
                Ok(0) => return Ok(()),
                Ok(n) => self.buf.extend_from_slice(&staging[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}
