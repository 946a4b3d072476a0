/*!
 * Descriptors
 *
 * Raw descriptor numbers are split into two bands: ordinary files below the
 * socket base, sockets from it upward. A number is resolved to a tagged
 * descriptor once, at the API boundary.
 */

use crate::core::errno::Errno;
use crate::net::{SocketError, SocketFd, SocketManager, SocketResult};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// A resolved descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Descriptor {
    File(i32),
    Socket(SocketFd),
}

impl Descriptor {
    /// Resolve `raw`; numbers in the socket band must name a live socket
    pub fn from_raw(raw: i32, sockets: &SocketManager) -> SocketResult<Self> {
        if raw < 0 {
            return Err(SocketError::BadDescriptor(raw));
        }
        if sockets.is_socket_raw(raw) {
            return sockets.resolve(raw).map(Descriptor::Socket);
        }
        Ok(Descriptor::File(raw))
    }

    pub fn raw(&self) -> i32 {
        match self {
            Descriptor::File(raw) => *raw,
            Descriptor::Socket(fd) => fd.raw(),
        }
    }

    pub fn is_socket(&self) -> bool {
        matches!(self, Descriptor::Socket(_))
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::File(raw) => write!(f, "file:{}", raw),
            Descriptor::Socket(fd) => write!(f, "{}", fd),
        }
    }
}

/// Owner of the ordinary file descriptors
pub trait FileDescriptors: Send + Sync {
    fn is_open(&self, fd: i32) -> bool;

    fn close(&self, fd: i32) -> Result<(), Errno>;
}

/// Standard input, output and error; nothing else is open
#[derive(Debug)]
pub struct StdioFiles {
    open: [AtomicBool; 3],
}

impl StdioFiles {
    pub fn new() -> Self {
        Self {
            open: [
                AtomicBool::new(true),
                AtomicBool::new(true),
                AtomicBool::new(true),
            ],
        }
    }

    fn slot(&self, fd: i32) -> Option<&AtomicBool> {
        usize::try_from(fd).ok().and_then(|i| self.open.get(i))
    }
}

impl Default for StdioFiles {
    fn default() -> Self {
        Self::new()
    }
}

impl FileDescriptors for StdioFiles {
    fn is_open(&self, fd: i32) -> bool {
        self.slot(fd).is_some_and(|open| open.load(Ordering::Acquire))
    }

    fn close(&self, fd: i32) -> Result<(), Errno> {
        match self.slot(fd) {
            Some(open) if open.swap(false, Ordering::AcqRel) => {
                debug!("Closed standard descriptor {}", fd);
                Ok(())
            }
            _ => Err(Errno::EBADF),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdio_close_once() {
        let files = StdioFiles::new();
        assert!(files.is_open(2));
        assert!(!files.is_open(3));
        assert_eq!(files.close(2), Ok(()));
        assert_eq!(files.close(2), Err(Errno::EBADF));
        assert_eq!(files.close(7), Err(Errno::EBADF));
        assert_eq!(files.close(-1), Err(Errno::EBADF));
    }
}
