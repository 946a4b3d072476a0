/*!
 * Process Identity
 * The host runs one process with one user
 */

use super::Posix9;
use crate::core::errno::Errno;
use crate::core::limits::SELF_PID;
use crate::core::types::{Pid, Uid};

impl Posix9 {
    pub fn getpid(&self) -> Pid {
        SELF_PID
    }

    /// No parent process exists
    pub fn getppid(&self) -> Pid {
        0
    }

    pub fn getuid(&self) -> Uid {
        0
    }

    pub fn geteuid(&self) -> Uid {
        0
    }

    pub fn getgid(&self) -> Uid {
        0
    }

    pub fn getegid(&self) -> Uid {
        0
    }

    /// Process creation is not available on the host
    pub fn fork(&self) -> Result<Pid, Errno> {
        self.track(Err(Errno::ENOSYS))
    }
}
