/*!
 * Select
 *
 * Polling `select` over socket descriptors. Each pass refreshes every
 * requested socket's events from the transport; between passes the caller
 * yields.
 */

use super::manager::SocketManager;
use super::types::{SocketError, SocketFd, SocketResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, trace};

/// Descriptor set by raw number
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FdSet {
    fds: BTreeSet<i32>,
}

impl FdSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// `FD_ZERO`
    pub fn zero(&mut self) {
        self.fds.clear();
    }

    /// `FD_SET`
    pub fn set(&mut self, fd: i32) {
        self.fds.insert(fd);
    }

    /// `FD_CLR`
    pub fn clr(&mut self, fd: i32) {
        self.fds.remove(&fd);
    }

    /// `FD_ISSET`
    pub fn is_set(&self, fd: i32) -> bool {
        self.fds.contains(&fd)
    }

    pub fn len(&self) -> usize {
        self.fds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.fds.iter().copied()
    }
}

impl FromIterator<i32> for FdSet {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        Self {
            fds: iter.into_iter().collect(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Interest {
    Read,
    Write,
    Except,
}

impl SocketManager {
    /// Wait until a requested socket is ready or `timeout` elapses
    ///
    /// Only descriptors below `nfds` are considered; descriptors outside the
    /// socket band are ignored. On return each set holds exactly the ready
    /// descriptors and the result counts every set bit. `None` waits forever;
    /// a zero timeout makes a single pass.
    pub fn select(
        &self,
        nfds: i32,
        mut readfds: Option<&mut FdSet>,
        mut writefds: Option<&mut FdSet>,
        mut exceptfds: Option<&mut FdSet>,
        timeout: Option<Duration>,
    ) -> SocketResult<usize> {
        if nfds < 0 {
            return Err(SocketError::InvalidArgument("negative nfds".into()));
        }

        let mut watched: Vec<(Interest, i32, SocketFd)> = Vec::new();
        for (interest, set) in [
            (Interest::Read, readfds.as_deref()),
            (Interest::Write, writefds.as_deref()),
            (Interest::Except, exceptfds.as_deref()),
        ] {
            let Some(set) = set else { continue };
            for raw in set.iter().filter(|&raw| raw < nfds) {
                if !self.is_socket_raw(raw) {
                    continue;
                }
                watched.push((interest, raw, self.resolve(raw)?));
            }
        }

        let deadline = timeout.map(|t| self.yielder().deadline_after(t));
        let mut ready: Vec<(Interest, i32)> = Vec::new();
        let mut failure = None;
        self.yielder().wait_until(deadline, || {
            ready.clear();
            for &(interest, raw, fd) in &watched {
                let readiness = match self.poll_readiness(fd) {
                    Ok(readiness) => readiness,
                    Err(e) => {
                        // Closed by another thread mid-wait
                        failure = Some(e);
                        return true;
                    }
                };
                let hit = match interest {
                    Interest::Read => readiness.read,
                    Interest::Write => readiness.write,
                    Interest::Except => readiness.except,
                };
                if hit {
                    ready.push((interest, raw));
                }
            }
            !ready.is_empty()
        });
        if let Some(e) = failure {
            return Err(e);
        }

        for (interest, set) in [
            (Interest::Read, readfds.as_deref_mut()),
            (Interest::Write, writefds.as_deref_mut()),
            (Interest::Except, exceptfds.as_deref_mut()),
        ] {
            if let Some(set) = set {
                *set = ready
                    .iter()
                    .filter(|(i, _)| *i == interest)
                    .map(|&(_, raw)| raw)
                    .collect();
            }
        }

        if ready.is_empty() {
            trace!("select timed out over {} descriptors", watched.len());
        } else {
            debug!("select: {} ready", ready.len());
        }
        Ok(ready.len())
    }
}
