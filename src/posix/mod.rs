/*!
 * POSIX Facade
 *
 * One emulated process: host, yielder, signal state, thread table, socket
 * table and the last-error slot. Calls are grouped by domain the same way
 * the C headers group them; every failing call records its errno.
 */

mod descriptor;
mod process;
mod signals;
mod sockets;
mod threads;
mod time;

pub use descriptor::{Descriptor, FileDescriptors, StdioFiles};

use crate::core::errno::{Errno, LastError};
use crate::core::{Posix9Config, Posix9Result};
use crate::host::{Clock, CoopHost, ExitMode, Host, HostError, Housekeeping, Yielder};
use crate::monitoring::CallSpan;
use crate::net::{LoopbackTransport, SocketError, SocketManager};
use crate::signals::{SignalDelivery, SignalError, SignalManager};
use crate::threads::{ThreadError, ThreadManager};
use std::sync::Arc;
use tracing::info;

/// Error types that report a POSIX error number
pub trait ReportsErrno {
    fn errno(&self) -> Errno;
}

impl ReportsErrno for Errno {
    fn errno(&self) -> Errno {
        *self
    }
}

impl ReportsErrno for SignalError {
    fn errno(&self) -> Errno {
        SignalError::errno(self)
    }
}

impl ReportsErrno for ThreadError {
    fn errno(&self) -> Errno {
        ThreadError::errno(self)
    }
}

impl ReportsErrno for SocketError {
    fn errno(&self) -> Errno {
        SocketError::errno(self)
    }
}

impl ReportsErrno for HostError {
    fn errno(&self) -> Errno {
        HostError::errno(self)
    }
}

struct Process {
    config: Posix9Config,
    host: Arc<CoopHost>,
    yielder: Arc<Yielder>,
    signals: Arc<SignalManager>,
    threads: Arc<ThreadManager>,
    sockets: Arc<SocketManager>,
    loopback: Arc<LoopbackTransport>,
    files: Arc<dyn FileDescriptors>,
    last_error: LastError,
}

/// Handle to one emulated process; clones share it
///
/// Must be created on the context that will act as the main thread.
#[derive(Clone)]
pub struct Posix9 {
    inner: Arc<Process>,
}

impl Posix9 {
    /// Real-time 60 Hz host; a terminating signal ends the OS process
    pub fn new(config: Posix9Config) -> Posix9Result<Self> {
        config.validate()?;
        let host = CoopHost::new(Clock::Realtime, config.ticks_per_second, ExitMode::Process);
        Ok(Self::with_host(config, host, Arc::new(StdioFiles::new())))
    }

    /// Virtual clock, recorded exits, default configuration
    pub fn simulated() -> Self {
        let config = Posix9Config::default();
        let host = CoopHost::new(Clock::Virtual, config.ticks_per_second, ExitMode::Record);
        Self::with_host(config, host, Arc::new(StdioFiles::new()))
    }

    /// Virtual clock and recorded exits with `config`
    pub fn simulated_with(config: Posix9Config) -> Posix9Result<Self> {
        config.validate()?;
        let host = CoopHost::new(Clock::Virtual, config.ticks_per_second, ExitMode::Record);
        Ok(Self::with_host(config, host, Arc::new(StdioFiles::new())))
    }

    /// Assemble a process over an existing host and file table
    pub fn with_host(
        config: Posix9Config,
        host: Arc<CoopHost>,
        files: Arc<dyn FileDescriptors>,
    ) -> Self {
        let yielder = Arc::new(Yielder::new(host.clone()));
        let signals = SignalManager::new(yielder.clone());
        let threads = ThreadManager::new(yielder.clone(), config.max_threads, config.max_keys);

        let loopback = LoopbackTransport::new(config.hostname.as_str());
        let housekeeping: Arc<dyn Housekeeping> = loopback.clone();
        host.add_housekeeping(Arc::downgrade(&housekeeping));

        let delivery: Arc<dyn SignalDelivery> = signals.clone();
        let sockets = SocketManager::new(loopback.clone(), yielder.clone(), delivery, &config);

        info!("posix9 process ready (hostname {})", config.hostname.as_str());
        Self {
            inner: Arc::new(Process {
                config,
                host,
                yielder,
                signals,
                threads,
                sockets,
                loopback,
                files,
                last_error: LastError::new(),
            }),
        }
    }

    pub fn config(&self) -> &Posix9Config {
        &self.inner.config
    }

    pub fn host(&self) -> &Arc<CoopHost> {
        &self.inner.host
    }

    pub fn yielder(&self) -> &Arc<Yielder> {
        &self.inner.yielder
    }

    pub fn signal_manager(&self) -> &Arc<SignalManager> {
        &self.inner.signals
    }

    pub fn thread_manager(&self) -> &Arc<ThreadManager> {
        &self.inner.threads
    }

    pub fn socket_manager(&self) -> &Arc<SocketManager> {
        &self.inner.sockets
    }

    pub fn loopback(&self) -> &Arc<LoopbackTransport> {
        &self.inner.loopback
    }

    /// Last recorded `errno`
    pub fn errno(&self) -> Option<Errno> {
        self.inner.last_error.get()
    }

    pub fn clear_errno(&self) {
        self.inner.last_error.clear();
    }

    /// Periodic pump for the embedding event loop
    ///
    /// Services host housekeeping (timers, transport events) and delivers
    /// pending signals; returns how many were delivered.
    pub fn signal_process(&self) -> usize {
        self.inner.host.system_task();
        self.inner.signals.process()
    }

    /// Close any descriptor, routed by band
    pub fn close(&self, fd: i32) -> Result<(), Errno> {
        let result = match Descriptor::from_raw(fd, &self.inner.sockets) {
            Ok(Descriptor::Socket(sock)) => self.inner.sockets.close(sock).map_err(|e| e.errno()),
            Ok(Descriptor::File(raw)) => self.inner.files.close(raw),
            Err(e) => Err(e.errno()),
        };
        self.track(result)
    }

    /// Resolve a raw descriptor number
    pub fn descriptor(&self, fd: i32) -> Result<Descriptor, SocketError> {
        self.track(Descriptor::from_raw(fd, &self.inner.sockets))
    }

    fn track<T, E: ReportsErrno>(&self, result: Result<T, E>) -> Result<T, E> {
        if let Err(e) = &result {
            self.inner.last_error.set(e.errno());
        }
        result
    }

    /// Run a call that may park the calling context
    fn blocking<T, E, F>(&self, call: &'static str, f: F) -> Result<T, E>
    where
        E: ReportsErrno,
        F: FnOnce() -> Result<T, E>,
    {
        let span = CallSpan::new(call);
        let result = {
            let _entered = span.enter();
            f()
        };
        match &result {
            Ok(_) => span.record_ok(),
            Err(e) => span.record_errno(e.errno()),
        }
        self.track(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_routes_by_band() {
        let posix = Posix9::simulated();
        let sock = posix.socket(2, 1, 0).unwrap();
        assert!(posix.descriptor(sock).unwrap().is_socket());

        assert_eq!(posix.close(sock), Ok(()));
        assert_eq!(posix.close(sock), Err(Errno::EBADF));
        assert_eq!(posix.errno(), Some(Errno::EBADF));

        assert_eq!(posix.close(1), Ok(()));
        assert_eq!(posix.close(5), Err(Errno::EBADF));
    }

    #[test]
    fn test_errno_cleared() {
        let posix = Posix9::simulated();
        assert!(posix.socket(99, 1, 0).is_err());
        assert_eq!(posix.errno(), Some(Errno::EAFNOSUPPORT));
        posix.clear_errno();
        assert_eq!(posix.errno(), None);
    }
}
