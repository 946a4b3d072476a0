/*!
 * Endpoint Notifier
 *
 * Runs in interrupt context: the only thing it may touch is the readiness
 * flags of the socket record it was created for. No locks, no allocation,
 * no logging.
 */

use super::transport::{OtStatus, TransportEvent};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

/// Readiness flags shared between a socket record and its notifier
#[derive(Debug, Default)]
pub struct SocketFlags {
    readable: AtomicBool,
    writable: AtomicBool,
    has_oob: AtomicBool,
    connected: AtomicBool,
    connect_done: AtomicBool,
    async_error: AtomicI32,
}

impl SocketFlags {
    /// Fresh flags for a new socket: writable, nothing else
    pub fn new() -> Arc<Self> {
        let flags = Self::default();
        flags.writable.store(true, Ordering::Release);
        Arc::new(flags)
    }

    #[inline]
    pub fn readable(&self) -> bool {
        self.readable.load(Ordering::Acquire)
    }

    #[inline]
    pub fn writable(&self) -> bool {
        self.writable.load(Ordering::Acquire)
    }

    #[inline]
    pub fn has_oob(&self) -> bool {
        self.has_oob.load(Ordering::Acquire)
    }

    #[inline]
    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// An outgoing connect finished, successfully or not
    #[inline]
    pub fn connect_done(&self) -> bool {
        self.connect_done.load(Ordering::Acquire)
    }

    pub(crate) fn clear_readable(&self) {
        self.readable.store(false, Ordering::Release);
    }

    pub(crate) fn clear_writable(&self) {
        self.writable.store(false, Ordering::Release);
    }

    pub(crate) fn clear_oob(&self) {
        self.has_oob.store(false, Ordering::Release);
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    pub(crate) fn reset_connect(&self) {
        self.connect_done.store(false, Ordering::Release);
    }

    /// Last asynchronous error, if any
    pub fn async_error(&self) -> Option<OtStatus> {
        match self.async_error.load(Ordering::Acquire) {
            0 => None,
            code => Some(OtStatus(code)),
        }
    }

    pub(crate) fn set_async_error(&self, status: OtStatus) {
        self.async_error.store(status.code(), Ordering::Release);
    }

    /// Return and clear the asynchronous error (`SO_ERROR`)
    pub(crate) fn take_async_error(&self) -> Option<OtStatus> {
        match self.async_error.swap(0, Ordering::AcqRel) {
            0 => None,
            code => Some(OtStatus(code)),
        }
    }
}

/// Event sink installed on one endpoint
#[derive(Debug, Clone)]
pub struct Notifier {
    flags: Arc<SocketFlags>,
}

impl Notifier {
    pub fn new(flags: Arc<SocketFlags>) -> Self {
        Self { flags }
    }

    /// Record `event` with its completion `result`
    pub fn notify(&self, event: TransportEvent, result: OtStatus) {
        let flags = &self.flags;
        match event {
            TransportEvent::Data | TransportEvent::Listen => {
                flags.readable.store(true, Ordering::Release);
            }
            TransportEvent::GoData => {
                flags.writable.store(true, Ordering::Release);
            }
            TransportEvent::ExData => {
                flags.has_oob.store(true, Ordering::Release);
            }
            TransportEvent::Connect => {
                flags.connected.store(result.is_ok(), Ordering::Release);
                if !result.is_ok() {
                    flags.async_error.store(result.code(), Ordering::Release);
                }
                flags.connect_done.store(true, Ordering::Release);
            }
            TransportEvent::Disconnect | TransportEvent::OrdRel => {
                flags.connected.store(false, Ordering::Release);
                if !result.is_ok() {
                    flags.async_error.store(result.code(), Ordering::Release);
                }
                // Wakes a pending connect and lets recv observe the close
                flags.connect_done.store(true, Ordering::Release);
                flags.readable.store(true, Ordering::Release);
            }
            TransportEvent::PassCon => {
                flags.connected.store(true, Ordering::Release);
            }
        }
    }
}
