/*!
 * Signal Statistics
 * Lock-free counters for the delivery hot path
 */

use super::types::{SigSet, SignalStats};
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic signal counters
///
/// # Performance
/// - Cache-line aligned to keep counters off the pending/blocked words
#[repr(C, align(64))]
#[derive(Debug, Default)]
pub struct AtomicSignalStats {
    signals_raised: AtomicU64,
    signals_delivered: AtomicU64,
    handlers_invoked: AtomicU64,
    signals_ignored: AtomicU64,
    terminations: AtomicU64,
    alarms_armed: AtomicU64,
    interrupt_keys: AtomicU64,
}

impl AtomicSignalStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn inc_raised(&self) {
        self.signals_raised.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_delivered(&self) {
        self.signals_delivered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_handlers(&self) {
        self.handlers_invoked.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_ignored(&self) {
        self.signals_ignored.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_terminations(&self) {
        self.terminations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_alarms(&self) {
        self.alarms_armed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_interrupt_keys(&self) {
        self.interrupt_keys.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot with the current pending and blocked sets
    pub fn snapshot(&self, pending: SigSet, blocked: SigSet) -> SignalStats {
        SignalStats {
            signals_raised: self.signals_raised.load(Ordering::Relaxed),
            signals_delivered: self.signals_delivered.load(Ordering::Relaxed),
            handlers_invoked: self.handlers_invoked.load(Ordering::Relaxed),
            signals_ignored: self.signals_ignored.load(Ordering::Relaxed),
            terminations: self.terminations.load(Ordering::Relaxed),
            alarms_armed: self.alarms_armed.load(Ordering::Relaxed),
            interrupt_keys: self.interrupt_keys.load(Ordering::Relaxed),
            pending,
            blocked,
        }
    }
}
