/*!
 * Signal Traits
 * Signal delivery and masking abstractions
 */

use super::types::{SigHow, SigSet, SignalResult, SignalStats};

/// Raising and draining signals
pub trait SignalDelivery: Send + Sync {
    /// Mark a signal pending for the process
    fn raise(&self, signum: i32) -> SignalResult<()>;

    /// Deliver every pending, unblocked signal in ascending order
    fn process(&self) -> usize;

    /// Whether `signum` is pending (blocked or not)
    fn is_pending(&self, signum: i32) -> bool;
}

/// Signal mask management
pub trait SignalMasking: Send + Sync {
    /// Apply `how` with `set` (if any); returns the previous mask
    fn sigprocmask(&self, how: SigHow, set: Option<SigSet>) -> SignalResult<SigSet>;

    /// Pending signals that are currently blocked
    fn sigpending(&self) -> SigSet;

    fn blocked(&self) -> SigSet;
}

/// Statistics access
pub trait SignalStatsProvider {
    fn stats(&self) -> SignalStats;
}
