/*!
 * Signal Calls
 * `<signal.h>` and `alarm`/`pause` from `<unistd.h>`
 */

use super::Posix9;
use crate::core::types::Pid;
use crate::host::HostError;
use crate::signals::{
    SigAction, SigHandler, SigHow, SigSet, SignalDelivery, SignalMasking, SignalResult,
    SignalStats, SignalStatsProvider,
};

impl Posix9 {
    pub fn signal(&self, signum: i32, handler: SigHandler) -> SignalResult<SigHandler> {
        self.track(self.inner.signals.signal(signum, handler))
    }

    pub fn sigaction(&self, signum: i32, act: Option<SigAction>) -> SignalResult<SigAction> {
        self.track(self.inner.signals.sigaction(signum, act))
    }

    /// Mark `signum` pending; it is delivered at the next yield point
    pub fn raise(&self, signum: i32) -> SignalResult<()> {
        self.track(self.inner.signals.raise(signum))
    }

    pub fn kill(&self, pid: Pid, signum: i32) -> SignalResult<()> {
        self.track(self.inner.signals.kill(pid, signum))
    }

    pub fn sigprocmask(&self, how: SigHow, set: Option<SigSet>) -> SignalResult<SigSet> {
        self.track(self.inner.signals.sigprocmask(how, set))
    }

    pub fn sigpending(&self) -> SigSet {
        self.inner.signals.sigpending()
    }

    /// Always ends in `Interrupted` (EINTR)
    pub fn sigsuspend(&self, mask: SigSet) -> SignalResult<()> {
        self.blocking("sigsuspend", || self.inner.signals.sigsuspend(mask))
    }

    pub fn pause(&self) -> SignalResult<()> {
        self.blocking("pause", || self.inner.signals.pause())
    }

    /// Returns the seconds left on the previous alarm
    pub fn alarm(&self, seconds: u32) -> Result<u32, HostError> {
        self.track(self.inner.signals.alarm(seconds))
    }

    pub fn signal_stats(&self) -> SignalStats {
        self.inner.signals.stats()
    }
}
