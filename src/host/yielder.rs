/*!
 * Yield Primitive
 *
 * Every blocking call in the emulation layer is a loop over `yield_once`
 * followed by a signal drain. The yielder owns that loop.
 */

use super::traits::Host;
use crate::core::types::Ticks;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Called after every yield to drain pending signals
pub trait YieldHook: Send + Sync {
    /// Returns how many deliveries ran a handler or terminated the process
    fn on_yield(&self) -> usize;
}

/// How a wait loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Ready,
    TimedOut,
    /// A signal handler ran (or the process terminated) while waiting
    Interrupted,
}

pub struct Yielder {
    host: Arc<dyn Host>,
    hook: RwLock<Option<Weak<dyn YieldHook>>>,
}

impl Yielder {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self {
            host,
            hook: RwLock::new(None),
        }
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    /// Install the drain run by [`pump`](Self::pump)
    pub fn set_hook(&self, hook: Weak<dyn YieldHook>) {
        *self.hook.write() = Some(hook);
    }

    /// Service housekeeping and give up the timeslice
    #[inline]
    pub fn yield_once(&self) {
        self.host.system_task();
        self.host.yield_now();
    }

    /// Drain pending signals; returns the deliveries that interrupt a wait
    pub fn pump(&self) -> usize {
        let hook = self.hook.read().as_ref().and_then(Weak::upgrade);
        match hook {
            Some(hook) => hook.on_yield(),
            None => 0,
        }
    }

    #[inline]
    pub fn now(&self) -> Ticks {
        self.host.ticks()
    }

    /// Ticks covering `duration`, rounded up
    pub fn duration_to_ticks(&self, duration: Duration) -> Ticks {
        let tps = self.host.ticks_per_second() as u128;
        let ticks = (duration.as_nanos() * tps).div_ceil(1_000_000_000);
        ticks.min(Ticks::MAX as u128) as Ticks
    }

    pub fn ticks_to_duration(&self, ticks: Ticks) -> Duration {
        let tps = self.host.ticks_per_second().max(1);
        Duration::from_nanos((ticks as u128 * 1_000_000_000 / tps as u128) as u64)
    }

    pub fn deadline_after(&self, duration: Duration) -> Ticks {
        self.now().saturating_add(self.duration_to_ticks(duration))
    }

    /// Loop until `ready` holds or `deadline` passes; `None` waits forever
    ///
    /// `ready` is checked before the deadline, so a satisfied condition wins
    /// over an expired deadline.
    pub fn wait_until<F>(&self, deadline: Option<Ticks>, ready: F) -> WaitOutcome
    where
        F: FnMut() -> bool,
    {
        self.wait(deadline, false, ready)
    }

    /// Like [`wait_until`](Self::wait_until), but a delivered signal ends
    /// the wait with [`WaitOutcome::Interrupted`]
    pub fn wait_interruptible<F>(&self, deadline: Option<Ticks>, ready: F) -> WaitOutcome
    where
        F: FnMut() -> bool,
    {
        self.wait(deadline, true, ready)
    }

    fn wait<F>(&self, deadline: Option<Ticks>, interruptible: bool, mut ready: F) -> WaitOutcome
    where
        F: FnMut() -> bool,
    {
        loop {
            if ready() {
                return WaitOutcome::Ready;
            }
            if deadline.is_some_and(|d| self.now() >= d) {
                return WaitOutcome::TimedOut;
            }
            self.yield_once();
            if self.pump() > 0 && interruptible {
                return WaitOutcome::Interrupted;
            }
        }
    }
}
