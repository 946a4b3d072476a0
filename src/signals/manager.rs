/*!
 * Signal Manager
 *
 * Pending and blocked sets, handler table, alarm integration and the
 * delivery pump. Signals are only delivered at yield points.
 */

use super::alarm::Alarm;
use super::handler::{execute_default, SignalOutcome};
use super::stats::AtomicSignalStats;
use super::traits::{SignalDelivery, SignalMasking, SignalStatsProvider};
use super::types::*;
use crate::core::limits::{NSIG, SELF_PID};
use crate::core::types::Pid;
use crate::host::{Host, HostError, YieldHook, Yielder};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Signal state for one emulated process
pub struct SignalManager {
    host: Arc<dyn Host>,
    yielder: Arc<Yielder>,
    pending: Arc<AtomicU32>,
    blocked: AtomicU32,
    actions: RwLock<Vec<SigAction>>,
    alarm: Alarm,
    stats: AtomicSignalStats,
}

impl SignalManager {
    /// Create the manager and install it as the yielder's drain hook
    pub fn new(yielder: Arc<Yielder>) -> Arc<Self> {
        let host = yielder.host().clone();
        let pending = Arc::new(AtomicU32::new(0));
        let manager = Arc::new(Self {
            alarm: Alarm::new(host.clone(), pending.clone()),
            host,
            yielder: yielder.clone(),
            pending,
            blocked: AtomicU32::new(0),
            actions: RwLock::new(vec![SigAction::default(); NSIG as usize]),
            stats: AtomicSignalStats::new(),
        });

        let hook: Arc<dyn YieldHook> = manager.clone();
        yielder.set_hook(Arc::downgrade(&hook));
        info!("Signal manager initialized");
        manager
    }

    /// Install `handler` for `signum`, returning the previous one
    pub fn signal(&self, signum: i32, handler: SigHandler) -> SignalResult<SigHandler> {
        let sig = Self::catchable(signum)?;
        let mut actions = self.actions.write();
        let slot = &mut actions[sig.number() as usize];
        let old = std::mem::replace(&mut slot.handler, handler);
        debug!("Handler for {} set to {:?}", sig, slot.handler);
        Ok(old)
    }

    /// Replace the action for `signum` if `act` is given; returns the old one
    pub fn sigaction(&self, signum: i32, act: Option<SigAction>) -> SignalResult<SigAction> {
        let sig = Self::catchable(signum)?;
        let mut actions = self.actions.write();
        let slot = &mut actions[sig.number() as usize];
        let old = slot.clone();
        if let Some(act) = act {
            debug!("Action for {} set to {:?}", sig, act);
            *slot = act;
        }
        Ok(old)
    }

    /// Send a signal to the calling process
    pub fn kill(&self, pid: Pid, signum: i32) -> SignalResult<()> {
        if pid != 0 && pid != -1 && pid != SELF_PID {
            return Err(SignalError::NoSuchProcess(pid));
        }
        if signum == 0 {
            return Ok(());
        }
        self.raise(signum)
    }

    /// Block `mask` and wait until a handler runs or the process terminates
    ///
    /// Ignored signals and no-op default actions do not end the wait.
    /// Always ends with [`SignalError::Interrupted`].
    pub fn sigsuspend(&self, mask: SigSet) -> SignalResult<()> {
        let old = self
            .blocked
            .swap(mask.catchable().bits(), Ordering::AcqRel);
        loop {
            if self.drain().interrupting > 0 {
                break;
            }
            self.yielder.yield_once();
        }
        self.blocked.store(old, Ordering::Release);
        self.process();
        Err(SignalError::Interrupted)
    }

    /// Wait for any signal under the current mask
    pub fn pause(&self) -> SignalResult<()> {
        self.sigsuspend(self.blocked())
    }

    /// Arm the SIGALRM timer; returns the seconds left on the previous one
    pub fn alarm(&self, seconds: u32) -> Result<u32, HostError> {
        let remaining = self.alarm.set(seconds)?;
        if seconds > 0 {
            self.stats.inc_alarms();
        }
        Ok(remaining)
    }

    pub fn alarm_armed(&self) -> bool {
        self.alarm.is_armed()
    }

    pub fn action(&self, sig: Signal) -> SigAction {
        self.actions.read()[sig.number() as usize].clone()
    }

    pub fn pending(&self) -> SigSet {
        SigSet::from_bits(self.pending.load(Ordering::Acquire))
    }

    fn catchable(signum: i32) -> SignalResult<Signal> {
        let sig = Signal::from_number(signum)?;
        if !sig.can_catch() {
            return Err(SignalError::Uncatchable(sig));
        }
        Ok(sig)
    }

    fn poll_interrupt_key(&self) {
        if self.host.poll_interrupt_key() {
            info!("Interrupt key pressed, raising SIGINT");
            self.stats.inc_interrupt_keys();
            self.pending
                .fetch_or(Signal::SIGINT.bit(), Ordering::AcqRel);
        }
    }

    fn deliver(&self, sig: Signal) -> SignalOutcome {
        let action = self.action(sig);
        self.stats.inc_delivered();

        match action.handler {
            SigHandler::Ignore => {
                debug!("{} ignored", sig);
                self.stats.inc_ignored();
                SignalOutcome::Ignored
            }
            SigHandler::Default => {
                let outcome = execute_default(self.host.as_ref(), sig);
                match outcome {
                    SignalOutcome::Terminated(_) => self.stats.inc_terminations(),
                    SignalOutcome::Ignored => self.stats.inc_ignored(),
                    _ => {}
                }
                outcome
            }
            SigHandler::Handler(handler) => {
                let old = self.blocked.load(Ordering::Acquire);
                let mut during = old | action.mask.bits();
                if !action.flags.contains(SaFlags::NODEFER) {
                    during |= sig.bit();
                }
                self.blocked
                    .store(SigSet::from_bits(during).catchable().bits(), Ordering::Release);

                debug!("Invoking handler for {}", sig);
                handler(sig);
                self.stats.inc_handlers();

                self.blocked.store(old, Ordering::Release);
                if action.flags.contains(SaFlags::RESETHAND) {
                    let mut actions = self.actions.write();
                    actions[sig.number() as usize].handler = SigHandler::Default;
                }
                SignalOutcome::HandlerInvoked
            }
        }
    }
}

/// Result of one drain pass
#[derive(Debug, Clone, Copy, Default)]
struct Drained {
    delivered: usize,
    /// Deliveries that ran a handler or terminated the process
    interrupting: usize,
}

impl SignalManager {
    fn drain(&self) -> Drained {
        self.poll_interrupt_key();

        let mut drained = Drained::default();
        let deliverable =
            self.pending.load(Ordering::Acquire) & !self.blocked.load(Ordering::Acquire);
        if deliverable == 0 {
            return drained;
        }

        for sig in SigSet::from_bits(deliverable).iter() {
            let prev = self.pending.fetch_and(!sig.bit(), Ordering::AcqRel);
            if prev & sig.bit() == 0 {
                continue;
            }
            match self.deliver(sig) {
                SignalOutcome::Terminated(status) => {
                    warn!("{} terminated the process with status {}", sig, status);
                    drained.interrupting += 1;
                }
                SignalOutcome::HandlerInvoked => drained.interrupting += 1,
                _ => {}
            }
            drained.delivered += 1;
        }
        drained
    }
}

impl SignalDelivery for SignalManager {
    fn raise(&self, signum: i32) -> SignalResult<()> {
        let sig = Signal::from_number(signum)?;
        self.pending.fetch_or(sig.bit(), Ordering::AcqRel);
        self.stats.inc_raised();
        debug!("{} pending", sig);
        Ok(())
    }

    fn process(&self) -> usize {
        self.drain().delivered
    }

    fn is_pending(&self, signum: i32) -> bool {
        Signal::from_number(signum)
            .map(|sig| self.pending().contains(sig))
            .unwrap_or(false)
    }
}

impl SignalMasking for SignalManager {
    fn sigprocmask(&self, how: SigHow, set: Option<SigSet>) -> SignalResult<SigSet> {
        let old = self.blocked();
        if let Some(set) = set {
            let next = match how {
                SigHow::Block => old.bits() | set.bits(),
                SigHow::Unblock => old.bits() & !set.bits(),
                SigHow::SetMask => set.bits(),
            };
            self.blocked.store(
                SigSet::from_bits(next).catchable().bits(),
                Ordering::Release,
            );
        }
        Ok(old)
    }

    fn sigpending(&self) -> SigSet {
        SigSet::from_bits(self.pending.load(Ordering::Acquire) & self.blocked.load(Ordering::Acquire))
    }

    fn blocked(&self) -> SigSet {
        SigSet::from_bits(self.blocked.load(Ordering::Acquire))
    }
}

impl SignalStatsProvider for SignalManager {
    fn stats(&self) -> SignalStats {
        self.stats.snapshot(self.pending(), self.blocked())
    }
}

impl YieldHook for SignalManager {
    fn on_yield(&self) -> usize {
        self.drain().interrupting
    }
}
