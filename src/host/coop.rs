/*!
 * Cooperative Host
 *
 * Host implementation over the single-baton scheduler. Provides a tick
 * clock (virtual or real-time), a one-shot timer queue fired from
 * `system_task`, housekeeping hooks, interrupt-key injection and a
 * termination record.
 */

use super::interrupt::FlagTask;
use super::scheduler::CooperativeScheduler;
use super::traits::{ContextBody, Host, HostResult, HostThreadId, Housekeeping, TimerToken};
use crate::core::limits::{TICKS_PER_SECOND, VIRTUAL_TICKS_PER_YIELD};
use crate::core::types::Ticks;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;
use tracing::{info, warn};

/// Tick source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    /// Advances a fixed number of ticks per `system_task`; deterministic
    Virtual,
    /// Wall-clock ticks since the host started
    Realtime,
}

/// What `exit_to_shell` does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitMode {
    /// Remember the status and keep running
    Record,
    /// Terminate the OS process
    Process,
}

struct TimerEntry {
    token: TimerToken,
    due: Ticks,
    task: FlagTask,
}

pub struct CoopHost {
    scheduler: Arc<CooperativeScheduler>,
    clock: Clock,
    ticks_per_second: u64,
    virtual_ticks: AtomicU64,
    started: Instant,
    timers: Mutex<Vec<TimerEntry>>,
    next_timer: AtomicU64,
    housekeeping: RwLock<Vec<Weak<dyn Housekeeping>>>,
    interrupt_key: AtomicBool,
    exit_mode: ExitMode,
    exit_status: Mutex<Option<i32>>,
}

impl CoopHost {
    /// Deterministic host for tests: virtual clock, recorded exits
    pub fn simulated() -> Arc<Self> {
        Self::new(Clock::Virtual, TICKS_PER_SECOND, ExitMode::Record)
    }

    pub fn new(clock: Clock, ticks_per_second: u64, exit_mode: ExitMode) -> Arc<Self> {
        info!(
            "Cooperative host started ({:?} clock, {} ticks/s)",
            clock, ticks_per_second
        );
        Arc::new(Self {
            scheduler: CooperativeScheduler::new(),
            clock,
            ticks_per_second: ticks_per_second.max(1),
            virtual_ticks: AtomicU64::new(0),
            started: Instant::now(),
            timers: Mutex::new(Vec::new()),
            next_timer: AtomicU64::new(1),
            housekeeping: RwLock::new(Vec::new()),
            interrupt_key: AtomicBool::new(false),
            exit_mode,
            exit_status: Mutex::new(None),
        })
    }

    pub fn scheduler(&self) -> &Arc<CooperativeScheduler> {
        &self.scheduler
    }

    /// Register work to run on every `system_task`
    pub fn add_housekeeping(&self, hook: Weak<dyn Housekeeping>) {
        self.housekeeping.write().push(hook);
    }

    /// Simulate the user pressing the interrupt key
    pub fn press_interrupt_key(&self) {
        self.interrupt_key.store(true, Ordering::Release);
    }

    /// Move a virtual clock forward
    pub fn advance_ticks(&self, ticks: Ticks) {
        self.virtual_ticks.fetch_add(ticks, Ordering::AcqRel);
    }

    /// Status passed to the last recorded `exit_to_shell`
    pub fn exit_status(&self) -> Option<i32> {
        *self.exit_status.lock()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.lock().len()
    }

    fn fire_due_timers(&self, now: Ticks) {
        let due: Vec<TimerEntry> = {
            let mut timers = self.timers.lock();
            let (due, keep) = std::mem::take(&mut *timers)
                .into_iter()
                .partition(|entry| entry.due <= now);
            *timers = keep;
            due
        };
        for entry in due {
            entry.task.fire();
        }
    }

    fn run_housekeeping(&self) {
        let hooks: Vec<Arc<dyn Housekeeping>> = {
            let mut registered = self.housekeeping.write();
            registered.retain(|hook| hook.strong_count() > 0);
            registered.iter().filter_map(Weak::upgrade).collect()
        };
        for hook in hooks {
            hook.service();
        }
    }
}

impl Host for CoopHost {
    fn yield_now(&self) {
        self.scheduler.yield_now();
    }

    fn system_task(&self) {
        if self.clock == Clock::Virtual {
            self.advance_ticks(VIRTUAL_TICKS_PER_YIELD);
        }
        self.fire_due_timers(self.ticks());
        self.run_housekeeping();
    }

    fn ticks(&self) -> Ticks {
        match self.clock {
            Clock::Virtual => self.virtual_ticks.load(Ordering::Acquire),
            Clock::Realtime => {
                let nanos = self.started.elapsed().as_nanos();
                (nanos * self.ticks_per_second as u128 / 1_000_000_000) as Ticks
            }
        }
    }

    fn ticks_per_second(&self) -> u64 {
        self.ticks_per_second
    }

    fn spawn_context(
        &self,
        name: &str,
        stack_size: Option<usize>,
        body: ContextBody,
    ) -> HostResult<HostThreadId> {
        self.scheduler.spawn(name, stack_size, body)
    }

    fn current_context(&self) -> HostThreadId {
        self.scheduler.current().unwrap_or(HostThreadId::MAIN)
    }

    fn prime_timer(&self, delay: Ticks, task: FlagTask) -> HostResult<TimerToken> {
        let token = TimerToken(self.next_timer.fetch_add(1, Ordering::Relaxed));
        let due = self.ticks().saturating_add(delay);
        self.timers.lock().push(TimerEntry { token, due, task });
        Ok(token)
    }

    fn cancel_timer(&self, token: TimerToken) -> Option<Ticks> {
        let mut timers = self.timers.lock();
        let index = timers.iter().position(|entry| entry.token == token)?;
        let entry = timers.swap_remove(index);
        entry.task.disarm();
        Some(entry.due.saturating_sub(self.ticks()))
    }

    fn poll_interrupt_key(&self) -> bool {
        self.interrupt_key.swap(false, Ordering::AcqRel)
    }

    fn exit_to_shell(&self, status: i32) {
        match self.exit_mode {
            ExitMode::Record => {
                warn!("Process terminated with status {}", status);
                *self.exit_status.lock() = Some(status);
            }
            ExitMode::Process => {
                warn!("Exiting to shell with status {}", status);
                std::process::exit(status);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn test_timer_fires_on_system_task() {
        let host = CoopHost::simulated();
        let word = Arc::new(AtomicU32::new(0));
        let armed = Arc::new(AtomicBool::new(false));
        host.prime_timer(3, FlagTask::new(word.clone(), 0b100, armed.clone()))
            .unwrap();

        host.system_task();
        host.system_task();
        assert_eq!(word.load(Ordering::Acquire), 0);
        host.system_task();
        assert_eq!(word.load(Ordering::Acquire), 0b100);
        assert!(!armed.load(Ordering::Acquire));
        assert_eq!(host.pending_timers(), 0);
    }

    #[test]
    fn test_cancel_reports_remaining() {
        let host = CoopHost::simulated();
        let word = Arc::new(AtomicU32::new(0));
        let armed = Arc::new(AtomicBool::new(false));
        let token = host
            .prime_timer(10, FlagTask::new(word.clone(), 1, armed.clone()))
            .unwrap();
        host.advance_ticks(4);

        assert_eq!(host.cancel_timer(token), Some(6));
        assert_eq!(host.cancel_timer(token), None);
        assert!(!armed.load(Ordering::Acquire));
    }

    #[test]
    fn test_interrupt_key_is_consumed() {
        let host = CoopHost::simulated();
        assert!(!host.poll_interrupt_key());
        host.press_interrupt_key();
        assert!(host.poll_interrupt_key());
        assert!(!host.poll_interrupt_key());
    }

    #[test]
    fn test_exit_is_recorded() {
        let host = CoopHost::simulated();
        host.exit_to_shell(130);
        assert_eq!(host.exit_status(), Some(130));
    }
}
