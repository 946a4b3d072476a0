/*!
 * Alarm Timer
 *
 * At most one outstanding one-shot timer. When it fires it only sets the
 * SIGALRM bit in the pending word.
 */

use super::types::Signal;
use crate::core::types::Ticks;
use crate::host::{FlagTask, Host, HostResult, TimerToken};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tracing::debug;

pub struct Alarm {
    host: Arc<dyn Host>,
    pending: Arc<AtomicU32>,
    armed: Arc<AtomicBool>,
    token: Mutex<Option<TimerToken>>,
}

impl Alarm {
    pub fn new(host: Arc<dyn Host>, pending: Arc<AtomicU32>) -> Self {
        Self {
            host,
            pending,
            armed: Arc::new(AtomicBool::new(false)),
            token: Mutex::new(None),
        }
    }

    /// Cancel any outstanding alarm, then arm a new one if `seconds > 0`
    ///
    /// Returns the whole seconds left on the cancelled alarm, rounded up.
    pub fn set(&self, seconds: u32) -> HostResult<u32> {
        let mut token = self.token.lock();

        let remaining = match token.take() {
            Some(prev) => self
                .host
                .cancel_timer(prev)
                .map(|ticks| self.ticks_to_seconds(ticks))
                .unwrap_or(0),
            None => 0,
        };

        if seconds > 0 {
            let delay = seconds as Ticks * self.host.ticks_per_second();
            let task = FlagTask::new(
                self.pending.clone(),
                1u32 << Signal::SIGALRM.number(),
                self.armed.clone(),
            );
            *token = Some(self.host.prime_timer(delay, task)?);
            debug!("Alarm armed for {}s ({} ticks)", seconds, delay);
        } else {
            self.armed.store(false, Ordering::Release);
        }

        Ok(remaining)
    }

    /// True while a timer is primed and has not fired
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    fn ticks_to_seconds(&self, ticks: Ticks) -> u32 {
        let tps = self.host.ticks_per_second().max(1);
        ticks.div_ceil(tps).min(u32::MAX as u64) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::CoopHost;

    #[test]
    fn test_cancel_rounds_remaining_up() {
        let host = CoopHost::simulated();
        let pending = Arc::new(AtomicU32::new(0));
        let alarm = Alarm::new(host.clone(), pending.clone());

        assert_eq!(alarm.set(5).unwrap(), 0);
        assert!(alarm.is_armed());
        host.advance_ticks(61);

        assert_eq!(alarm.set(0).unwrap(), 4);
        assert!(!alarm.is_armed());
        assert_eq!(host.pending_timers(), 0);
    }

    #[test]
    fn test_fired_alarm_sets_sigalrm() {
        let host = CoopHost::simulated();
        let pending = Arc::new(AtomicU32::new(0));
        let alarm = Alarm::new(host.clone(), pending.clone());

        alarm.set(1).unwrap();
        for _ in 0..60 {
            host.system_task();
        }
        assert_eq!(pending.load(Ordering::Acquire), 1 << 14);
        assert!(!alarm.is_armed());
        assert_eq!(alarm.set(0).unwrap(), 0);
    }
}
