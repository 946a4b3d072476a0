/*!
 * Sleep Calls
 *
 * Sleeps are deadline waits on the host tick clock. A delivered signal
 * ends them early.
 */

use super::Posix9;
use crate::core::errno::Errno;
use crate::host::WaitOutcome;
use std::time::Duration;

impl Posix9 {
    /// `sleep`: returns the whole seconds left when a signal cut it short
    pub fn sleep(&self, seconds: u32) -> u32 {
        match self.sleep_for(Duration::from_secs(u64::from(seconds))) {
            Ok(()) => 0,
            Err(left) => {
                let secs = left.as_secs() + u64::from(left.subsec_nanos() > 0);
                secs.min(u64::from(seconds)) as u32
            }
        }
    }

    /// `usleep`
    pub fn usleep(&self, micros: u64) -> Result<(), Errno> {
        let result = self
            .sleep_for(Duration::from_micros(micros))
            .map_err(|_| Errno::EINTR);
        self.track(result)
    }

    /// `nanosleep`: on interruption the error carries the unslept time
    pub fn nanosleep(&self, request: Duration) -> Result<(), Duration> {
        let result = self.sleep_for(request);
        if result.is_err() {
            self.inner.last_error.set(Errno::EINTR);
        }
        result
    }

    fn sleep_for(&self, duration: Duration) -> Result<(), Duration> {
        let yielder = &self.inner.yielder;
        let deadline = yielder.deadline_after(duration);
        match yielder.wait_interruptible(Some(deadline), || false) {
            WaitOutcome::Interrupted => {
                let left = deadline.saturating_sub(yielder.now());
                Err(yielder.ticks_to_duration(left))
            }
            WaitOutcome::Ready | WaitOutcome::TimedOut => Ok(()),
        }
    }
}
