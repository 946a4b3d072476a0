/*!
 * Condition Variable
 *
 * `{waiters, signaled}` counters. `signal` releases one waiter and
 * `broadcast` releases every current waiter; each woken waiter consumes one
 * unit of `signaled`.
 */

use super::mutex::PthreadMutex;
use super::types::{ThreadError, ThreadResult};
use crate::host::WaitOutcome;
use parking_lot::Mutex;
use std::time::Duration;

#[derive(Debug, Default)]
struct CondState {
    waiters: u32,
    signaled: u32,
}

/// `pthread_cond_t`
#[derive(Debug, Default)]
pub struct PthreadCond {
    state: Mutex<CondState>,
}

impl PthreadCond {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release `mutex`, wait for a signal, reacquire `mutex`
    pub fn wait(&self, mutex: &PthreadMutex) -> ThreadResult<()> {
        self.wait_deadline(mutex, None)
    }

    /// As [`wait`](Self::wait), failing with `TimedOut` after `timeout`
    ///
    /// The mutex is reacquired in both cases.
    pub fn timed_wait(&self, mutex: &PthreadMutex, timeout: Duration) -> ThreadResult<()> {
        let deadline = mutex.threads().yielder().deadline_after(timeout);
        self.wait_deadline(mutex, Some(deadline))
    }

    fn wait_deadline(&self, mutex: &PthreadMutex, deadline: Option<u64>) -> ThreadResult<()> {
        self.state.lock().waiters += 1;
        if let Err(e) = mutex.unlock() {
            self.state.lock().waiters -= 1;
            return Err(e);
        }

        let outcome = mutex.threads().yielder().wait_until(deadline, || {
            let mut state = self.state.lock();
            if state.signaled == 0 {
                return false;
            }
            state.signaled -= 1;
            state.waiters -= 1;
            if state.waiters == 0 {
                state.signaled = 0;
            }
            true
        });

        if outcome == WaitOutcome::TimedOut {
            let mut state = self.state.lock();
            state.waiters -= 1;
            state.signaled = state.signaled.min(state.waiters);
        }

        mutex.lock()?;
        match outcome {
            WaitOutcome::TimedOut => Err(ThreadError::TimedOut),
            _ => Ok(()),
        }
    }

    /// Wake one waiter, if any
    pub fn signal(&self) {
        let mut state = self.state.lock();
        if state.waiters > 0 {
            state.signaled = (state.signaled + 1).min(state.waiters);
        }
    }

    /// Wake all current waiters
    pub fn broadcast(&self) {
        let mut state = self.state.lock();
        if state.waiters > 0 {
            state.signaled = state.waiters;
        }
    }

    pub fn waiters(&self) -> u32 {
        self.state.lock().waiters
    }
}
