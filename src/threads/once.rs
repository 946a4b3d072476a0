/*!
 * Once Initialization
 */

use super::manager::ThreadManager;
use std::sync::atomic::{AtomicU8, Ordering};

const ONCE_NEW: u8 = 0;
const ONCE_RUNNING: u8 = 1;
const ONCE_DONE: u8 = 2;

/// `pthread_once_t`
#[derive(Debug, Default)]
pub struct PthreadOnce {
    state: AtomicU8,
}

impl PthreadOnce {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(ONCE_NEW),
        }
    }

    /// Run `init` exactly once; callers arriving while it runs wait for it
    ///
    /// If `init` unwinds (`pthread_exit`, cancellation or a panic) the
    /// control is left uninitialized and the next caller runs it again.
    pub fn call_once<F>(&self, threads: &ThreadManager, init: F)
    where
        F: FnOnce(),
    {
        let mut init = Some(init);
        loop {
            match self.state.compare_exchange(
                ONCE_NEW,
                ONCE_RUNNING,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    let guard = ResetOnUnwind(&self.state);
                    if let Some(init) = init.take() {
                        init();
                    }
                    std::mem::forget(guard);
                    self.state.store(ONCE_DONE, Ordering::Release);
                    return;
                }
                Err(ONCE_RUNNING) => {
                    threads.yielder().wait_until(None, || {
                        self.state.load(Ordering::Acquire) != ONCE_RUNNING
                    });
                }
                Err(_) => return,
            }
        }
    }

    pub fn is_done(&self) -> bool {
        self.state.load(Ordering::Acquire) == ONCE_DONE
    }
}

/// Puts the control back to `ONCE_NEW` if the initializer unwinds
struct ResetOnUnwind<'a>(&'a AtomicU8);

impl Drop for ResetOnUnwind<'_> {
    fn drop(&mut self) {
        self.0.store(ONCE_NEW, Ordering::Release);
    }
}
