/*!
 * Cooperative Mutex
 *
 * `{owner, count}` guarded by a host-level lock that is never held across a
 * yield. Waiters spin on the yield primitive.
 */

use super::manager::ThreadManager;
use super::types::{MutexKind, ThreadError, ThreadId, ThreadResult};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct MutexState {
    owner: Option<ThreadId>,
    count: u32,
}

/// `pthread_mutex_t`
pub struct PthreadMutex {
    threads: Arc<ThreadManager>,
    kind: MutexKind,
    state: Mutex<MutexState>,
}

impl PthreadMutex {
    pub fn new(threads: Arc<ThreadManager>) -> Self {
        Self::with_kind(threads, MutexKind::Normal)
    }

    pub fn with_kind(threads: Arc<ThreadManager>, kind: MutexKind) -> Self {
        Self {
            threads,
            kind,
            state: Mutex::new(MutexState::default()),
        }
    }

    pub fn kind(&self) -> MutexKind {
        self.kind
    }

    pub(crate) fn threads(&self) -> &Arc<ThreadManager> {
        &self.threads
    }

    /// Block (cooperatively) until the mutex is acquired
    pub fn lock(&self) -> ThreadResult<()> {
        let me = self.threads.current();
        let mut outcome = Ok(());
        self.threads.yielder().wait_until(None, || {
            match self.try_acquire(me) {
                Ok(()) => true,
                Err(ThreadError::Busy) => false,
                Err(e) => {
                    outcome = Err(e);
                    true
                }
            }
        });
        outcome
    }

    /// Acquire without waiting; `Busy` if held
    pub fn try_lock(&self) -> ThreadResult<()> {
        let me = self.threads.current();
        self.try_acquire(me)
    }

    pub fn unlock(&self) -> ThreadResult<()> {
        let me = self.threads.current();
        let mut state = self.state.lock();
        match self.kind {
            MutexKind::Normal => {
                state.owner = None;
                state.count = 0;
            }
            MutexKind::ErrorCheck | MutexKind::Recursive => {
                if state.owner != Some(me) {
                    return Err(ThreadError::NotOwner);
                }
                state.count -= 1;
                if state.count == 0 {
                    state.owner = None;
                }
            }
        }
        Ok(())
    }

    pub fn is_locked(&self) -> bool {
        self.state.lock().owner.is_some()
    }

    pub fn owner(&self) -> Option<ThreadId> {
        self.state.lock().owner
    }

    fn try_acquire(&self, me: ThreadId) -> ThreadResult<()> {
        let mut state = self.state.lock();
        match state.owner {
            None => {
                state.owner = Some(me);
                state.count = 1;
                Ok(())
            }
            Some(owner) if owner == me => match self.kind {
                MutexKind::Recursive => {
                    state.count += 1;
                    Ok(())
                }
                MutexKind::ErrorCheck => Err(ThreadError::Deadlock("mutex relock".into())),
                MutexKind::Normal => Err(ThreadError::Busy),
            },
            Some(_) => Err(ThreadError::Busy),
        }
    }
}
