/*!
 * Read-Write Lock
 * Readers counted while no writer holds the lock; writers wait for zero readers
 */

use super::manager::ThreadManager;
use super::types::{ThreadError, ThreadId, ThreadResult};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct RwState {
    readers: u32,
    writer: Option<ThreadId>,
}

/// `pthread_rwlock_t`
pub struct PthreadRwLock {
    threads: Arc<ThreadManager>,
    state: Mutex<RwState>,
}

impl PthreadRwLock {
    pub fn new(threads: Arc<ThreadManager>) -> Self {
        Self {
            threads,
            state: Mutex::new(RwState::default()),
        }
    }

    pub fn read_lock(&self) -> ThreadResult<()> {
        self.threads
            .yielder()
            .wait_until(None, || self.try_read_lock().is_ok());
        Ok(())
    }

    pub fn try_read_lock(&self) -> ThreadResult<()> {
        let mut state = self.state.lock();
        if state.writer.is_some() {
            return Err(ThreadError::Busy);
        }
        state.readers += 1;
        Ok(())
    }

    pub fn write_lock(&self) -> ThreadResult<()> {
        let me = self.threads.current();
        if self.state.lock().writer == Some(me) {
            return Err(ThreadError::Deadlock("rwlock already write-held".into()));
        }
        self.threads
            .yielder()
            .wait_until(None, || self.acquire_write(me).is_ok());
        Ok(())
    }

    pub fn try_write_lock(&self) -> ThreadResult<()> {
        let me = self.threads.current();
        self.acquire_write(me)
    }

    /// Release a write hold by the caller, otherwise one read hold
    pub fn unlock(&self) -> ThreadResult<()> {
        let me = self.threads.current();
        let mut state = self.state.lock();
        if state.writer == Some(me) {
            state.writer = None;
        } else if state.readers > 0 {
            state.readers -= 1;
        } else {
            return Err(ThreadError::NotOwner);
        }
        Ok(())
    }

    pub fn readers(&self) -> u32 {
        self.state.lock().readers
    }

    pub fn writer(&self) -> Option<ThreadId> {
        self.state.lock().writer
    }

    fn acquire_write(&self, me: ThreadId) -> ThreadResult<()> {
        let mut state = self.state.lock();
        if state.readers > 0 || state.writer.is_some() {
            return Err(ThreadError::Busy);
        }
        state.writer = Some(me);
        Ok(())
    }
}
