/*!
 * Thread Calls
 * The `<pthread.h>` family
 */

use super::Posix9;
use crate::core::types::ThreadValue;
use crate::threads::{
    KeyDestructor, MutexKind, PthreadCond, PthreadMutex, PthreadOnce, PthreadRwLock, ThreadAttr,
    ThreadId, ThreadKey, ThreadManager, ThreadResult,
};
use std::time::Duration;

impl Posix9 {
    pub fn pthread_create<F>(&self, attr: &ThreadAttr, body: F) -> ThreadResult<ThreadId>
    where
        F: FnOnce() -> ThreadValue + Send + 'static,
    {
        self.track(self.inner.threads.create(attr, body))
    }

    pub fn pthread_join(&self, id: ThreadId) -> ThreadResult<ThreadValue> {
        self.blocking("pthread_join", || self.inner.threads.join(id))
    }

    pub fn pthread_detach(&self, id: ThreadId) -> ThreadResult<()> {
        self.track(self.inner.threads.detach(id))
    }

    pub fn pthread_exit(&self, value: ThreadValue) -> ! {
        self.inner.threads.exit(value)
    }

    pub fn pthread_self(&self) -> ThreadId {
        self.inner.threads.current()
    }

    pub fn pthread_equal(&self, a: ThreadId, b: ThreadId) -> bool {
        ThreadManager::equal(a, b)
    }

    pub fn pthread_yield(&self) {
        self.inner.threads.yield_now();
    }

    pub fn pthread_cancel(&self, id: ThreadId) -> ThreadResult<()> {
        self.track(self.inner.threads.cancel(id))
    }

    pub fn pthread_testcancel(&self) {
        self.inner.threads.test_cancel();
    }

    pub fn pthread_key_create(&self, destructor: Option<KeyDestructor>) -> ThreadResult<ThreadKey> {
        self.track(self.inner.threads.key_create(destructor))
    }

    pub fn pthread_key_delete(&self, key: ThreadKey) -> ThreadResult<()> {
        self.track(self.inner.threads.key_delete(key))
    }

    pub fn pthread_getspecific(&self, key: ThreadKey) -> Option<ThreadValue> {
        self.inner.threads.get_specific(key)
    }

    pub fn pthread_setspecific(&self, key: ThreadKey, value: ThreadValue) -> ThreadResult<()> {
        self.track(self.inner.threads.set_specific(key, value))
    }

    pub fn pthread_mutex_init(&self, kind: MutexKind) -> PthreadMutex {
        PthreadMutex::with_kind(self.inner.threads.clone(), kind)
    }

    pub fn pthread_mutex_lock(&self, mutex: &PthreadMutex) -> ThreadResult<()> {
        self.blocking("pthread_mutex_lock", || mutex.lock())
    }

    pub fn pthread_mutex_trylock(&self, mutex: &PthreadMutex) -> ThreadResult<()> {
        self.track(mutex.try_lock())
    }

    pub fn pthread_mutex_unlock(&self, mutex: &PthreadMutex) -> ThreadResult<()> {
        self.track(mutex.unlock())
    }

    pub fn pthread_cond_wait(&self, cond: &PthreadCond, mutex: &PthreadMutex) -> ThreadResult<()> {
        self.blocking("pthread_cond_wait", || cond.wait(mutex))
    }

    pub fn pthread_cond_timedwait(
        &self,
        cond: &PthreadCond,
        mutex: &PthreadMutex,
        timeout: Duration,
    ) -> ThreadResult<()> {
        self.blocking("pthread_cond_timedwait", || cond.timed_wait(mutex, timeout))
    }

    /// Wake one waiter; a no-op with none
    pub fn pthread_cond_signal(&self, cond: &PthreadCond) {
        cond.signal();
    }

    pub fn pthread_cond_broadcast(&self, cond: &PthreadCond) {
        cond.broadcast();
    }

    pub fn pthread_rwlock_init(&self) -> PthreadRwLock {
        PthreadRwLock::new(self.inner.threads.clone())
    }

    pub fn pthread_rwlock_rdlock(&self, lock: &PthreadRwLock) -> ThreadResult<()> {
        self.blocking("pthread_rwlock_rdlock", || lock.read_lock())
    }

    pub fn pthread_rwlock_wrlock(&self, lock: &PthreadRwLock) -> ThreadResult<()> {
        self.blocking("pthread_rwlock_wrlock", || lock.write_lock())
    }

    pub fn pthread_rwlock_unlock(&self, lock: &PthreadRwLock) -> ThreadResult<()> {
        self.track(lock.unlock())
    }

    pub fn pthread_once<F: FnOnce()>(&self, once: &PthreadOnce, init: F) {
        once.call_once(&self.inner.threads, init);
    }
}
