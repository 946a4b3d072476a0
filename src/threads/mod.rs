/*!
 * Threads Module
 * pthread emulation over cooperative host contexts
 */

mod condvar;
mod manager;
mod mutex;
mod once;
mod rwlock;
mod tls;
pub mod types;

pub use condvar::PthreadCond;
pub use manager::ThreadManager;
pub use mutex::PthreadMutex;
pub use once::PthreadOnce;
pub use rwlock::PthreadRwLock;
pub use tls::{KeyDestructor, ThreadKey, TlsTable};
pub use types::{
    DetachState, MutexKind, ThreadAttr, ThreadError, ThreadId, ThreadInfo, ThreadResult,
    PTHREAD_CANCELED,
};
