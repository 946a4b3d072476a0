/*!
 * Thread Types
 * Thread handles, attributes and errors
 */

use crate::core::errno::Errno;
use crate::core::slot::SlotHandle;
use crate::core::InlineString;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use crate::core::limits::PTHREAD_CANCELED;

/// Thread operation result
pub type ThreadResult<T> = Result<T, ThreadError>;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
pub enum ThreadError {
    #[error("No such thread: {0}")]
    #[diagnostic(
        code(thread::no_such_thread),
        help("The thread was already joined or its handle is stale.")
    )]
    NoSuchThread(ThreadId),

    #[error("Invalid argument: {0}")]
    #[diagnostic(code(thread::invalid_argument))]
    InvalidArgument(InlineString),

    #[error("Resource exhausted: {0}")]
    #[diagnostic(
        code(thread::resource_exhausted),
        help("Join or detach finished threads to free table slots.")
    )]
    ResourceExhausted(InlineString),

    #[error("Resource busy")]
    #[diagnostic(code(thread::busy))]
    Busy,

    #[error("Timed out")]
    #[diagnostic(code(thread::timed_out))]
    TimedOut,

    #[error("Deadlock: {0}")]
    #[diagnostic(code(thread::deadlock))]
    Deadlock(InlineString),

    #[error("Caller does not own the lock")]
    #[diagnostic(code(thread::not_owner))]
    NotOwner,
}

impl ThreadError {
    pub fn errno(&self) -> Errno {
        match self {
            ThreadError::NoSuchThread(_) => Errno::ESRCH,
            ThreadError::InvalidArgument(_) => Errno::EINVAL,
            ThreadError::ResourceExhausted(_) => Errno::EAGAIN,
            ThreadError::Busy => Errno::EBUSY,
            ThreadError::TimedOut => Errno::ETIMEDOUT,
            ThreadError::Deadlock(_) => Errno::EDEADLK,
            ThreadError::NotOwner => Errno::EPERM,
        }
    }
}

/// `pthread_t`: a 1-based table index plus the slot generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ThreadId(SlotHandle);

impl ThreadId {
    #[inline]
    pub(crate) fn from_handle(handle: SlotHandle) -> Self {
        Self(handle)
    }

    #[inline]
    pub(crate) fn handle(&self) -> SlotHandle {
        self.0
    }

    /// Table slot (0 is the main thread)
    #[inline]
    pub fn slot(&self) -> usize {
        self.0.index()
    }

    /// The POSIX-visible number: slot + 1
    #[inline]
    pub fn raw(&self) -> u32 {
        self.0.index() as u32 + 1
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "thread-{}", self.raw())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DetachState {
    #[default]
    Joinable,
    Detached,
}

/// `pthread_attr_t`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadAttr {
    pub detach_state: DetachState,
    /// Host default when `None`
    pub stack_size: Option<usize>,
    pub name: Option<InlineString>,
}

impl ThreadAttr {
    pub fn detached() -> Self {
        Self {
            detach_state: DetachState::Detached,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = (size > 0).then_some(size);
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Mutex kinds (`PTHREAD_MUTEX_*`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(i32)]
pub enum MutexKind {
    /// Not re-entrant, no ownership checks
    #[default]
    Normal = 0,
    /// EDEADLK on relock, EPERM on foreign unlock
    ErrorCheck = 1,
    /// Owner may relock; unlocks must balance
    Recursive = 2,
}

impl MutexKind {
    pub fn from_raw(kind: i32) -> ThreadResult<Self> {
        match kind {
            0 => Ok(MutexKind::Normal),
            1 => Ok(MutexKind::ErrorCheck),
            2 => Ok(MutexKind::Recursive),
            other => Err(ThreadError::InvalidArgument(
                format!("mutex type {}", other).into(),
            )),
        }
    }
}

/// Snapshot of one thread table entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadInfo {
    pub id: ThreadId,
    pub name: InlineString,
    pub detached: bool,
    pub finished: bool,
    pub cancel_requested: bool,
}
