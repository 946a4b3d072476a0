/*!
 * Host Traits
 * The cooperative host the emulation layer runs on
 */

use super::interrupt::FlagTask;
use crate::core::errno::Errno;
use crate::core::types::Ticks;
use crate::core::InlineString;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Host cooperative context identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostThreadId(pub u64);

impl HostThreadId {
    /// The context that created the host
    pub const MAIN: HostThreadId = HostThreadId(0);
}

impl fmt::Display for HostThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

/// Handle to a primed host timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerToken(pub u64);

#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum HostError {
    #[error("Host refused to create a context: {0}")]
    #[diagnostic(
        code(host::spawn_failed),
        help("The host may be out of memory or thread resources.")
    )]
    SpawnFailed(InlineString),

    #[error("Host timer unavailable: {0}")]
    #[diagnostic(code(host::timer_unavailable))]
    TimerUnavailable(InlineString),
}

impl HostError {
    pub fn errno(&self) -> Errno {
        match self {
            HostError::SpawnFailed(_) => Errno::EAGAIN,
            HostError::TimerUnavailable(_) => Errno::ENOMEM,
        }
    }
}

pub type HostResult<T> = Result<T, HostError>;

/// Body of a cooperative context
pub type ContextBody = Box<dyn FnOnce() + Send + 'static>;

/// Cooperative, poll-driven host
///
/// Only one context runs at a time. A context keeps running until it calls
/// [`yield_now`](Host::yield_now); timers and transport notifications fire
/// from [`system_task`](Host::system_task).
pub trait Host: Send + Sync {
    /// Give the rest of this timeslice to the next ready context
    fn yield_now(&self);

    /// Service host housekeeping (timers, transport events)
    fn system_task(&self);

    /// Monotonic tick counter
    fn ticks(&self) -> Ticks;

    fn ticks_per_second(&self) -> u64;

    /// Create a new context; it first runs at the spawner's next yield
    fn spawn_context(
        &self,
        name: &str,
        stack_size: Option<usize>,
        body: ContextBody,
    ) -> HostResult<HostThreadId>;

    fn current_context(&self) -> HostThreadId;

    /// Run `task` once, `delay` ticks from now
    fn prime_timer(&self, delay: Ticks, task: FlagTask) -> HostResult<TimerToken>;

    /// Remove a primed timer, returning the ticks it had left
    fn cancel_timer(&self, token: TimerToken) -> Option<Ticks>;

    /// Consume a pending user interrupt keystroke
    fn poll_interrupt_key(&self) -> bool;

    /// Leave to the shell with `status`
    fn exit_to_shell(&self, status: i32);
}

/// Work the host runs on every [`Host::system_task`]
pub trait Housekeeping: Send + Sync {
    fn service(&self);
}
