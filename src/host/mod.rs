/*!
 * Host Module
 * Cooperative host abstraction, scheduler and the yield primitive
 */

pub mod coop;
pub mod interrupt;
pub mod scheduler;
pub mod traits;
pub mod yielder;

pub use coop::{Clock, CoopHost, ExitMode};
pub use interrupt::FlagTask;
pub use scheduler::CooperativeScheduler;
pub use traits::{
    ContextBody, Host, HostError, HostResult, HostThreadId, Housekeeping, TimerToken,
};
pub use yielder::{WaitOutcome, YieldHook, Yielder};
