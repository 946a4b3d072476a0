/*!
 * Signals Module
 * POSIX signal emulation delivered at cooperative yield points
 */

mod alarm;
mod handler;
mod manager;
mod stats;
pub mod traits;
pub mod types;

// Re-export public API
pub use alarm::Alarm;
pub use handler::{default_action, execute_default, DefaultAction, SignalOutcome};
pub use manager::SignalManager;
pub use stats::AtomicSignalStats;
pub use traits::*;
pub use types::{
    HandlerFn, SaFlags, SigAction, SigHandler, SigHow, SigSet, Signal, SignalError, SignalResult,
    SignalStats,
};
