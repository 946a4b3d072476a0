/*!
 * posix9
 * POSIX signal, thread and socket emulation over a cooperative, poll-driven host
 */

pub mod core;
pub mod host;
pub mod monitoring;
pub mod net;
pub mod posix;
pub mod signals;
pub mod threads;

// Re-exports
pub use crate::core::{Errno, Posix9Config, Posix9Error, Posix9Result};
pub use host::{CoopHost, Host, Yielder};
pub use monitoring::init_tracing;
pub use net::{FdSet, LoopbackTransport, MsgFlags, SocketError, SocketManager};
pub use posix::{Descriptor, FileDescriptors, Posix9, StdioFiles};
pub use signals::{SigAction, SigHandler, SigSet, Signal, SignalError, SignalManager};
pub use threads::{ThreadAttr, ThreadError, ThreadId, ThreadManager};
