/*!
 * Error Types
 * Unified error handling with thiserror and miette diagnostics
 */

use super::errno::Errno;
use super::inline_string::InlineString;
use miette::Diagnostic;
use thiserror::Error;

pub use super::config::ConfigError;
pub use crate::host::HostError;
pub use crate::net::SocketError;
pub use crate::signals::SignalError;
pub use crate::threads::ThreadError;

/// Unified error type with miette diagnostics
///
/// Subsystem APIs return their own error enums; this type is for callers
/// that drive several subsystems at once (the binary, configuration loading).
#[derive(Error, Debug, Diagnostic)]
pub enum Posix9Error {
    #[error("Signal error: {0}")]
    #[diagnostic(code(posix9::signal))]
    Signal(#[from] SignalError),

    #[error("Thread error: {0}")]
    #[diagnostic(code(posix9::thread))]
    Thread(#[from] ThreadError),

    #[error("Socket error: {0}")]
    #[diagnostic(code(posix9::socket))]
    Socket(#[from] SocketError),

    #[error("Host error: {0}")]
    #[diagnostic(code(posix9::host))]
    Host(#[from] HostError),

    #[error("Configuration error: {0}")]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("{0}")]
    #[diagnostic(
        code(posix9::errno),
        help("The call failed with a plain POSIX error number.")
    )]
    Errno(#[from] Errno),

    #[error("Internal error: {0}")]
    #[diagnostic(
        code(posix9::internal),
        help("An unexpected internal error occurred. Please report this issue.")
    )]
    Internal(InlineString),
}

impl Posix9Error {
    /// POSIX error number this error reports through `errno`
    pub fn errno(&self) -> Errno {
        match self {
            Posix9Error::Signal(e) => e.errno(),
            Posix9Error::Thread(e) => e.errno(),
            Posix9Error::Socket(e) => e.errno(),
            Posix9Error::Host(e) => e.errno(),
            Posix9Error::Config(_) => Errno::EINVAL,
            Posix9Error::Errno(e) => *e,
            Posix9Error::Internal(_) => Errno::EIO,
        }
    }
}

impl From<String> for Posix9Error {
    fn from(msg: String) -> Self {
        Posix9Error::Internal(msg.into())
    }
}

impl From<&str> for Posix9Error {
    fn from(msg: &str) -> Self {
        Posix9Error::Internal(msg.into())
    }
}

pub type Posix9Result<T> = Result<T, Posix9Error>;
