/*!
 * Core Module
 * Fundamental types, limits, configuration and error handling
 */

pub mod config;
pub mod errno;
pub mod errors;
pub mod inline_string;
pub mod limits;
pub mod slot;
pub mod types;

// Re-export for convenience
pub use config::{ConfigError, ConfigResult, ListenUnbound, Posix9Config};
pub use errno::{Errno, LastError};
pub use errors::{Posix9Error, Posix9Result};
pub use inline_string::InlineString;
pub use slot::{SlotHandle, SlotTable};
pub use types::*;
