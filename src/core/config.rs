/*!
 * Runtime Configuration
 *
 * Table capacities, tick rate and socket policy, loaded from defaults,
 * environment variables or a JSON document.
 */

use super::inline_string::InlineString;
use super::limits;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What `listen()` does on a socket that was never bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenUnbound {
    /// Mark the socket listening; the first `accept` reports the transport's
    /// out-of-state error
    #[default]
    MarkOnly,
    /// Bind to the wildcard address with an ephemeral port first
    AutoBind,
    /// Refuse with EINVAL
    Reject,
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    #[diagnostic(
        code(config::invalid_value),
        help("Environment overrides must be positive integers.")
    )]
    InvalidValue { key: InlineString, value: InlineString },

    #[error("Invalid configuration document: {0}")]
    #[diagnostic(
        code(config::parse_failed),
        help("The document must be a JSON object with Posix9Config fields.")
    )]
    Parse(InlineString),

    #[error("Configuration out of range: {0}")]
    #[diagnostic(
        code(config::out_of_range),
        help("Thread tables need at least two slots and the tick rate must be non-zero.")
    )]
    OutOfRange(InlineString),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Emulation layer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Posix9Config {
    /// Thread table capacity, main thread included (default: 64)
    pub max_threads: usize,

    /// Socket table capacity (default: 128)
    pub max_sockets: usize,

    /// Thread-specific data keys (default: 64)
    pub max_keys: usize,

    /// First raw descriptor number for sockets (default: 1000)
    pub socket_fd_base: i32,

    /// Host clock rate (default: 60)
    pub ticks_per_second: u64,

    /// Backlog used for non-positive `listen` arguments (default: 5)
    pub default_backlog: u32,

    pub listen_unbound: ListenUnbound,

    /// Name reported by `gethostname` and resolved by `gethostbyname`
    /// (default: "macintosh")
    pub hostname: InlineString,
}

impl Default for Posix9Config {
    fn default() -> Self {
        Self {
            max_threads: limits::DEFAULT_MAX_THREADS,
            max_sockets: limits::DEFAULT_MAX_SOCKETS,
            max_keys: limits::DEFAULT_MAX_KEYS,
            socket_fd_base: limits::SOCKET_FD_BASE,
            ticks_per_second: limits::TICKS_PER_SECOND,
            default_backlog: limits::DEFAULT_LISTEN_BACKLOG,
            listen_unbound: ListenUnbound::default(),
            hostname: InlineString::from("macintosh"),
        }
    }
}

impl Posix9Config {
    /// Defaults overridden by `POSIX9_*` environment variables
    ///
    /// - POSIX9_MAX_THREADS, POSIX9_MAX_SOCKETS, POSIX9_MAX_KEYS
    /// - POSIX9_TICKS_PER_SECOND
    /// - POSIX9_HOSTNAME
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, "POSIX9_MAX_THREADS")? {
            config.max_threads = v as usize;
        }
        if let Some(v) = parse_var(&lookup, "POSIX9_MAX_SOCKETS")? {
            config.max_sockets = v as usize;
        }
        if let Some(v) = parse_var(&lookup, "POSIX9_MAX_KEYS")? {
            config.max_keys = v as usize;
        }
        if let Some(v) = parse_var(&lookup, "POSIX9_TICKS_PER_SECOND")? {
            config.ticks_per_second = v;
        }
        if let Some(name) = lookup("POSIX9_HOSTNAME") {
            if !name.is_empty() {
                config.hostname = name.into();
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document; missing fields keep their defaults
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string().into()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_threads < 2 {
            return Err(ConfigError::OutOfRange(
                format!("max_threads = {}", self.max_threads).into(),
            ));
        }
        if self.ticks_per_second == 0 {
            return Err(ConfigError::OutOfRange("ticks_per_second = 0".into()));
        }
        if self.socket_fd_base <= 2 {
            return Err(ConfigError::OutOfRange(
                format!("socket_fd_base = {}", self.socket_fd_base).into(),
            ));
        }
        Ok(())
    }
}

fn parse_var<F>(lookup: &F, key: &str) -> ConfigResult<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(v) if v > 0 => Ok(Some(v)),
            _ => Err(ConfigError::InvalidValue {
                key: key.into(),
                value: raw.into(),
            }),
        },
    }
}
