//! Socket options applied to every connection attempt.
//!
//! # Configuration Precedence
//!
//! Settings are resolved in this order (highest priority first):
//!
//! 1. **Programmatic** — values set via builder methods (`nodelay(false)`)
//! 2. **Environment variables** — values from `CONNECTER_*` env vars
//! 3. **Defaults** — built-in defaults from [`ConnectOptions::default()`]
//!
//! # Supported Environment Variables
//!
//! | Variable | Type | Maps to |
//! |----------|------|---------|
//! | `CONNECTER_NODELAY` | `bool` | `nodelay` |
//! | `CONNECTER_KEEPALIVE_SECS` | `u64` | `keepalive` |
//! | `CONNECTER_SEND_BUFFER` | `usize` | `send_buffer_size` |
//! | `CONNECTER_RECV_BUFFER` | `usize` | `recv_buffer_size` |

use std::time::Duration;

/// Environment variable name for the TCP no-delay toggle.
pub const ENV_NODELAY: &str = "CONNECTER_NODELAY";
/// Environment variable name for the TCP keepalive idle time in seconds.
pub const ENV_KEEPALIVE_SECS: &str = "CONNECTER_KEEPALIVE_SECS";
/// Environment variable name for the socket send buffer size.
pub const ENV_SEND_BUFFER: &str = "CONNECTER_SEND_BUFFER";
/// Environment variable name for the socket receive buffer size.
pub const ENV_RECV_BUFFER: &str = "CONNECTER_RECV_BUFFER";

/// Errors produced while loading [`ConnectOptions`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but its value does not parse.
    #[error("invalid value for {var}: expected {expected}, got {value:?}")]
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// Human-readable expected type.
        expected: &'static str,
        /// The raw value found.
        value: String,
    },
}

/// Options applied to the socket of each connection attempt.
///
/// Non-blocking mode is not an option: every socket is non-blocking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Disable send coalescing (Nagle) on Internet-family sockets.
    pub nodelay: bool,
    /// TCP keepalive idle time; `None` leaves the OS default.
    pub keepalive: Option<Duration>,
    /// `SO_SNDBUF` size; `None` leaves the OS default.
    pub send_buffer_size: Option<usize>,
    /// `SO_RCVBUF` size; `None` leaves the OS default.
    pub recv_buffer_size: Option<usize>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            nodelay: true,
            keepalive: None,
            send_buffer_size: None,
            recv_buffer_size: None,
        }
    }
}

impl ConnectOptions {
    /// Defaults overridden by any `CONNECTER_*` variables in the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut options = Self::default();
        apply_env_overrides(&mut options)?;
        Ok(options)
    }

    /// Enable or disable TCP_NODELAY.
    #[must_use]
    pub fn nodelay(mut self, enable: bool) -> Self {
        self.nodelay = enable;
        self
    }

    /// Configure TCP keepalive. The idle time must be non-zero; the OS
    /// rejects a zero idle time when the socket is opened.
    #[must_use]
    pub fn keepalive(mut self, keepalive: Option<Duration>) -> Self {
        self.keepalive = keepalive;
        self
    }

    /// Set the socket send buffer size.
    #[must_use]
    pub fn send_buffer_size(mut self, size: usize) -> Self {
        self.send_buffer_size = Some(size);
        self
    }

    /// Set the socket receive buffer size.
    #[must_use]
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = Some(size);
        self
    }
}

/// Apply environment variable overrides to a [`ConnectOptions`].
///
/// Only variables that are set in the environment are applied.
/// Returns an error if a variable is set but contains an unparseable value.
pub fn apply_env_overrides(options: &mut ConnectOptions) -> Result<(), ConfigError> {
    apply_overrides_from(options, |name| std::env::var(name).ok())
}

fn apply_overrides_from<F>(options: &mut ConnectOptions, read: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = read(ENV_NODELAY) {
        options.nodelay = parse_bool(ENV_NODELAY, &val)?;
    }
    if let Some(val) = read(ENV_KEEPALIVE_SECS) {
        let secs = parse_u64(ENV_KEEPALIVE_SECS, &val)?;
        if secs == 0 {
            return Err(invalid(ENV_KEEPALIVE_SECS, "positive u64", &val));
        }
        options.keepalive = Some(Duration::from_secs(secs));
    }
    if let Some(val) = read(ENV_SEND_BUFFER) {
        options.send_buffer_size = Some(parse_usize(ENV_SEND_BUFFER, &val)?);
    }
    if let Some(val) = read(ENV_RECV_BUFFER) {
        options.recv_buffer_size = Some(parse_usize(ENV_RECV_BUFFER, &val)?);
    }
    Ok(())
}

fn invalid(var: &'static str, expected: &'static str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        var,
        expected,
        value: value.to_owned(),
    }
}

fn parse_usize(var: &'static str, val: &str) -> Result<usize, ConfigError> {
    val.trim()
        .parse::<usize>()
        .map_err(|_| invalid(var, "unsigned integer", val))
}

fn parse_u64(var: &'static str, val: &str) -> Result<u64, ConfigError> {
    val.trim()
        .parse::<u64>()
        .map_err(|_| invalid(var, "u64", val))
}

fn parse_bool(var: &'static str, val: &str) -> Result<bool, ConfigError> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(invalid(var, "bool (true/false/1/0/yes/no)", val)),
    }
}
