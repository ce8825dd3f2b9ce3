//! Connecter: non-blocking outbound stream connections for reactor-driven I/O.
//!
//! # Overview
//!
//! A [`Connecter`](net::Connecter) resolves a `tcp` or `ipc` address, creates a
//! non-blocking socket, starts the connect and reports whether it completed
//! immediately or is still in flight. The owning reactor waits for
//! write-readiness on the exposed handle and then finalizes the attempt, which
//! either hands over an established [`Connection`](net::Connection) or
//! releases the socket and reports a classified error.
//!
//! # Core Guarantees
//!
//! - **Single owner**: at most one socket per connecter; ownership moves to the
//!   caller on success and is released on every other path
//! - **Never blocks**: every operation returns promptly; waiting is the
//!   reactor's job (or [`net::connect_blocking`]'s)
//! - **Classified failures**: network failures are recoverable, lifecycle
//!   misuse and unrecognized OS codes are fatal
//!
//! # Module Structure
//!
//! - [`net`]: resolution, the connecter state machine, blocking driver
//! - [`config`]: socket options and `CONNECTER_*` environment overrides
//! - [`error`]: error kinds, categories and recovery classification
//! - [`tracing_compat`]: logging macros that compile out without tracing

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod config;
pub mod error;
pub mod net;
pub mod tracing_compat;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::{ConfigError, ConnectOptions};
pub use error::{Error, ErrorCategory, ErrorKind, Recoverability, RecoveryAction, Result};
pub use net::{Connecter, Connection, Endpoint, Family, Progress, Protocol, State};
