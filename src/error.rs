//! Error types and error handling strategy for connection attempts.
//!
//! Error handling follows these principles:
//!
//! - Errors are explicit and typed (no stringly-typed errors)
//! - A non-blocking connect that is still in flight is **not** an error; it
//!   is reported as [`Progress::Pending`](crate::net::Progress::Pending)
//! - Genuine failures are classified by recoverability so that a retry
//!   policy can be layered on top
//! - Caller misuse and broken OS contracts are a separate, fatal category
//!
//! # Error Categories
//!
//! - **Config**: unsupported protocol tag, malformed or unresolvable address,
//!   rejected socket tuning option
//! - **Resource**: socket creation failed (descriptor exhaustion, permissions)
//! - **Network**: the peer or the network refused or dropped the attempt
//! - **Invariant**: lifecycle misuse, unrecognized OS error codes, or a
//!   configuration call failing where the OS guarantees success
//!
//! # Recovery Classification
//!
//! All errors can be classified by [`Recoverability`]:
//! - `Transient`: temporary failure, a new attempt may succeed
//! - `Permanent`: a new attempt with the same input will fail the same way
//! - `Fatal`: a logic bug; the `Connecter` that produced it must not be
//!   driven further

use core::fmt;
use std::io;
use std::sync::Arc;

/// The kind of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // === Config ===
    /// The protocol tag is neither `tcp` nor `ipc` (or `ipc` on a platform
    /// without local stream sockets).
    ProtocolUnsupported,
    /// The address string is malformed for its protocol.
    InvalidAddress,
    /// Name resolution failed or returned no addresses.
    ResolutionFailed,
    /// An optional socket tuning option was rejected by the OS.
    SocketOption,

    // === Resource ===
    /// The OS could not allocate a socket (descriptor or buffer exhaustion).
    ResourceExhausted,
    /// The OS denied the operation.
    PermissionDenied,

    // === Network ===
    /// The peer actively refused the connection.
    ConnectionRefused,
    /// No route to the destination network.
    NetworkUnreachable,
    /// No route to the destination host.
    HostUnreachable,
    /// The connection attempt timed out.
    TimedOut,
    /// The peer reset the connection during establishment.
    ConnectionReset,
    /// The connection was aborted locally during establishment.
    ConnectionAborted,
    /// The local or remote address cannot be used.
    AddressUnavailable,
    /// The local socket path does not exist.
    NotFound,
    /// The local listener cannot accept more pending connections.
    PeerBusy,
    /// The connect call failed with an error outside the recognized set.
    ConnectFailed,

    // === Invariant ===
    /// An operation was invoked out of lifecycle order.
    InvalidStateTransition,
    /// The OS reported an error code outside the recognized set.
    UnexpectedOsError,
    /// A configuration call the OS is expected to honor failed.
    ConfigurationRejected,
}

impl ErrorKind {
    /// Returns the error category for this kind.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::ProtocolUnsupported
            | Self::InvalidAddress
            | Self::ResolutionFailed
            | Self::SocketOption => ErrorCategory::Config,
            Self::ResourceExhausted | Self::PermissionDenied => ErrorCategory::Resource,
            Self::ConnectionRefused
            | Self::NetworkUnreachable
            | Self::HostUnreachable
            | Self::TimedOut
            | Self::ConnectionReset
            | Self::ConnectionAborted
            | Self::AddressUnavailable
            | Self::NotFound
            | Self::PeerBusy
            | Self::ConnectFailed => ErrorCategory::Network,
            Self::InvalidStateTransition
            | Self::UnexpectedOsError
            | Self::ConfigurationRejected => ErrorCategory::Invariant,
        }
    }

    /// Returns the recoverability classification for this error kind.
    ///
    /// This helps retry logic decide whether to attempt another connection.
    #[must_use]
    pub const fn recoverability(&self) -> Recoverability {
        match self {
            // Transient errors - a later attempt may succeed
            Self::ResourceExhausted
            | Self::ResolutionFailed
            | Self::ConnectionRefused
            | Self::NetworkUnreachable
            | Self::HostUnreachable
            | Self::TimedOut
            | Self::ConnectionReset
            | Self::ConnectionAborted
            | Self::AddressUnavailable
            | Self::NotFound
            | Self::PeerBusy => Recoverability::Transient,

            // Permanent errors - same input, same failure
            Self::ProtocolUnsupported
            | Self::InvalidAddress
            | Self::SocketOption
            | Self::PermissionDenied
            | Self::ConnectFailed => Recoverability::Permanent,

            // Logic bugs
            Self::InvalidStateTransition
            | Self::UnexpectedOsError
            | Self::ConfigurationRejected => Recoverability::Fatal,
        }
    }

    /// Returns true if this error is typically retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.recoverability(), Recoverability::Transient)
    }

    /// Returns the recommended recovery action for this error kind.
    #[must_use]
    pub const fn recovery_action(&self) -> RecoveryAction {
        match self.recoverability() {
            Recoverability::Transient => RecoveryAction::RetryWithBackoff,
            Recoverability::Permanent => RecoveryAction::Propagate,
            Recoverability::Fatal => RecoveryAction::Escalate,
        }
    }
}

/// Classification of error recoverability for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recoverability {
    /// Temporary failure that may succeed on a later attempt.
    Transient,
    /// Failure that will recur for the same protocol and address.
    Permanent,
    /// Invariant violation; the connecter state can no longer be trusted.
    Fatal,
}

impl Recoverability {
    /// Returns true if this error is safe to retry.
    #[must_use]
    pub const fn should_retry(&self) -> bool {
        matches!(self, Self::Transient)
    }

    /// Returns true if this error should never be retried.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent | Self::Fatal)
    }
}

/// Recommended recovery action for an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecoveryAction {
    /// Start a fresh attempt after a backoff chosen by the caller.
    RetryWithBackoff,
    /// Report the error to the caller without retry.
    Propagate,
    /// Stop using the connecter and surface the bug.
    Escalate,
}

/// High-level error category for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Endpoint or option configuration failures.
    Config,
    /// OS resource failures.
    Resource,
    /// Network-level connection failures.
    Network,
    /// Programmer errors and broken OS contracts.
    Invariant,
}

/// The main error type for connection attempts.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    os_code: Option<i32>,
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            os_code: None,
            source: None,
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Adds a message description to the error.
    #[must_use]
    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Records the raw OS error code that produced this error.
    #[must_use]
    pub const fn with_os_code(mut self, code: i32) -> Self {
        self.os_code = Some(code);
        self
    }

    /// Adds a source error to the chain.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Creates an invalid-state-transition error for `operation`.
    #[must_use]
    pub fn invalid_transition(operation: &str, detail: impl fmt::Display) -> Self {
        Self::new(ErrorKind::InvalidStateTransition).with_message(format!("{operation}: {detail}"))
    }

    /// Creates an unsupported-protocol error.
    #[must_use]
    pub fn protocol_unsupported(tag: &str) -> Self {
        Self::new(ErrorKind::ProtocolUnsupported)
            .with_message(format!("unsupported protocol tag {tag:?}"))
    }

    /// Creates an invalid-address error.
    #[must_use]
    pub fn invalid_address(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidAddress).with_message(detail)
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Returns the recoverability classification.
    #[must_use]
    pub const fn recoverability(&self) -> Recoverability {
        self.kind.recoverability()
    }

    /// Returns true if this error is typically retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Returns the recommended recovery action for this error.
    #[must_use]
    pub const fn recovery_action(&self) -> RecoveryAction {
        self.kind.recovery_action()
    }

    /// Returns true if this error is an invariant violation.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self.kind.category(), ErrorCategory::Invariant)
    }

    /// Returns true if this is a network-level connection failure.
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        matches!(self.kind.category(), ErrorCategory::Network)
    }

    /// Returns the error message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns the raw OS error code, if the error came from the OS.
    #[must_use]
    pub const fn os_code(&self) -> Option<i32> {
        self.os_code
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(msg) = &self.message {
            write!(f, ": {msg}")?;
        }
        if let Some(code) = self.os_code {
            write!(f, " (os error {code})")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        if let Some(code) = err.os_code {
            return Self::from_raw_os_error(code);
        }
        let kind = match err.kind {
            ErrorKind::ConnectionRefused => io::ErrorKind::ConnectionRefused,
            ErrorKind::ConnectionReset => io::ErrorKind::ConnectionReset,
            ErrorKind::ConnectionAborted => io::ErrorKind::ConnectionAborted,
            ErrorKind::TimedOut => io::ErrorKind::TimedOut,
            ErrorKind::NotFound => io::ErrorKind::NotFound,
            ErrorKind::PermissionDenied => io::ErrorKind::PermissionDenied,
            ErrorKind::AddressUnavailable => io::ErrorKind::AddrNotAvailable,
            ErrorKind::ProtocolUnsupported => io::ErrorKind::Unsupported,
            ErrorKind::InvalidAddress => io::ErrorKind::InvalidInput,
            _ => io::ErrorKind::Other,
        };
        Self::new(kind, err)
    }
}

/// A specialized Result type for connection attempts.
pub type Result<T> = core::result::Result<T, Error>;
