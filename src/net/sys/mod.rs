//! Platform socket primitives.
//!
//! Thin wrappers over `socket2` for the six operations a connection attempt
//! needs: create, set non-blocking, set no-delay, connect, query the pending
//! error, release. Raw OS error codes are normalized into [`OsErrorClass`]
//! by a per-platform `classify` before anything else looks at them.

use crate::config::ConnectOptions;
use crate::error::{Error, ErrorKind, Result};
use crate::net::resolve::{Endpoint, Family};
use socket2::{Domain, Protocol, SockAddr, Socket, TcpKeepalive, Type};
use std::io;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
use unix as platform;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
use windows as platform;

/// Raw OS handle of a socket, as handed to a reactor for registration.
#[cfg(unix)]
pub type RawHandle = std::os::unix::io::RawFd;

/// Raw OS handle of a socket, as handed to a reactor for registration.
#[cfg(windows)]
pub type RawHandle = std::os::windows::io::RawSocket;

/// Stand-in code for an `io::Error` that carries no OS error number.
const NO_OS_CODE: i32 = -1;

/// Platform-neutral classification of a raw OS error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OsErrorClass {
    /// Code zero: no error.
    None,
    /// Non-blocking connect launched and still in flight.
    InProgress,
    /// Operation would block.
    WouldBlock,
    /// Interrupted by a signal.
    Interrupted,
    Refused,
    NetworkUnreachable,
    HostUnreachable,
    TimedOut,
    Reset,
    Aborted,
    AddressUnavailable,
    NotFound,
    PermissionDenied,
    ResourceExhausted,
    /// Anything outside the vocabulary above.
    Unrecognized,
}

impl OsErrorClass {
    /// True for the closed set of codes a failed connect legitimately
    /// reports once the attempt has completed.
    pub(crate) const fn is_connect_failure(self) -> bool {
        matches!(
            self,
            Self::Refused
                | Self::NetworkUnreachable
                | Self::HostUnreachable
                | Self::TimedOut
                | Self::Reset
                | Self::Aborted
                | Self::AddressUnavailable
                | Self::NotFound
                | Self::PermissionDenied
                | Self::WouldBlock
        )
    }

    /// The error kind a connect failure of this class maps to for `family`.
    const fn connect_error_kind(self, family: Family) -> ErrorKind {
        match self {
            Self::Refused => ErrorKind::ConnectionRefused,
            Self::NetworkUnreachable => ErrorKind::NetworkUnreachable,
            Self::HostUnreachable => ErrorKind::HostUnreachable,
            Self::TimedOut => ErrorKind::TimedOut,
            Self::Reset => ErrorKind::ConnectionReset,
            Self::Aborted => ErrorKind::ConnectionAborted,
            Self::AddressUnavailable => ErrorKind::AddressUnavailable,
            Self::NotFound => ErrorKind::NotFound,
            Self::PermissionDenied => ErrorKind::PermissionDenied,
            Self::ResourceExhausted => ErrorKind::ResourceExhausted,
            // A local listener with a full backlog; for TCP, no free
            // ephemeral port.
            Self::WouldBlock => match family {
                Family::Local => ErrorKind::PeerBusy,
                Family::Inet => ErrorKind::AddressUnavailable,
            },
            Self::None | Self::InProgress | Self::Interrupted | Self::Unrecognized => {
                ErrorKind::ConnectFailed
            }
        }
    }
}

/// Normalize a raw OS error code.
pub(crate) fn classify(code: i32) -> OsErrorClass {
    if code == NO_OS_CODE {
        return OsErrorClass::Unrecognized;
    }
    platform::classify(code)
}

/// The raw OS code of `err`, or the no-code sentinel.
pub(crate) fn os_code(err: &io::Error) -> i32 {
    err.raw_os_error().unwrap_or(NO_OS_CODE)
}

fn os_error(kind: ErrorKind, what: &str, err: io::Error) -> Error {
    let code = os_code(&err);
    let error = Error::new(kind).with_message(what.to_owned());
    let error = if code == NO_OS_CODE {
        error
    } else {
        error.with_os_code(code)
    };
    error.with_source(err)
}

/// Outcome of issuing a non-blocking connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConnectStart {
    /// The connection completed inside the connect call.
    Connected,
    /// The connection is in flight; wait for write-readiness.
    InProgress,
}

/// Allocate a stream socket for the endpoint's family.
pub(crate) fn create(endpoint: &Endpoint) -> Result<Socket> {
    let (domain, protocol) = match endpoint {
        Endpoint::Inet(addr) => (Domain::for_address(*addr), Some(Protocol::TCP)),
        #[cfg(unix)]
        Endpoint::Local(_) => (Domain::UNIX, None),
    };
    Socket::new(domain, Type::STREAM, protocol).map_err(|err| {
        let kind = match classify(os_code(&err)) {
            OsErrorClass::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::ResourceExhausted,
        };
        os_error(kind, "socket creation failed", err)
    })
}

/// Put the socket in non-blocking mode and apply `options`.
///
/// Non-blocking mode and TCP no-delay are expected to always succeed; a
/// failure there is an invariant violation. Optional tuning failures are
/// ordinary configuration errors.
pub(crate) fn configure(socket: &Socket, family: Family, options: &ConnectOptions) -> Result<()> {
    socket
        .set_nonblocking(true)
        .map_err(|err| os_error(ErrorKind::ConfigurationRejected, "set non-blocking mode", err))?;

    if family == Family::Inet {
        if options.nodelay {
            socket.set_nodelay(true).map_err(|err| {
                os_error(ErrorKind::ConfigurationRejected, "set TCP_NODELAY", err)
            })?;
        }
        if let Some(idle) = options.keepalive {
            let params = TcpKeepalive::new().with_time(idle);
            socket
                .set_tcp_keepalive(&params)
                .map_err(|err| os_error(ErrorKind::SocketOption, "set TCP keepalive", err))?;
        }
    }

    if let Some(size) = options.send_buffer_size {
        socket
            .set_send_buffer_size(size)
            .map_err(|err| os_error(ErrorKind::SocketOption, "set SO_SNDBUF", err))?;
    }
    if let Some(size) = options.recv_buffer_size {
        socket
            .set_recv_buffer_size(size)
            .map_err(|err| os_error(ErrorKind::SocketOption, "set SO_RCVBUF", err))?;
    }
    Ok(())
}

fn sock_addr(endpoint: &Endpoint) -> Result<SockAddr> {
    match endpoint {
        Endpoint::Inet(addr) => Ok(SockAddr::from(*addr)),
        #[cfg(unix)]
        Endpoint::Local(path) => SockAddr::unix(path).map_err(|err| {
            Error::invalid_address(format!("{} is not a valid local socket path", path.display()))
                .with_source(err)
        }),
    }
}

/// Issue a non-blocking connect toward `endpoint`.
///
/// Local-family connects never pend: the kernel completes or fails them
/// inside the call.
pub(crate) fn connect(socket: &Socket, endpoint: &Endpoint) -> Result<ConnectStart> {
    let addr = sock_addr(endpoint)?;
    let family = endpoint.family();
    match socket.connect(&addr) {
        Ok(()) => Ok(ConnectStart::Connected),
        Err(err) => {
            let class = classify(os_code(&err));
            if family == Family::Inet && platform::connect_pending(class) {
                return Ok(ConnectStart::InProgress);
            }
            Err(os_error(
                class.connect_error_kind(family),
                &format!("connect to {endpoint}"),
                err,
            ))
        }
    }
}

/// Read and clear the socket's pending error (`SO_ERROR`).
///
/// Returns 0 when the connect completed cleanly. If the query itself
/// fails, the query's own error code is returned in its place.
pub(crate) fn pending_error(socket: &Socket) -> i32 {
    match socket.take_error() {
        Ok(None) => 0,
        Ok(Some(err)) | Err(err) => os_code(&err),
    }
}

/// Map a non-zero pending error into the error `finalize` reports.
///
/// Codes outside the recognized connect-failure set mean the attempt was
/// misused rather than refused by the network.
pub(crate) fn pending_failure(code: i32, endpoint: &Endpoint) -> Error {
    let class = classify(code);
    let family = endpoint.family();
    let error = if class.is_connect_failure() {
        Error::new(class.connect_error_kind(family))
            .with_message(format!("connect to {endpoint}"))
    } else {
        Error::new(ErrorKind::UnexpectedOsError).with_message(format!(
            "unrecognized pending error while connecting to {endpoint}"
        ))
    };
    if code == NO_OS_CODE {
        error
    } else {
        error.with_os_code(code)
    }
}

/// Whether the socket has a connected peer yet.
///
/// `Ok(false)` means the connect is still in flight.
pub(crate) fn peer_connected(socket: &Socket) -> io::Result<bool> {
    match socket.peer_addr() {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotConnected => Ok(false),
        Err(err) => Err(err),
    }
}

/// The raw OS handle of `socket`.
#[cfg(unix)]
pub(crate) fn raw_handle(socket: &Socket) -> RawHandle {
    use std::os::unix::io::AsRawFd;
    socket.as_raw_fd()
}

/// The raw OS handle of `socket`.
#[cfg(windows)]
pub(crate) fn raw_handle(socket: &Socket) -> RawHandle {
    use std::os::windows::io::AsRawSocket;
    socket.as_raw_socket()
}

/// Close the socket at the OS level.
///
/// The close status is not observable through an owned socket; the handle
/// is gone once this returns either way.
pub(crate) fn release(socket: Socket) {
    drop(socket);
}
