//! Non-blocking connection attempts.
//!
//! A [`Connecter`] owns at most one socket at a time and walks it through a
//! single connection attempt:
//!
//! ```text
//!            open()                     finalize()
//!  Closed ───────────▶ Opening ─────────────────────▶ Closed (+ Connection)
//!    ▲   └───────────▶ Ready   ─────────────────────▶ Closed (+ Connection)
//!    │                    │         (failure)          Closed (+ Error)
//!    └──── close() ───────┘
//! ```
//!
//! The connecter never blocks. When [`open`](Connecter::open) returns
//! [`Progress::Pending`], the caller registers [`handle`](Connecter::handle)
//! with its reactor for write-readiness and calls
//! [`finalize`](Connecter::finalize) once the reactor reports it.
//!
//! # Example
//!
//! ```ignore
//! use connecter::net::{Connecter, Progress};
//!
//! let mut connecter = Connecter::new();
//! connecter.set_address("tcp", "127.0.0.1:5555")?;
//! match connecter.open()? {
//!     Progress::Connected => {}
//!     Progress::Pending => reactor.wait_writable(connecter.handle().unwrap())?,
//! }
//! let connection = connecter.finalize()?;
//! ```

use crate::config::ConnectOptions;
use crate::error::{Error, Result};
use crate::net::resolve::{Endpoint, Family, Resolve, SystemResolver};
use crate::net::sys::{self, ConnectStart, RawHandle};
use crate::tracing_compat::{debug, error, trace, warn};
use socket2::Socket;
use std::io::{self, Read, Write};
use std::mem;
use std::net::TcpStream;
#[cfg(unix)]
use std::os::unix::net::UnixStream;

/// Result of [`Connecter::open`] when no error occurred.
#[must_use = "a pending connect must be finalized or closed"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// The connect completed inside `open`; call `finalize` to take the
    /// connection.
    Connected,
    /// The connect is in flight; wait for write-readiness on the handle,
    /// then call `finalize`.
    Pending,
}

/// Observable lifecycle state of a [`Connecter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No socket owned.
    Closed,
    /// Connect issued and not yet confirmed.
    Opening,
    /// Connect completed synchronously; waiting for `finalize`.
    Ready,
}

/// The socket slot. Moving a socket out always leaves `Retired` behind.
#[derive(Debug)]
enum Slot {
    Retired,
    Opening(Socket),
    Ready(Socket),
}

impl Slot {
    fn socket(&self) -> Option<&Socket> {
        match self {
            Self::Retired => None,
            Self::Opening(socket) | Self::Ready(socket) => Some(socket),
        }
    }

    fn take(&mut self) -> Option<Socket> {
        match mem::replace(self, Self::Retired) {
            Self::Retired => None,
            Self::Opening(socket) | Self::Ready(socket) => Some(socket),
        }
    }
}

/// Drives one outbound stream connection attempt at a time.
///
/// The connecter exclusively owns its socket from `open` until the socket is
/// handed to the caller by `finalize` or released by `close`, a failure, or
/// drop. It holds no locks and is meant to be driven by a single reactor
/// thread.
#[derive(Debug)]
pub struct Connecter {
    endpoint: Option<Endpoint>,
    options: ConnectOptions,
    slot: Slot,
}

impl Default for Connecter {
    fn default() -> Self {
        Self::new()
    }
}

impl Connecter {
    /// Creates an empty connecter with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(ConnectOptions::default())
    }

    /// Creates an empty connecter that applies `options` to each socket.
    #[must_use]
    pub fn with_options(options: ConnectOptions) -> Self {
        Self {
            endpoint: None,
            options,
            slot: Slot::Retired,
        }
    }

    /// Creates a connecter for an already resolved endpoint.
    #[must_use]
    pub fn for_endpoint(endpoint: Endpoint, options: ConnectOptions) -> Self {
        Self {
            endpoint: Some(endpoint),
            options,
            slot: Slot::Retired,
        }
    }

    /// Resolves `address` for protocol `tag` with the system resolver and
    /// records it as the target.
    ///
    /// Unknown tags fail with `ProtocolUnsupported` before any socket exists.
    pub fn set_address(&mut self, tag: &str, address: &str) -> Result<()> {
        self.set_address_with(&SystemResolver, tag, address)
    }

    /// Like [`set_address`](Self::set_address) with a caller-supplied resolver.
    pub fn set_address_with<R: Resolve>(
        &mut self,
        resolver: &R,
        tag: &str,
        address: &str,
    ) -> Result<()> {
        let protocol = tag.parse()?;
        let endpoint = resolver.resolve(protocol, address)?;
        self.set_endpoint(endpoint)
    }

    /// Records a resolved endpoint as the target.
    ///
    /// The target is fixed once set.
    pub fn set_endpoint(&mut self, endpoint: Endpoint) -> Result<()> {
        if let Some(existing) = &self.endpoint {
            return Err(self.misuse(
                "set_endpoint",
                format_args!("target already resolved to {existing}"),
            ));
        }
        debug!(endpoint = %endpoint, "connect target resolved");
        self.endpoint = Some(endpoint);
        Ok(())
    }

    /// Creates a socket, configures it and issues a non-blocking connect.
    ///
    /// Returns [`Progress::Connected`] when the connect completed inside the
    /// call and [`Progress::Pending`] when it is in flight. On error the
    /// socket has already been released.
    pub fn open(&mut self) -> Result<Progress> {
        if self.slot.socket().is_some() {
            return Err(self.misuse("open", "a connection attempt is already underway"));
        }
        let Some(endpoint) = self.endpoint.as_ref() else {
            return Err(self.misuse("open", "no target address has been set"));
        };
        let family = endpoint.family();

        let socket = sys::create(endpoint)?;
        if let Err(err) = sys::configure(&socket, family, &self.options) {
            sys::release(socket);
            if err.is_fatal() {
                error!(endpoint = %endpoint, error = %err, "socket configuration rejected");
            } else {
                warn!(endpoint = %endpoint, error = %err, "socket option rejected");
            }
            return Err(err);
        }

        match sys::connect(&socket, endpoint) {
            Ok(ConnectStart::Connected) => {
                debug!(
                    endpoint = %endpoint,
                    family = ?family,
                    fd = ?sys::raw_handle(&socket),
                    "connected immediately"
                );
                self.slot = Slot::Ready(socket);
                Ok(Progress::Connected)
            }
            Ok(ConnectStart::InProgress) => {
                debug!(
                    endpoint = %endpoint,
                    family = ?family,
                    fd = ?sys::raw_handle(&socket),
                    "connect in progress"
                );
                self.slot = Slot::Opening(socket);
                Ok(Progress::Pending)
            }
            Err(err) => {
                sys::release(socket);
                warn!(endpoint = %endpoint, error = %err, "connect failed");
                Err(err)
            }
        }
    }

    /// Completes the attempt after the reactor reported write-readiness.
    ///
    /// The connecter is `Closed` afterwards whatever the outcome: the socket
    /// is either returned inside the [`Connection`] or released.
    pub fn finalize(&mut self) -> Result<Connection> {
        let Some(socket) = self.slot.take() else {
            return Err(self.misuse("finalize", "no connection attempt is underway"));
        };
        let code = sys::pending_error(&socket);
        self.complete(socket, code)
    }

    /// Like [`finalize`](Self::finalize), but tolerates spurious readiness.
    ///
    /// Returns `Ok(None)` and keeps the attempt open while the socket reports
    /// no error and has no connected peer yet.
    pub fn try_finalize(&mut self) -> Result<Option<Connection>> {
        let Some(socket) = self.slot.socket() else {
            return Err(self.misuse("try_finalize", "no connection attempt is underway"));
        };
        let mut code = sys::pending_error(socket);
        if code == 0 {
            match sys::peer_connected(socket) {
                Ok(true) => {}
                Ok(false) => {
                    trace!(fd = ?sys::raw_handle(socket), "connect still in flight");
                    return Ok(None);
                }
                Err(err) => code = sys::os_code(&err),
            }
        }
        match self.slot.take() {
            Some(socket) => self.complete(socket, code).map(Some),
            None => Err(self.misuse("try_finalize", "socket vanished while polling")),
        }
    }

    /// Abandons the attempt and releases the socket.
    ///
    /// The connecter no longer owns a socket when this returns.
    pub fn close(&mut self) -> Result<()> {
        let Some(socket) = self.slot.take() else {
            return Err(self.misuse("close", "no socket is owned"));
        };
        debug!(fd = ?sys::raw_handle(&socket), "connection attempt abandoned");
        sys::release(socket);
        Ok(())
    }

    /// Raw handle of the owned socket, for write-readiness registration.
    ///
    /// `None` is the retired sentinel: no socket is owned.
    #[must_use]
    pub fn handle(&self) -> Option<RawHandle> {
        self.slot.socket().map(sys::raw_handle)
    }

    /// The owned socket, for reactors that register sources by reference.
    #[must_use]
    pub fn source(&self) -> Option<&Socket> {
        self.slot.socket()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> State {
        match self.slot {
            Slot::Retired => State::Closed,
            Slot::Opening(_) => State::Opening,
            Slot::Ready(_) => State::Ready,
        }
    }

    /// The resolved target, if one has been set.
    #[must_use]
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    /// Address family of the target, if one has been set.
    #[must_use]
    pub fn family(&self) -> Option<Family> {
        self.endpoint.as_ref().map(Endpoint::family)
    }

    /// Options applied to each socket.
    #[must_use]
    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    fn complete(&self, socket: Socket, code: i32) -> Result<Connection> {
        if code != 0 {
            sys::release(socket);
            return Err(self.failed(code));
        }

        let family = self.family().unwrap_or(Family::Inet);
        debug!(
            endpoint = ?self.endpoint,
            fd = ?sys::raw_handle(&socket),
            "connection established"
        );
        Ok(Connection::from_socket(socket, family))
    }

    fn failed(&self, code: i32) -> Error {
        let err = match &self.endpoint {
            Some(endpoint) => sys::pending_failure(code, endpoint),
            None => Error::invalid_transition("finalize", "socket owned without a target"),
        };
        if err.is_fatal() {
            error!(error = %err, "connect completed with an unrecognized error");
        } else {
            warn!(error = %err, "connect failed");
        }
        err
    }

    fn misuse(&self, operation: &str, detail: impl std::fmt::Display) -> Error {
        let err = Error::invalid_transition(operation, detail);
        error!(state = ?self.state(), error = %err, "connecter misuse");
        err
    }
}

impl Drop for Connecter {
    fn drop(&mut self) {
        if let Some(socket) = self.slot.take() {
            debug!(fd = ?sys::raw_handle(&socket), "releasing unfinished connection attempt");
            sys::release(socket);
        }
    }
}

/// An established stream connection, owned by the caller.
///
/// The stream is still in non-blocking mode.
#[derive(Debug)]
pub enum Connection {
    /// TCP connection.
    Tcp(TcpStream),
    /// Local stream connection.
    #[cfg(unix)]
    Local(UnixStream),
}

impl Connection {
    fn from_socket(socket: Socket, family: Family) -> Self {
        match family {
            Family::Inet => Self::Tcp(socket.into()),
            #[cfg(unix)]
            Family::Local => Self::Local(socket.into()),
            #[cfg(not(unix))]
            Family::Local => Self::Tcp(socket.into()),
        }
    }

    /// Address family of the connection.
    #[must_use]
    pub fn family(&self) -> Family {
        match self {
            Self::Tcp(_) => Family::Inet,
            #[cfg(unix)]
            Self::Local(_) => Family::Local,
        }
    }

    /// Raw OS handle of the connection.
    #[cfg(unix)]
    #[must_use]
    pub fn raw_handle(&self) -> RawHandle {
        use std::os::unix::io::AsRawFd;
        match self {
            Self::Tcp(stream) => stream.as_raw_fd(),
            Self::Local(stream) => stream.as_raw_fd(),
        }
    }

    /// Raw OS handle of the connection.
    #[cfg(windows)]
    #[must_use]
    pub fn raw_handle(&self) -> RawHandle {
        use std::os::windows::io::AsRawSocket;
        match self {
            Self::Tcp(stream) => stream.as_raw_socket(),
        }
    }

    /// The TCP stream, if this is a TCP connection.
    #[must_use]
    pub fn into_tcp(self) -> Option<TcpStream> {
        match self {
            Self::Tcp(stream) => Some(stream),
            #[cfg(unix)]
            Self::Local(_) => None,
        }
    }

    /// The local stream, if this is a local connection.
    #[cfg(unix)]
    #[must_use]
    pub fn into_local(self) -> Option<UnixStream> {
        match self {
            Self::Local(stream) => Some(stream),
            Self::Tcp(_) => None,
        }
    }

    /// Shut down the read, write, or both halves of the connection.
    pub fn shutdown(&self, how: std::net::Shutdown) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.shutdown(how),
            #[cfg(unix)]
            Self::Local(stream) => stream.shutdown(how),
        }
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Local(stream) => stream.read(buf),
        }
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Local(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Local(stream) => stream.flush(),
        }
    }
}
