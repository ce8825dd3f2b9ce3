//! Endpoint resolution.
//!
//! Turns a protocol tag plus an address string into an [`Endpoint`]: a
//! concrete socket address tagged with its [`Family`]. Resolution is
//! synchronous and has no effect on any [`Connecter`](super::Connecter).

use crate::error::{Error, ErrorKind, Result};
use std::fmt;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
#[cfg(unix)]
use std::path::PathBuf;
use std::str::FromStr;

/// Transport protocol named by an endpoint tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// `tcp`: TCP over IPv4 or IPv6.
    Tcp,
    /// `ipc`: local stream socket addressed by a filesystem path.
    Ipc,
}

impl Protocol {
    /// The tag this protocol is spelled as.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Ipc => "ipc",
        }
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self> {
        match tag {
            "tcp" => Ok(Self::Tcp),
            "ipc" => Ok(Self::Ipc),
            other => Err(Error::protocol_unsupported(other)),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address family of a resolved endpoint.
///
/// Selects the socket creation and connect path once, at resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Internet-domain stream socket (TCP).
    Inet,
    /// Local-domain stream socket.
    Local,
}

/// A resolved connection target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// IP address and port.
    Inet(SocketAddr),
    /// Filesystem path of a local stream socket.
    #[cfg(unix)]
    Local(PathBuf),
}

impl Endpoint {
    /// Resolve `address` for the protocol named by `tag` with the
    /// [`SystemResolver`].
    pub fn resolve(tag: &str, address: &str) -> Result<Self> {
        let protocol = tag.parse::<Protocol>()?;
        SystemResolver.resolve(protocol, address)
    }

    /// Resolve a `protocol://address` string, e.g. `tcp://127.0.0.1:5555`
    /// or `ipc:///tmp/app.sock`.
    pub fn parse_uri(uri: &str) -> Result<Self> {
        let (tag, address) = uri
            .split_once("://")
            .ok_or_else(|| Error::invalid_address(format!("{uri:?} is not protocol://address")))?;
        Self::resolve(tag, address)
    }

    /// The address family of this endpoint.
    #[must_use]
    pub const fn family(&self) -> Family {
        match self {
            Self::Inet(_) => Family::Inet,
            #[cfg(unix)]
            Self::Local(_) => Family::Local,
        }
    }

    /// The protocol this endpoint is reached with.
    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        match self.family() {
            Family::Inet => Protocol::Tcp,
            Family::Local => Protocol::Ipc,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inet(addr) => write!(f, "tcp://{addr}"),
            #[cfg(unix)]
            Self::Local(path) => write!(f, "ipc://{}", path.display()),
        }
    }
}

/// Resolves address strings into endpoints.
///
/// Implementations must be synchronous and side-effect-free from the
/// connecter's point of view.
pub trait Resolve {
    /// Resolve `address` for `protocol`.
    fn resolve(&self, protocol: Protocol, address: &str) -> Result<Endpoint>;
}

impl<R: Resolve + ?Sized> Resolve for &R {
    fn resolve(&self, protocol: Protocol, address: &str) -> Result<Endpoint> {
        (**self).resolve(protocol, address)
    }
}

/// Resolver backed by the operating system's name service.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolve for SystemResolver {
    fn resolve(&self, protocol: Protocol, address: &str) -> Result<Endpoint> {
        match protocol {
            Protocol::Tcp => resolve_ip_hostname(address).map(Endpoint::Inet),
            Protocol::Ipc => resolve_local_path(address),
        }
    }
}

/// Resolve `host:port` where host is an IPv4 literal, a bracketed IPv6
/// literal, or a name.
fn resolve_ip_hostname(address: &str) -> Result<SocketAddr> {
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| Error::invalid_address(format!("{address:?} is missing a port")))?;
    let port: u16 = port
        .parse()
        .map_err(|_| Error::invalid_address(format!("{address:?} has an invalid port")))?;
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if host.is_empty() {
        return Err(Error::invalid_address(format!("{address:?} is missing a host")));
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }

    let resolved: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|err| {
            Error::new(ErrorKind::ResolutionFailed)
                .with_message(format!("lookup of {host:?} failed"))
                .with_source(err)
        })?
        .collect();

    resolved
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| resolved.first())
        .copied()
        .ok_or_else(|| {
            Error::new(ErrorKind::ResolutionFailed)
                .with_message(format!("lookup of {host:?} returned no addresses"))
        })
}

#[cfg(unix)]
fn resolve_local_path(address: &str) -> Result<Endpoint> {
    if address.is_empty() {
        return Err(Error::invalid_address("empty local socket path"));
    }
    let path = PathBuf::from(address);
    // Rejects paths longer than the platform's sun_path.
    socket2::SockAddr::unix(&path).map_err(|err| {
        Error::invalid_address(format!("{address:?} is not a valid local socket path"))
            .with_source(err)
    })?;
    Ok(Endpoint::Local(path))
}

#[cfg(not(unix))]
fn resolve_local_path(_address: &str) -> Result<Endpoint> {
    Err(Error::protocol_unsupported(Protocol::Ipc.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_tags_are_exact() {
        assert_eq!("tcp".parse::<Protocol>().unwrap(), Protocol::Tcp);
        assert_eq!("ipc".parse::<Protocol>().unwrap(), Protocol::Ipc);
        for tag in ["udp", "TCP", "tcp ", "", "pgm"] {
            let err = tag.parse::<Protocol>().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ProtocolUnsupported, "tag {tag:?}");
        }
    }

    #[test]
    fn resolves_ipv4_literal() {
        let endpoint = Endpoint::resolve("tcp", "127.0.0.1:5555").unwrap();
        assert_eq!(endpoint, Endpoint::Inet("127.0.0.1:5555".parse().unwrap()));
        assert_eq!(endpoint.family(), Family::Inet);
        assert_eq!(endpoint.protocol(), Protocol::Tcp);
    }

    #[test]
    fn resolves_bracketed_ipv6_literal() {
        let endpoint = Endpoint::resolve("tcp", "[::1]:80").unwrap();
        assert_eq!(endpoint, Endpoint::Inet("[::1]:80".parse().unwrap()));
    }

    #[test]
    fn resolves_localhost_by_name() {
        let endpoint = Endpoint::resolve("tcp", "localhost:8080").unwrap();
        match endpoint {
            Endpoint::Inet(addr) => {
                assert!(addr.ip().is_loopback());
                assert_eq!(addr.port(), 8080);
            }
            #[cfg(unix)]
            Endpoint::Local(_) => panic!("expected an inet endpoint"),
        }
    }

    #[test]
    fn malformed_tcp_addresses_are_invalid() {
        for address in ["127.0.0.1", "127.0.0.1:", ":80", "127.0.0.1:http", "[]:80", "h:70000"] {
            let err = Endpoint::resolve("tcp", address).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidAddress, "address {address:?}");
        }
    }

    #[test]
    fn unknown_protocol_is_unsupported() {
        let err = Endpoint::resolve("udp", "127.0.0.1:80").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolUnsupported);
    }

    #[test]
    fn uri_form_splits_protocol() {
        let endpoint = Endpoint::parse_uri("tcp://127.0.0.1:9000").unwrap();
        assert_eq!(endpoint.to_string(), "tcp://127.0.0.1:9000");

        let err = Endpoint::parse_uri("127.0.0.1:9000").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAddress);

        let err = Endpoint::parse_uri("udp://127.0.0.1:9000").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolUnsupported);
    }

    #[cfg(unix)]
    #[test]
    fn resolves_local_path() {
        let endpoint = Endpoint::resolve("ipc", "/tmp/connecter.sock").unwrap();
        assert_eq!(endpoint, Endpoint::Local(PathBuf::from("/tmp/connecter.sock")));
        assert_eq!(endpoint.family(), Family::Local);
        assert_eq!(endpoint.to_string(), "ipc:///tmp/connecter.sock");
    }

    #[cfg(unix)]
    #[test]
    fn rejects_empty_and_oversized_local_paths() {
        let err = Endpoint::resolve("ipc", "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAddress);

        let long = format!("/tmp/{}", "x".repeat(200));
        let err = Endpoint::resolve("ipc", &long).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAddress);
    }

    #[test]
    fn custom_resolver_through_reference() {
        struct Fixed(SocketAddr);
        impl Resolve for Fixed {
            fn resolve(&self, _protocol: Protocol, _address: &str) -> Result<Endpoint> {
                Ok(Endpoint::Inet(self.0))
            }
        }

        let addr: SocketAddr = "10.0.0.1:1".parse().unwrap();
        let fixed = Fixed(addr);
        let by_ref = &fixed;
        assert_eq!(
            by_ref.resolve(Protocol::Tcp, "ignored").unwrap(),
            Endpoint::Inet(addr)
        );
    }
}
