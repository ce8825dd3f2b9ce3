//! Local stream (ipc) connecter integration tests.
//!
//! Test Coverage:
//! - CONN-IPC-001: Missing path fails inside open, no pending phase
//! - CONN-IPC-002: Listening path connects synchronously
//! - CONN-IPC-003: Path resolution limits
//! - CONN-IPC-004: Stale socket file is refused

#![cfg(unix)]

#[macro_use]
mod common;

use common::*;
use connecter::net::{Connecter, Endpoint, Family, Progress, State};
use connecter::{ErrorCategory, ErrorKind};
use std::io::{Read, Write};
use std::os::unix::net::UnixListener;

#[test]
fn missing_path_fails_in_open() {
    init_test_logging();
    test_phase!("CONN-IPC-001: missing path");

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nobody-home.sock");
    let mut connecter = Connecter::new();
    connecter.set_address("ipc", path.to_str().expect("utf-8 path")).expect("resolve");

    let err = connecter.open().expect_err("nothing to connect to");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.category(), ErrorCategory::Network);
    assert_eq!(err.os_code(), Some(libc::ENOENT));
    assert_eq!(connecter.state(), State::Closed);
    assert!(connecter.handle().is_none());

    test_complete!("CONN-IPC-001");
}

#[test]
fn listening_path_connects_synchronously() {
    init_test_logging();
    test_phase!("CONN-IPC-002: listening path");

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("server.sock");
    let listener = UnixListener::bind(&path).expect("bind");

    let mut connecter = Connecter::new();
    connecter.set_address("ipc", path.to_str().expect("utf-8 path")).expect("resolve");
    assert_eq!(connecter.open().expect("open"), Progress::Connected);
    assert_eq!(connecter.state(), State::Ready);

    let mut connection = connecter.finalize().expect("finalize");
    assert_eq!(connection.family(), Family::Local);
    assert!(connecter.handle().is_none());

    let (mut peer, _) = listener.accept().expect("accept");
    connection.write_all(b"ipc").expect("write");
    let mut buf = [0u8; 3];
    peer.read_exact(&mut buf).expect("read");
    assert_eq!(&buf, b"ipc");

    let stream = connection.into_local().expect("local stream");
    assert!(stream.peer_addr().is_ok());

    test_complete!("CONN-IPC-002");
}

#[test]
fn path_resolution_limits() {
    init_test_logging();
    test_phase!("CONN-IPC-003: path limits");

    let err = Endpoint::resolve("ipc", "").expect_err("empty path");
    assert_eq!(err.kind(), ErrorKind::InvalidAddress);

    let long = format!("/tmp/{}", "p".repeat(300));
    let err = Endpoint::resolve("ipc", &long).expect_err("oversized path");
    assert_eq!(err.kind(), ErrorKind::InvalidAddress);

    let endpoint = Endpoint::parse_uri("ipc:///tmp/app.sock").expect("uri");
    assert_eq!(endpoint.family(), Family::Local);

    test_complete!("CONN-IPC-003");
}

#[test]
fn stale_socket_file_is_refused() {
    init_test_logging();
    test_phase!("CONN-IPC-004: stale socket file");

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("stale.sock");
    drop(UnixListener::bind(&path).expect("bind"));
    assert!(path.exists());

    let mut connecter = Connecter::new();
    connecter.set_address("ipc", path.to_str().expect("utf-8 path")).expect("resolve");
    let err = connecter.open().expect_err("no listener behind the file");
    assert_eq!(err.kind(), ErrorKind::ConnectionRefused);
    assert!(err.is_retryable());
    assert!(connecter.handle().is_none());

    test_complete!("CONN-IPC-004");
}
