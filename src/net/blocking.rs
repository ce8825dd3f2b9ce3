//! Blocking connect on top of a [`Connecter`].
//!
//! For callers without a reactor. The attempt is probed with
//! [`Connecter::try_finalize`] at a short fixed interval until it settles or
//! the deadline passes.

use crate::error::{Error, ErrorKind, Result};
use crate::net::connecter::{Connecter, Connection, Progress, State};
use crate::tracing_compat::{debug, warn};
use std::thread;
use std::time::{Duration, Instant};

const PROBE_INTERVAL: Duration = Duration::from_millis(1);

/// Open `connecter` and wait up to `timeout` for the connection.
///
/// On timeout the attempt is closed and a `TimedOut` error is returned, so the
/// connecter is always `Closed` when this returns. A timeout too large to add
/// to the current instant, such as `Duration::MAX`, never expires.
pub fn connect_blocking(connecter: &mut Connecter, timeout: Duration) -> Result<Connection> {
    // `None` when the timeout is too large to represent: wait indefinitely.
    let deadline = Instant::now().checked_add(timeout);
    if connecter.open()? == Progress::Connected {
        return connecter.finalize();
    }

    loop {
        if let Some(connection) = connecter.try_finalize()? {
            return Ok(connection);
        }
        let pause = match deadline {
            Some(deadline) => match deadline.checked_duration_since(Instant::now()) {
                Some(left) if !left.is_zero() => PROBE_INTERVAL.min(left),
                _ => break,
            },
            None => PROBE_INTERVAL,
        };
        thread::sleep(pause);
    }

    warn!(
        endpoint = ?connecter.endpoint(),
        timeout_ms = timeout.as_millis(),
        "connect timed out"
    );
    if connecter.state() != State::Closed {
        connecter.close()?;
    }
    Err(Error::new(ErrorKind::TimedOut).with_message(format!(
        "connect did not complete within {}ms",
        timeout.as_millis()
    )))
}

/// Resolve `tag`/`address`, then [`connect_blocking`] with `connecter`'s
/// defaults.
pub fn connect_to(tag: &str, address: &str, timeout: Duration) -> Result<Connection> {
    let mut connecter = Connecter::new();
    connecter.set_address(tag, address)?;
    debug!(endpoint = ?connecter.endpoint(), "blocking connect");
    connect_blocking(&mut connecter, timeout)
}
