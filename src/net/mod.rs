//! Outbound stream connections.
//!
//! - [`resolve`]: protocol tags and address strings into [`Endpoint`]s
//! - [`connecter`]: the non-blocking [`Connecter`] state machine
//! - [`blocking`]: a deadline-bounded driver for callers without a reactor
//!
//! Platform socket calls live in a private `sys` layer that normalizes OS
//! error codes before the state machine sees them.

pub mod blocking;
pub mod connecter;
pub mod resolve;
mod sys;

pub use blocking::{connect_blocking, connect_to};
pub use connecter::{Connecter, Connection, Progress, State};
pub use resolve::{Endpoint, Family, Protocol, Resolve, SystemResolver};
pub use sys::RawHandle;
