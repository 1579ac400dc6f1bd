// src/net/mod.rs
//! Connection interception layer
//!
//! Outbound interception happens at the connector seam of an HTTP client,
//! as two composable layers:
//!
//! - **NetTap**: observes every connection attempt, publishes "connect",
//!   and either pairs the attempt with an in-process loopback endpoint or
//!   passes it through to the wrapped connector (bypass, stopped)
//! - **SocketHook**: decorates the socket-binding moment; after the wrapped
//!   connector binds, it diverts loopback-marked endpoints into the
//!   installed interceptor's framing bridge
//! - **state**: the process-wide intercepting flag and the monotonic
//!   installed-redirect slot
//!
//! ```text
//! client ──► SocketHook ──► NetTap ──► inner connector ──► real network
//!               │              │
//!               │              └── loopback pair (intercepted attempts)
//!               └── remote half ──► framing bridge
//! ```

pub mod hook;
pub(crate) mod state;
pub mod tap;

// Re-export commonly used types
pub use hook::SocketHook;
pub use tap::{NetTap, TapConfig, TapIo};

use hyper_util::client::legacy::connect::HttpConnector;

/// Build the interception connector stack around an arbitrary inner
/// connector. The inner connector only runs for attempts that are bypassed
/// or made while interception is stopped.
pub fn connector<C>(inner: C) -> SocketHook<NetTap<C>> {
    SocketHook::new(NetTap::new(inner))
}

/// Interception stack over plain TCP, the common case for tests and
/// simulators. Wrap a TLS connector with [`connector`] instead when
/// bypassed `https://` attempts must reach real servers.
pub fn http_connector() -> SocketHook<NetTap<HttpConnector>> {
    connector(HttpConnector::new())
}
