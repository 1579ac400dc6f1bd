// src/lib.rs
//! Loopwire — in-process HTTP interception
//!
//! Outbound HTTP(S) connection attempts made through the crate's connector
//! stack are observed before any bytes reach the network and redirected into
//! in-process handlers, while callers keep interacting with ordinary hyper
//! request/response machinery. Built for test doubles, traffic recorders,
//! and local simulators; the crate never originates connections of its own.
//!
//! # Architecture
//!
//! - **net**: the interception tap (loopback pairing, bypass) and the
//!   socket-binding hook, composed as connector layers
//! - **bridge**: server-side framing bridge that parses intercepted byte
//!   streams as inbound HTTP connections
//! - **transaction**: cross-referenced request/response handles
//! - **events**: typed notification channels ("connect", "request")
//! - **interceptor**: the public facade with global start/stop
//! - **utils**: errors and helpers
//!
//! ```text
//! application ──► hyper client ──► SocketHook ──► NetTap ──► real network
//!                      ▲               │             │     (bypass, stopped)
//!                      │               │             └── loopback pair
//!                      │               └── remote half ──► HttpBridge
//!                      │                                       │
//!                      └── response bytes ◄── ResponseHandle ◄─┴─► "request"
//!                                                                 subscribers
//! ```
//!
//! # Getting started
//!
//! ```no_run
//! use bytes::Bytes;
//! use http_body_util::Full;
//! use hyper_util::client::legacy::Client;
//! use hyper_util::rt::TokioExecutor;
//!
//! # async fn run() -> loopwire::Result<()> {
//! loopwire::global().start().on_request(|request, response| {
//!     response.end_with(format!("hello {}", request.path())).ok();
//! });
//!
//! let client: Client<_, Full<Bytes>> =
//!     Client::builder(TokioExecutor::new()).build(loopwire::http_connector());
//! // Requests issued through `client` now resolve in-process.
//! # Ok(())
//! # }
//! ```

// Public module exports
pub mod bridge;
pub mod events;
pub mod interceptor;
pub mod net;
pub mod transaction;
pub mod utils;

// Re-export commonly used types
pub use bridge::{BridgeConfig, HttpBridge};
pub use events::ConnectEvent;
pub use interceptor::{global, Interceptor};
pub use net::{connector, http_connector, NetTap, SocketHook, TapConfig, TapIo};
pub use transaction::{InterceptedRequest, ResponseHandle};
pub use utils::errors::{Error, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
