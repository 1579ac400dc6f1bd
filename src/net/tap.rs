// src/net/tap.rs
//! Transport-level interception tap
//!
//! `NetTap` wraps the connector an HTTP client uses to open transport
//! sockets. While interception is active, every attempt is published as a
//! "connect" notification before any pairing happens; unless a subscriber
//! bypasses it, the attempt is then paired with an in-process loopback
//! endpoint pair instead of reaching the wrapped connector. The remote half
//! of the pair rides along inside the returned [`TapIo`] as the loopback
//! marker until the socket hook takes it.

use std::io::IoSlice;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use hyper::rt::{Read, ReadBufCursor, Write};
use hyper::Uri;
use hyper_util::client::legacy::connect::{Connected, Connection};
use hyper_util::rt::TokioIo;
use tokio::io::DuplexStream;
use tower::Service;
use tracing::debug;

use crate::events::ConnectEvent;
use crate::net::state;

/// Configuration for the interception tap
#[derive(Debug, Clone)]
pub struct TapConfig {
    /// Buffer capacity of each loopback endpoint, in bytes
    pub buffer_size: usize,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            buffer_size: 64 * 1024,
        }
    }
}

/// Connector layer pairing intercepted attempts with loopback endpoints
#[derive(Debug, Clone)]
pub struct NetTap<C> {
    inner: C,
    config: TapConfig,
}

impl<C> NetTap<C> {
    pub fn new(inner: C) -> Self {
        Self::with_config(inner, TapConfig::default())
    }

    pub fn with_config(inner: C, config: TapConfig) -> Self {
        Self { inner, config }
    }
}

impl<C> Service<Uri> for NetTap<C>
where
    C: Service<Uri>,
    C::Response: Send + 'static,
    C::Error: Send + 'static,
    C::Future: Send + 'static,
{
    type Response = TapIo<C::Response>;
    type Error = C::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, dst: Uri) -> Self::Future {
        if state::is_intercepting() {
            if let Some(core) = state::installed() {
                // The "connect" notification and the bypass decision complete
                // here, before the pair exists or the inner connector runs.
                let event = ConnectEvent::new(&dst);
                core.publish_connect(&event);

                if event.bypassed() {
                    debug!(
                        host = event.host(),
                        port = event.port(),
                        "connection attempt bypassed to the real network"
                    );
                } else {
                    debug!(
                        host = event.host(),
                        port = event.port(),
                        "pairing connection attempt with loopback endpoints"
                    );
                    let (local, remote) = tokio::io::duplex(self.config.buffer_size);
                    return Box::pin(async move { Ok(TapIo::loopback(local, remote)) });
                }
            }
        }

        let connect = self.inner.call(dst);
        Box::pin(async move { connect.await.map(TapIo::direct) })
    }
}

/// I/O object a client binds to for one connection attempt
///
/// Either a real socket from the wrapped connector, or the client half of a
/// loopback pair with the remote half riding along as the marker.
pub struct TapIo<T> {
    kind: TapKind<T>,
}

enum TapKind<T> {
    Direct(T),
    Loopback {
        io: TokioIo<DuplexStream>,
        remote: Option<DuplexStream>,
    },
}

impl<T> TapIo<T> {
    pub(crate) fn direct(io: T) -> Self {
        Self {
            kind: TapKind::Direct(io),
        }
    }

    pub(crate) fn loopback(local: DuplexStream, remote: DuplexStream) -> Self {
        Self {
            kind: TapKind::Loopback {
                io: TokioIo::new(local),
                remote: Some(remote),
            },
        }
    }

    /// Whether this attempt was paired with a loopback endpoint
    pub fn is_loopback(&self) -> bool {
        matches!(self.kind, TapKind::Loopback { .. })
    }

    /// Take the marked loopback remote endpoint. Yields it once; later calls
    /// return `None`, as do calls on real sockets.
    pub fn take_remote(&mut self) -> Option<DuplexStream> {
        match &mut self.kind {
            TapKind::Loopback { remote, .. } => remote.take(),
            TapKind::Direct(_) => None,
        }
    }
}

impl<T: Read + Unpin> Read for TapIo<T> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: ReadBufCursor<'_>,
    ) -> Poll<std::io::Result<()>> {
        match &mut self.kind {
            TapKind::Direct(io) => Pin::new(io).poll_read(cx, buf),
            TapKind::Loopback { io, .. } => Pin::new(io).poll_read(cx, buf),
        }
    }
}

impl<T: Write + Unpin> Write for TapIo<T> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match &mut self.kind {
            TapKind::Direct(io) => Pin::new(io).poll_write(cx, buf),
            TapKind::Loopback { io, .. } => Pin::new(io).poll_write(cx, buf),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match &mut self.kind {
            TapKind::Direct(io) => Pin::new(io).poll_flush(cx),
            TapKind::Loopback { io, .. } => Pin::new(io).poll_flush(cx),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match &mut self.kind {
            TapKind::Direct(io) => Pin::new(io).poll_shutdown(cx),
            TapKind::Loopback { io, .. } => Pin::new(io).poll_shutdown(cx),
        }
    }

    fn is_write_vectored(&self) -> bool {
        match &self.kind {
            TapKind::Direct(io) => io.is_write_vectored(),
            TapKind::Loopback { io, .. } => io.is_write_vectored(),
        }
    }

    fn poll_write_vectored(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[IoSlice<'_>],
    ) -> Poll<std::io::Result<usize>> {
        match &mut self.kind {
            TapKind::Direct(io) => Pin::new(io).poll_write_vectored(cx, bufs),
            TapKind::Loopback { io, .. } => Pin::new(io).poll_write_vectored(cx, bufs),
        }
    }
}

impl<T: Connection> Connection for TapIo<T> {
    fn connected(&self) -> Connected {
        match &self.kind {
            TapKind::Direct(io) => io.connected(),
            TapKind::Loopback { .. } => Connected::new(),
        }
    }
}

impl<T> std::fmt::Debug for TapIo<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            TapKind::Direct(_) => f.write_str("TapIo::Direct"),
            TapKind::Loopback { remote, .. } => f
                .debug_struct("TapIo::Loopback")
                .field("remote_taken", &remote.is_none())
                .finish(),
        }
    }
}
