// src/net/hook.rs
//! Socket-binding hook
//!
//! `SocketHook` decorates the moment an outbound request binds to its
//! transport socket. The wrapped connector always runs first and its result
//! is returned unchanged; on top of that, the hook re-checks the global
//! intercepting flag and the loopback marker on every binding, and diverts
//! marked remote endpoints into the installed interceptor's framing bridge.
//! The marker check is the sole gate, so sockets created while stopped, or
//! handed back by a bypass, pass through untouched.

use std::task::{Context, Poll};

use futures::future::BoxFuture;
use hyper::Uri;
use tower::Service;
use tracing::debug;

use crate::net::state;
use crate::net::tap::TapIo;

/// Decorator around the socket-binding moment of every outbound request
#[derive(Debug, Clone)]
pub struct SocketHook<C> {
    inner: C,
}

impl<C> SocketHook<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

impl<C, T> Service<Uri> for SocketHook<C>
where
    C: Service<Uri, Response = TapIo<T>>,
    C::Future: Send + 'static,
    C::Error: Send + 'static,
    T: Send + 'static,
{
    type Response = TapIo<T>;
    type Error = C::Error;
    type Future = BoxFuture<'static, Result<TapIo<T>, C::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, dst: Uri) -> Self::Future {
        let bind = self.inner.call(dst.clone());
        Box::pin(async move {
            // Bind exactly as the wrapped connector would have.
            let mut io = bind.await?;

            if !state::is_intercepting() {
                return Ok(io);
            }

            if let Some(remote) = io.take_remote() {
                match state::installed() {
                    Some(core) => core.bridge().accept(remote, &dst),
                    None => debug!("loopback endpoint without an installed interceptor, dropping"),
                }
            }

            Ok(io)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    use futures::future::{ready, Ready};
    use hyper_util::rt::TokioIo;
    use tokio::io::DuplexStream;

    /// Connector producing real (unmarked) sockets.
    struct DirectBind;

    impl Service<Uri> for DirectBind {
        type Response = TapIo<TokioIo<DuplexStream>>;
        type Error = Infallible;
        type Future = Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _dst: Uri) -> Self::Future {
            let (io, _peer) = tokio::io::duplex(16);
            ready(Ok(TapIo::direct(TokioIo::new(io))))
        }
    }

    #[tokio::test]
    async fn test_unmarked_sockets_pass_through_untouched() {
        let mut hook = SocketHook::new(DirectBind);

        let mut io = hook
            .call(Uri::from_static("http://stub.test/"))
            .await
            .unwrap();

        assert!(!io.is_loopback());
        assert!(io.take_remote().is_none());
    }
}
