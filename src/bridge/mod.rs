// src/bridge/mod.rs
//! Server-side framing bridge
//!
//! Intercepted loopback endpoints carry client-framed HTTP bytes. The
//! bridge feeds each endpoint into hyper's server-side HTTP/1 connection
//! framing so it parses as a freshly accepted server connection, then, for
//! every parsed request head, builds the cross-referenced request/response
//! pair and republishes it to the owning interceptor's "request"
//! subscribers. Framing failures and early endpoint closures end the
//! affected transactions only; nothing propagates out of the bridge.

use std::sync::{Arc, Weak};

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, Uri};
use hyper_util::rt::TokioIo;
use tokio::io::DuplexStream;
use tracing::debug;

use crate::interceptor::InterceptorCore;
use crate::transaction::{self, ChannelBody};
use crate::utils::errors::{Error, Result};

/// Configuration for the framing bridge
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Keep intercepted connections open for multiple transactions
    pub keep_alive: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self { keep_alive: true }
    }
}

/// Bridges loopback endpoints into server-side HTTP framing
pub struct HttpBridge {
    owner: Weak<InterceptorCore>,
    config: BridgeConfig,
}

impl HttpBridge {
    pub(crate) fn new(owner: Weak<InterceptorCore>, config: BridgeConfig) -> Self {
        Self { owner, config }
    }

    /// Consume the remote half of a loopback pair as an inbound connection.
    ///
    /// Must run inside a tokio runtime; the framing loop is spawned and this
    /// returns immediately.
    pub(crate) fn accept(&self, remote: DuplexStream, peer: &Uri) {
        let owner = self.owner.clone();
        let keep_alive = self.config.keep_alive;
        let peer = peer.clone();

        tokio::spawn(async move {
            debug!(%peer, "parsing intercepted byte stream as an inbound http connection");

            let service = service_fn(move |req: Request<Incoming>| {
                let owner = owner.clone();
                async move {
                    match owner.upgrade() {
                        Some(core) => transaction_roundtrip(core, req).await,
                        None => {
                            debug!("owning interceptor dropped, aborting transaction");
                            Err(Error::ResponseAbandoned)
                        }
                    }
                }
            });

            let served = http1::Builder::new()
                .keep_alive(keep_alive)
                .serve_connection(TokioIo::new(remote), service)
                .await;
            if let Err(err) = served {
                debug!(error = %err, "intercepted connection closed");
            }
        });
    }
}

/// One parsed transaction: publish the pair, then stream whatever the
/// subscribers produce back through the framing pipeline.
async fn transaction_roundtrip(
    core: Arc<InterceptorCore>,
    req: Request<Incoming>,
) -> Result<Response<ChannelBody>> {
    let (request, response, head_rx, body) = transaction::pair(req);
    debug!(method = %request.method(), uri = %request.uri(), "request head parsed");

    core.publish_request(&request, &response);

    // Drop the bridge's own handles: a pair abandoned by every subscriber
    // must surface as a closed channel, not hold the transaction open.
    drop(request);
    drop(response);

    match head_rx.await {
        Ok(head) => {
            let mut res = Response::new(body);
            *res.status_mut() = head.status;
            *res.headers_mut() = head.headers;
            Ok(res)
        }
        Err(_) => {
            debug!("every response handle dropped before a head was written");
            Err(Error::ResponseAbandoned)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = BridgeConfig::default();
        assert!(config.keep_alive);
    }
}
