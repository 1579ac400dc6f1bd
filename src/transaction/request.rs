// src/transaction/request.rs
//! Request half of an intercepted transaction

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::header::HeaderMap;
use hyper::{Method, Uri, Version};

use crate::transaction::{ResponseHandle, TxShared};
use crate::utils::errors::{Error, Result};

/// The request an intercepted client sent, as parsed by server-side framing
///
/// Clones are cheap handles over the same transaction. The head is available
/// immediately; the body streams and belongs to whichever handle takes it
/// first.
#[derive(Clone)]
pub struct InterceptedRequest {
    shared: Arc<TxShared>,
}

impl InterceptedRequest {
    pub(crate) fn new(shared: Arc<TxShared>) -> Self {
        Self { shared }
    }

    pub fn method(&self) -> &Method {
        &self.shared.head.method
    }

    pub fn uri(&self) -> &Uri {
        &self.shared.head.uri
    }

    /// Request target as sent on the wire, e.g. `/foo?bar=1`
    pub fn path(&self) -> &str {
        self.shared.head.uri.path()
    }

    pub fn version(&self) -> Version {
        self.shared.head.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.shared.head.headers
    }

    /// Single header value as a string, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.shared.head.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Take the streamed request body. Yields it once; later calls (and
    /// calls on other clones) return `None`.
    pub fn take_body(&self) -> Option<Incoming> {
        self.shared.body.lock().take()
    }

    /// Collect the whole request body into one buffer.
    pub async fn body_bytes(&self) -> Result<Bytes> {
        let body = self.take_body().ok_or(Error::BodyConsumed)?;
        Ok(body.collect().await?.to_bytes())
    }

    /// The response paired with this request.
    pub fn paired_response(&self) -> ResponseHandle {
        ResponseHandle::new(Arc::clone(&self.shared))
    }
}

impl PartialEq for InterceptedRequest {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Eq for InterceptedRequest {}

impl fmt::Debug for InterceptedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptedRequest")
            .field("method", &self.shared.head.method)
            .field("uri", &self.shared.head.uri)
            .finish_non_exhaustive()
    }
}
