// src/transaction/mod.rs
//! Parsed HTTP transactions
//!
//! Each transaction surfaced by the framing bridge is one request/response
//! pair sharing a single allocation. The handles are cheap clones; the
//! cross-references required of a pair (`request.paired_response()` and
//! `response.paired_request()`) are just views of the same shared state, so
//! pairing identity is pointer identity and can never drift.

pub mod request;
pub mod response;

// Re-export commonly used types
pub use request::InterceptedRequest;
pub use response::ResponseHandle;

pub(crate) use response::{ChannelBody, ResponseHead};

use std::sync::Arc;

use hyper::body::Incoming;
use hyper::header::HeaderMap;
use hyper::{Method, Request, Uri, Version};
use parking_lot::Mutex;
use tokio::sync::oneshot;

use response::ResponseState;

/// Immutable head of the parsed request
pub(crate) struct RequestHead {
    pub(crate) method: Method,
    pub(crate) uri: Uri,
    pub(crate) version: Version,
    pub(crate) headers: HeaderMap,
}

/// State shared by both halves of one transaction
pub(crate) struct TxShared {
    pub(crate) head: RequestHead,
    pub(crate) body: Mutex<Option<Incoming>>,
    pub(crate) response: Mutex<ResponseState>,
}

/// Build the cross-referenced pair for one parsed request, plus the bridge's
/// ends of the response channels: the receiver that yields the head once a
/// subscriber produces it, and the streamed body fed by `ResponseHandle`
/// writes.
pub(crate) fn pair(
    req: Request<Incoming>,
) -> (
    InterceptedRequest,
    ResponseHandle,
    oneshot::Receiver<ResponseHead>,
    ChannelBody,
) {
    let (parts, body) = req.into_parts();
    let head = RequestHead {
        method: parts.method,
        uri: parts.uri,
        version: parts.version,
        headers: parts.headers,
    };
    from_parts(head, Some(body))
}

pub(crate) fn from_parts(
    head: RequestHead,
    body: Option<Incoming>,
) -> (
    InterceptedRequest,
    ResponseHandle,
    oneshot::Receiver<ResponseHead>,
    ChannelBody,
) {
    let (state, head_rx, channel_body) = ResponseState::channels();
    let shared = Arc::new(TxShared {
        head,
        body: Mutex::new(body),
        response: Mutex::new(state),
    });
    (
        InterceptedRequest::new(Arc::clone(&shared)),
        ResponseHandle::new(shared),
        head_rx,
        channel_body,
    )
}
