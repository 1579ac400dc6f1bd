// src/transaction/response.rs
//! Response half of an intercepted transaction
//!
//! Subscribers drive the response: mutate status and headers while the head
//! is still pending, stream body chunks with `write`, and finish with an
//! explicit `end`. The first write (or the end) flushes the head to the
//! framing pipeline; after that, head mutation is rejected.

use std::convert::Infallible;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use hyper::body::{Body, Frame};
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use hyper::StatusCode;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::transaction::{InterceptedRequest, TxShared};
use crate::utils::errors::{Error, Result};

/// Status line and headers handed to the framing pipeline on first flush
pub(crate) struct ResponseHead {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
}

/// Write-side state machine: head pending, streaming, ended
pub(crate) struct ResponseState {
    status: StatusCode,
    headers: HeaderMap,
    head_tx: Option<oneshot::Sender<ResponseHead>>,
    body_tx: Option<mpsc::UnboundedSender<Frame<Bytes>>>,
}

impl ResponseState {
    /// Fresh state plus the bridge's ends of both channels.
    pub(crate) fn channels() -> (Self, oneshot::Receiver<ResponseHead>, ChannelBody) {
        let (head_tx, head_rx) = oneshot::channel();
        let (body_tx, body_rx) = mpsc::unbounded_channel();
        let state = Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            head_tx: Some(head_tx),
            body_tx: Some(body_tx),
        };
        (state, head_rx, ChannelBody { rx: body_rx })
    }

    fn head_sent(&self) -> bool {
        self.head_tx.is_none()
    }

    fn flush_head(&mut self) {
        if let Some(tx) = self.head_tx.take() {
            let head = ResponseHead {
                status: self.status,
                headers: std::mem::take(&mut self.headers),
            };
            if tx.send(head).is_err() {
                debug!("response head dropped, client endpoint already closed");
            }
        }
    }
}

/// Writer for the response of one intercepted transaction
///
/// Clones are cheap handles over the same transaction; every subscriber of a
/// "request" notification observes the same underlying response. Dropping
/// all handles without producing a head aborts the transaction, which the
/// intercepted client sees as a closed connection.
#[derive(Clone)]
pub struct ResponseHandle {
    shared: Arc<TxShared>,
}

impl ResponseHandle {
    pub(crate) fn new(shared: Arc<TxShared>) -> Self {
        Self { shared }
    }

    /// Set the status line. Rejected once the head is on the wire.
    pub fn set_status(&self, status: StatusCode) -> Result<()> {
        let mut state = self.shared.response.lock();
        if state.head_sent() {
            return Err(Error::HeadersSent);
        }
        state.status = status;
        Ok(())
    }

    /// Insert a header from string name and value.
    pub fn set_header(&self, name: &str, value: &str) -> Result<()> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| Error::InvalidHeader)?;
        let value = HeaderValue::from_str(value).map_err(|_| Error::InvalidHeader)?;
        self.insert_header(name, value)
    }

    /// Insert an already-typed header. Rejected once the head is on the wire.
    pub fn insert_header(&self, name: HeaderName, value: HeaderValue) -> Result<()> {
        let mut state = self.shared.response.lock();
        if state.head_sent() {
            return Err(Error::HeadersSent);
        }
        state.headers.insert(name, value);
        Ok(())
    }

    /// Stream one body chunk. The first write flushes the head.
    ///
    /// A chunk written after the client endpoint closed is dropped silently;
    /// closure surfaces on the client side, not here.
    pub fn write(&self, chunk: impl Into<Bytes>) -> Result<()> {
        let mut state = self.shared.response.lock();
        if state.body_tx.is_none() {
            return Err(Error::ResponseEnded);
        }
        state.flush_head();
        if let Some(tx) = state.body_tx.as_ref() {
            if tx.send(Frame::data(chunk.into())).is_err() {
                debug!("response chunk dropped, client endpoint already closed");
            }
        }
        Ok(())
    }

    /// Finish the response. Flushes the head if no write did yet; ends the
    /// body stream. Idempotent.
    pub fn end(&self) -> Result<()> {
        let mut state = self.shared.response.lock();
        if state.body_tx.is_none() {
            return Ok(());
        }
        state.flush_head();
        state.body_tx = None;
        Ok(())
    }

    /// Write one final chunk and finish the response.
    pub fn end_with(&self, chunk: impl Into<Bytes>) -> Result<()> {
        self.write(chunk)?;
        self.end()
    }

    /// The request paired with this response.
    pub fn paired_request(&self) -> InterceptedRequest {
        InterceptedRequest::new(Arc::clone(&self.shared))
    }
}

impl PartialEq for ResponseHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Eq for ResponseHandle {}

impl fmt::Debug for ResponseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.response.lock();
        f.debug_struct("ResponseHandle")
            .field("status", &state.status)
            .field("head_sent", &state.head_sent())
            .finish_non_exhaustive()
    }
}

/// Response body streamed from `ResponseHandle` writes into the framing
/// pipeline
pub(crate) struct ChannelBody {
    rx: mpsc::UnboundedReceiver<Frame<Bytes>>,
}

impl Body for ChannelBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<std::result::Result<Frame<Self::Data>, Self::Error>>> {
        self.get_mut().rx.poll_recv(cx).map(|frame| frame.map(Ok))
    }
}
