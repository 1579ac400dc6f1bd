// src/utils/errors.rs
//! Crate-wide error and result types
//!
//! Interception itself never surfaces errors through the facade; failures in
//! intercepted traffic travel through the client's normal error channel. The
//! variants here cover misuse of the transaction handles and request body
//! collection.

/// Convenience result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the transaction handles
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The response head was already written to the wire; status and header
    /// mutation is no longer possible.
    #[error("response headers already sent")]
    HeadersSent,

    /// The response was already ended with an explicit end-of-response.
    #[error("response already ended")]
    ResponseEnded,

    /// The streamed request body was already taken by another reader.
    #[error("request body already consumed")]
    BodyConsumed,

    /// The framing pipeline failed while streaming the request body.
    #[error("failed to read request body: {0}")]
    BodyRead(#[from] hyper::Error),

    /// Every handle to a response was dropped before a head was produced.
    #[error("response abandoned by all subscribers")]
    ResponseAbandoned,

    /// A header name or value failed to parse.
    #[error("invalid header name or value")]
    InvalidHeader,
}
