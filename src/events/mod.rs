// src/events/mod.rs
//! Typed notification channels
//!
//! Interception publishes two kinds of notifications:
//!
//! - **"connect"**: an outbound connection attempt was observed, carrying
//!   the target parameters and a one-shot bypass capability
//! - **"request"**: the framing bridge finished parsing a request head,
//!   carrying the cross-referenced request/response pair
//!
//! Subscribers are plain callbacks held in insertion order; insertion order
//! is invocation order, and a registry can be cleared all at once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hyper::Uri;
use parking_lot::Mutex;

use crate::transaction::{InterceptedRequest, ResponseHandle};

pub(crate) type ConnectFn = dyn Fn(&ConnectEvent) + Send + Sync;
pub(crate) type RequestFn = dyn Fn(&InterceptedRequest, &ResponseHandle) + Send + Sync;

/// Ordered subscriber registry for one notification kind
pub(crate) struct HandlerList<F: ?Sized> {
    handlers: Mutex<Vec<Arc<F>>>,
}

impl<F: ?Sized> HandlerList<F> {
    pub(crate) fn new() -> Self {
        Self {
            handlers: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn push(&self, handler: Arc<F>) {
        self.handlers.lock().push(handler);
    }

    pub(crate) fn clear(&self) {
        self.handlers.lock().clear();
    }

    /// Snapshot under the lock so handlers can subscribe or unsubscribe
    /// without deadlocking the emission that invoked them.
    pub(crate) fn snapshot(&self) -> Vec<Arc<F>> {
        self.handlers.lock().clone()
    }
}

/// One observed outbound connection attempt
///
/// Clones share the bypass flag, so a stashed event can still be inspected
/// after delivery. The bypass capability is only meaningful while "connect"
/// handlers run; once the pairing decision has been read, invoking it has no
/// effect.
#[derive(Clone, Debug)]
pub struct ConnectEvent {
    uri: Uri,
    host: String,
    port: u16,
    bypassed: Arc<AtomicBool>,
}

impl ConnectEvent {
    pub(crate) fn new(dst: &Uri) -> Self {
        let host = dst.host().unwrap_or_default().to_string();
        let port = dst.port_u16().unwrap_or(match dst.scheme_str() {
            Some("https") => 443,
            _ => 80,
        });
        Self {
            uri: dst.clone(),
            host,
            port,
            bypassed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Destination the caller asked for, scheme and all
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Target host of the attempt
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Target port, defaulted from the scheme when the URI names none
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Let this attempt proceed to the real network instead of being paired
    /// with a loopback endpoint.
    pub fn bypass(&self) {
        self.bypassed.store(true, Ordering::SeqCst);
    }

    /// Whether a subscriber bypassed this attempt
    pub fn bypassed(&self) -> bool {
        self.bypassed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handlers_run_in_insertion_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let list: HandlerList<ConnectFn> = HandlerList::new();

        for id in 0..3 {
            let seen = Arc::clone(&seen);
            list.push(Arc::new(move |_event: &ConnectEvent| {
                seen.lock().push(id);
            }));
        }

        let event = ConnectEvent::new(&Uri::from_static("http://example.test/"));
        for handler in list.snapshot() {
            handler(&event);
        }

        assert_eq!(*seen.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_clear_removes_all_handlers() {
        let list: HandlerList<ConnectFn> = HandlerList::new();
        list.push(Arc::new(|_event: &ConnectEvent| {}));
        list.push(Arc::new(|_event: &ConnectEvent| {}));

        list.clear();
        assert!(list.snapshot().is_empty());
    }

    #[test]
    fn test_bypass_is_shared_across_clones() {
        let event = ConnectEvent::new(&Uri::from_static("http://example.test/"));
        let stashed = event.clone();

        assert!(!event.bypassed());
        stashed.bypass();
        assert!(event.bypassed());
    }

    #[test]
    fn test_port_defaults_follow_scheme() {
        let http = ConnectEvent::new(&Uri::from_static("http://example.test/"));
        assert_eq!(http.port(), 80);

        let https = ConnectEvent::new(&Uri::from_static("https://example.test/"));
        assert_eq!(https.port(), 443);

        let explicit = ConnectEvent::new(&Uri::from_static("http://example.test:8080/"));
        assert_eq!(explicit.port(), 8080);
        assert_eq!(explicit.host(), "example.test");
    }
}
