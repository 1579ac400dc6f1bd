// src/interceptor.rs
//! Interceptor facade
//!
//! The public coordination point: global start/stop, ordered subscriber
//! registries for "connect" and "request" notifications, and ownership of
//! the framing bridge that turns intercepted byte streams back into
//! transactions. "connect" notifications from the tap are republished
//! verbatim; every pair parsed by the bridge is republished as "request"
//! with the cross-references already installed.

use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::{debug, info};

use crate::bridge::{BridgeConfig, HttpBridge};
use crate::events::{ConnectEvent, ConnectFn, HandlerList, RequestFn};
use crate::net::state;
use crate::transaction::{InterceptedRequest, ResponseHandle};

static GLOBAL: Lazy<Interceptor> = Lazy::new(Interceptor::new);

/// Process-wide interceptor instance.
///
/// The first interceptor started in a process becomes the redirection target
/// for every connection attempt made through the crate's connectors; sharing
/// this instance is the supported way to get that deliberately.
pub fn global() -> &'static Interceptor {
    &GLOBAL
}

/// Observes outbound connection attempts and republishes intercepted
/// traffic as request/response pairs
pub struct Interceptor {
    core: Arc<InterceptorCore>,
}

/// Shared interior: registries plus the bridge, reachable from the global
/// installed slot.
pub(crate) struct InterceptorCore {
    connect: HandlerList<ConnectFn>,
    request: HandlerList<RequestFn>,
    bridge: HttpBridge,
}

impl InterceptorCore {
    pub(crate) fn new(config: BridgeConfig) -> Arc<Self> {
        Arc::new_cyclic(|core| Self {
            connect: HandlerList::new(),
            request: HandlerList::new(),
            bridge: HttpBridge::new(core.clone(), config),
        })
    }

    pub(crate) fn bridge(&self) -> &HttpBridge {
        &self.bridge
    }

    pub(crate) fn publish_connect(&self, event: &ConnectEvent) {
        for handler in self.connect.snapshot() {
            handler(event);
        }
    }

    pub(crate) fn publish_request(&self, request: &InterceptedRequest, response: &ResponseHandle) {
        for handler in self.request.snapshot() {
            handler(request, response);
        }
    }
}

impl Interceptor {
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    pub fn with_config(config: BridgeConfig) -> Self {
        Self {
            core: InterceptorCore::new(config),
        }
    }

    /// Activate interception. Idempotent; chainable.
    ///
    /// The first call ever in the process also installs this instance as the
    /// redirection target for all connectors. Installation is permanent for
    /// the process lifetime; [`stop`](Self::stop) only clears the gate.
    pub fn start(&self) -> &Self {
        if state::install(Arc::clone(&self.core)) {
            info!("interception redirect installed for this process");
        }
        if !state::is_intercepting() {
            state::set_intercepting(true);
            info!("interception started");
        }
        self
    }

    /// Deactivate interception for attempts initiated from now on.
    /// Idempotent; chainable. In-flight transactions keep running.
    pub fn stop(&self) -> &Self {
        if state::is_intercepting() {
            state::set_intercepting(false);
            info!("interception stopped");
        }
        self
    }

    /// Subscribe to connection attempts. Handlers run synchronously, in
    /// subscription order, before the attempt is paired or passed through —
    /// the only window in which [`ConnectEvent::bypass`] has effect.
    pub fn on_connect(&self, handler: impl Fn(&ConnectEvent) + Send + Sync + 'static) -> &Self {
        self.core.connect.push(Arc::new(handler));
        self
    }

    /// Subscribe to parsed transactions. Handlers receive the
    /// cross-referenced pair in subscription order; clone the handles into a
    /// task for async response work.
    pub fn on_request(
        &self,
        handler: impl Fn(&InterceptedRequest, &ResponseHandle) + Send + Sync + 'static,
    ) -> &Self {
        self.core.request.push(Arc::new(handler));
        self
    }

    /// Drop every subscriber of both notification kinds.
    pub fn remove_listeners(&self) -> &Self {
        self.core.connect.clear();
        self.core.request.clear();
        debug!("all interceptor listeners removed");
        self
    }
}

impl Default for Interceptor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::Uri;
    use parking_lot::Mutex;

    #[test]
    fn test_connect_handlers_run_in_subscription_order() {
        let interceptor = Interceptor::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for id in 0..3 {
            let order = Arc::clone(&order);
            interceptor.on_connect(move |_event| order.lock().push(id));
        }

        let event = ConnectEvent::new(&Uri::from_static("http://example.test/"));
        interceptor.core.publish_connect(&event);

        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_remove_listeners_silences_both_channels() {
        let interceptor = Interceptor::new();
        let fired = Arc::new(Mutex::new(0usize));

        {
            let fired = Arc::clone(&fired);
            interceptor.on_connect(move |_event| *fired.lock() += 1);
        }
        interceptor.remove_listeners();

        let event = ConnectEvent::new(&Uri::from_static("http://example.test/"));
        interceptor.core.publish_connect(&event);

        assert_eq!(*fired.lock(), 0);
    }

    #[test]
    fn test_registration_is_chainable() {
        let interceptor = Interceptor::new();
        interceptor
            .on_connect(|_event| {})
            .on_request(|_request, _response| {})
            .remove_listeners();
    }
}
