// src/net/state.rs
//! Process-wide interception state
//!
//! Two facts live here, matching the two lifecycle rules of interception:
//!
//! - `INTERCEPTING` flips with every `start()`/`stop()` and gates whether
//!   the tap pairs new attempts and the hook diverts marked sockets
//! - `INSTALLED` holds the redirection target and is write-once: the first
//!   interceptor started in a process owns redirection for the process
//!   lifetime; stopping clears the gate, never the slot

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::interceptor::InterceptorCore;

static INTERCEPTING: AtomicBool = AtomicBool::new(false);
static INSTALLED: OnceCell<Arc<InterceptorCore>> = OnceCell::new();

pub(crate) fn set_intercepting(active: bool) {
    let was = INTERCEPTING.swap(active, Ordering::SeqCst);
    if was != active {
        debug!(active, "interception toggled");
    }
}

pub(crate) fn is_intercepting() -> bool {
    INTERCEPTING.load(Ordering::SeqCst)
}

/// Install the redirection target. First caller wins; returns whether this
/// call performed the installation.
pub(crate) fn install(core: Arc<InterceptorCore>) -> bool {
    INSTALLED.set(core).is_ok()
}

pub(crate) fn installed() -> Option<Arc<InterceptorCore>> {
    INSTALLED.get().map(Arc::clone)
}
