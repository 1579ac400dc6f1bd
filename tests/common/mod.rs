// tests/common/mod.rs
//! Shared scaffolding for the integration suites
//!
//! Interception state is process-global, so every scenario serializes on a
//! static lock, starts the global interceptor with a clean listener set, and
//! resets it again on drop.

#![allow(dead_code)]

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Method, Request, Response};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use parking_lot::{Mutex, MutexGuard};

use loopwire::{NetTap, SocketHook};

static SUITE_LOCK: Mutex<()> = Mutex::new(());

pub type TestClient = Client<SocketHook<NetTap<HttpConnector>>, Full<Bytes>>;

/// Serialized scenario with the global interceptor started and clean
pub struct Session {
    _guard: MutexGuard<'static, ()>,
}

impl Drop for Session {
    fn drop(&mut self) {
        loopwire::global().stop().remove_listeners();
    }
}

pub fn intercepting() -> Session {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let guard = SUITE_LOCK.lock();
    loopwire::global().remove_listeners().start();
    Session { _guard: guard }
}

pub fn client() -> TestClient {
    Client::builder(TokioExecutor::new()).build(loopwire::http_connector())
}

pub fn get(uri: &str) -> Request<Full<Bytes>> {
    Request::builder()
        .uri(uri)
        .body(Full::default())
        .expect("request build")
}

pub fn post(uri: &str, body: &'static str) -> Request<Full<Bytes>> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Full::new(Bytes::from(body)))
        .expect("request build")
}

pub async fn body_text(response: Response<Incoming>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("response body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}
