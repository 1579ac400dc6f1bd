// tests/responses.rs
//! Response-side behavior: subscribers driving status, headers, and body
//! back to the intercepted client.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::StatusCode;
use parking_lot::Mutex;

#[tokio::test]
async fn subscriber_drives_status_headers_and_body() -> anyhow::Result<()> {
    let _session = common::intercepting();

    loopwire::global().on_request(|_request, response| {
        response
            .set_status(StatusCode::from_u16(442).expect("status"))
            .expect("status before head");
        response
            .set_header("content-type", "application/json")
            .expect("header before head");
        response.end_with("Hi!").expect("end");
    });

    let response = common::client()
        .request(common::get("http://driven.test/"))
        .await?;

    assert_eq!(response.status().as_u16(), 442);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/json")
    );
    assert_eq!(common::body_text(response).await, "Hi!");
    Ok(())
}

#[tokio::test]
async fn response_bodies_stream_in_chunks() -> anyhow::Result<()> {
    let _session = common::intercepting();

    loopwire::global().on_request(|_request, response| {
        response.write("He").expect("first chunk");
        response.write("llo").expect("second chunk");
        response.end().expect("end");
    });

    let response = common::client()
        .request(common::get("http://chunks.test/"))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_text(response).await, "Hello");
    Ok(())
}

#[tokio::test]
async fn all_subscribers_observe_the_same_pair_in_order() -> anyhow::Result<()> {
    let _session = common::intercepting();

    let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    let first_saw = Arc::new(Mutex::new(None));
    let second_saw = Arc::new(Mutex::new(None));

    {
        let order = Arc::clone(&order);
        let first_saw = Arc::clone(&first_saw);
        loopwire::global().on_request(move |request, _response| {
            order.lock().push("first");
            *first_saw.lock() = Some(request.clone());
        });
    }
    {
        let order = Arc::clone(&order);
        let second_saw = Arc::clone(&second_saw);
        loopwire::global().on_request(move |request, response| {
            order.lock().push("second");
            *second_saw.lock() = Some(request.clone());
            response.end().ok();
        });
    }

    common::client()
        .request(common::get("http://shared.test/"))
        .await?;

    assert_eq!(*order.lock(), vec!["first", "second"]);
    let first = first_saw.lock().take().expect("first subscriber ran");
    let second = second_saw.lock().take().expect("second subscriber ran");
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn keep_alive_reuses_one_loopback_connection() -> anyhow::Result<()> {
    let _session = common::intercepting();

    let connects = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(AtomicUsize::new(0));
    {
        let connects = Arc::clone(&connects);
        let requests = Arc::clone(&requests);
        loopwire::global()
            .on_connect(move |_event| {
                connects.fetch_add(1, Ordering::SeqCst);
            })
            .on_request(move |_request, response| {
                requests.fetch_add(1, Ordering::SeqCst);
                response.end_with("pong").ok();
            });
    }

    let client = common::client();
    for _ in 0..2 {
        let response = client.request(common::get("http://keep.test/")).await?;
        assert_eq!(common::body_text(response).await, "pong");
        // Give the pool a beat to check the idle connection back in.
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(requests.load(Ordering::SeqCst), 2);
    assert_eq!(connects.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn late_head_mutation_surfaces_as_handle_errors() -> anyhow::Result<()> {
    let _session = common::intercepting();

    let outcomes = Arc::new(Mutex::new(Vec::new()));
    {
        let outcomes = Arc::clone(&outcomes);
        loopwire::global().on_request(move |_request, response| {
            response.write("body").expect("write");
            outcomes
                .lock()
                .push(response.set_status(StatusCode::NOT_FOUND));
            response.end().expect("end");
            outcomes.lock().push(response.write("late").map(|_| ()));
        });
    }

    common::client()
        .request(common::get("http://late.test/"))
        .await?;

    let outcomes = outcomes.lock();
    assert!(matches!(outcomes[0], Err(loopwire::Error::HeadersSent)));
    assert!(matches!(outcomes[1], Err(loopwire::Error::ResponseEnded)));
    Ok(())
}
