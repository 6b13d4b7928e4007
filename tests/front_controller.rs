//! End-to-end routing through the front controller.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use nvel_static::routing::GrammarVariant;

mod common;

#[tokio::test]
async fn test_chapter_fetched_from_backend() {
    let backend = common::start_echo_backend().await;
    let front = common::start_front(common::config_for(backend)).await;

    let res = common::client()
        .get(front.url("/pt-br/chapters/4"))
        .send()
        .await
        .expect("front controller unreachable");

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "text/html");
    assert_eq!(res.text().await.unwrap(), "/pt-br/chapters/4");
}

#[tokio::test]
async fn test_pages_map_to_language_root() {
    let backend = common::start_echo_backend().await;
    let front = common::start_front(common::config_for(backend)).await;
    let client = common::client();

    for (path, expected) in [
        ("/en", "/en"),
        ("/pt-br/", "/pt-br"),
        ("/en/about", "/en"),
        ("/en/chapters", "/en"),
        ("/chapters/4-fuga", "/chapters/4-fuga"),
    ] {
        let res = client.get(front.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK, "{path}");
        assert_eq!(res.text().await.unwrap(), expected, "{path}");
    }
}

#[tokio::test]
async fn test_legacy_numeric_variant() {
    let backend = common::start_echo_backend().await;
    let mut config = common::config_for(backend);
    config.routing.variant = GrammarVariant::LegacyNumeric;
    let front = common::start_front(config).await;
    let client = common::client();

    let res = client.get(front.url("/pt-br/chapters/4")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "/pt-br/node/4");

    let res = client.get(front.url("/pt-br/chapters/4-fuga")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_paths_never_reach_backend() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let backend = common::start_programmable_backend(move |_| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (200, "page".into())
        }
    })
    .await;
    let front = common::start_front(common::config_for(backend)).await;
    let client = common::client();

    for path in ["/en/user/login", "/user/login", "/en/other/", "/pt-br/about/us", "/"] {
        let res = client.get(front.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{path}");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rewrite_query_param() {
    let backend = common::start_echo_backend().await;
    let front = common::start_front(common::config_for(backend)).await;

    let res = common::client()
        .get(front.url("/static_get.php"))
        .query(&[("q", "en/chapters/12")])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "/en/chapters/12");
}

#[tokio::test]
async fn test_request_id_forwarded_to_backend() {
    let backend = common::start_programmable_backend(|head| async move {
        let id = common::request_header(&head, "x-request-id").unwrap_or_default();
        (200, id)
    })
    .await;
    let front = common::start_front(common::config_for(backend)).await;
    let client = common::client();

    let res = client
        .get(front.url("/en"))
        .header("x-request-id", "req-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "req-42");
    assert_eq!(res.text().await.unwrap(), "req-42");

    // Generated when the client sends none.
    let res = client.get(front.url("/en")).send().await.unwrap();
    let generated = res.headers()["x-request-id"].to_str().unwrap().to_string();
    assert!(!generated.is_empty());
    assert_eq!(res.text().await.unwrap(), generated);
}

#[tokio::test]
async fn test_config_reload_switches_variant() {
    let backend = common::start_echo_backend().await;
    let config = common::config_for(backend);
    let front = common::start_front(config.clone()).await;
    let client = common::client();

    let res = client.get(front.url("/chapters/7")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "/chapters/7");

    let mut reloaded = config;
    reloaded.routing.variant = GrammarVariant::LegacyNumeric;
    front.config_updates.send(reloaded).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let res = client.get(front.url("/chapters/7")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "/node/7");
}
