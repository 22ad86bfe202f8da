//! End-to-end tests: HTTP client -> proxy -> mocked upstream provider.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use embed_proxy_server::{ProxyConfig, build_resolver, serve};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A running proxy bound to an ephemeral port.
struct Proxy {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl Proxy {
    async fn start(upstream: &MockServer, db_path: PathBuf) -> Self {
        let api_url = format!("{}/v1/", upstream.uri());
        let config = ProxyConfig::parse_from([
            "embed-proxy",
            "--db",
            db_path.to_str().unwrap(),
            "--api-url",
            api_url.as_str(),
            "--api-key",
            "",
        ]);
        let resolver = build_resolver(&config).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(serve(listener, resolver, async {
            let _ = rx.await;
        }));

        Self {
            addr,
            shutdown: Some(tx),
            handle,
        }
    }

    fn url(&self, route: &str) -> String {
        format!("http://{}{route}", self.addr)
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await.unwrap().unwrap();
    }
}

fn upstream_vector(values: &[f32]) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "object": "list",
        "data": [{"object": "embedding", "embedding": values, "index": 0}],
        "model": "m1"
    }))
}

#[tokio::test]
async fn test_miss_then_hit_calls_upstream_once() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(body_partial_json(serde_json::json!({"model": "m1", "input": "hello"})))
        .respond_with(upstream_vector(&[0.1, 0.2, 0.3]))
        .expect(1)
        .mount(&upstream)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let proxy = Proxy::start(&upstream, temp_dir.path().join("embeddings.db")).await;
    let client = reqwest::Client::new();

    for _ in 0..2 {
        let response = client
            .post(proxy.url("/"))
            .json(&serde_json::json!({"model": "m1", "input": "hello"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body, serde_json::json!({"embedding": [0.1, 0.2, 0.3]}));
    }

    proxy.stop().await;
}

#[tokio::test]
async fn test_cache_survives_restart() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(upstream_vector(&[1.0, 2.0]))
        .expect(1)
        .mount(&upstream)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("embeddings.db");
    let client = reqwest::Client::new();
    let payload = serde_json::json!({"model": "m1", "input": "persist me"});

    let proxy = Proxy::start(&upstream, db_path.clone()).await;
    let first = client.post(proxy.url("/")).json(&payload).send().await.unwrap();
    assert_eq!(first.status(), reqwest::StatusCode::OK);
    proxy.stop().await;

    let proxy = Proxy::start(&upstream, db_path).await;
    let second: serde_json::Value = client
        .post(proxy.url("/any/path"))
        .json(&payload)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second, serde_json::json!({"embedding": [1.0, 2.0]}));
    proxy.stop().await;
}

#[tokio::test]
async fn test_bad_requests_never_reach_upstream() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(upstream_vector(&[1.0]))
        .expect(0)
        .mount(&upstream)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let proxy = Proxy::start(&upstream, temp_dir.path().join("embeddings.db")).await;
    let client = reqwest::Client::new();

    let garbage = client
        .post(proxy.url("/"))
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(garbage.status(), reqwest::StatusCode::BAD_REQUEST);
    assert_eq!(garbage.text().await.unwrap(), "Invalid request body");

    let empty_model = client
        .post(proxy.url("/"))
        .json(&serde_json::json!({"model": "", "input": "hello"}))
        .send()
        .await
        .unwrap();
    assert_eq!(empty_model.status(), reqwest::StatusCode::BAD_REQUEST);

    proxy.stop().await;
}

#[tokio::test]
async fn test_upstream_failure_is_not_cached() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(2)
        .mount(&upstream)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let proxy = Proxy::start(&upstream, temp_dir.path().join("embeddings.db")).await;
    let client = reqwest::Client::new();
    let payload = serde_json::json!({"model": "m1", "input": "new text"});

    for _ in 0..2 {
        let response = client.post(proxy.url("/")).json(&payload).send().await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        let text = response.text().await.unwrap();
        assert!(text.starts_with("Failed to get embeddings:"), "{text}");
        assert!(text.contains("overloaded"), "{text}");
    }

    proxy.stop().await;
}
