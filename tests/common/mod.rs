//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use code_explainer::config::ExplainerConfig;
use code_explainer::http::HttpServer;
use code_explainer::lifecycle::Shutdown;

pub const EXPLANATION: &str = r#"{"summary":"Prints a greeting to standard output.","line_by_line":[{"line":1,"explanation":"Calls print with the string 'hello'."}],"suggested_tests":[{"test_case":"Capture stdout","description":"Checks the exact text printed."}],"potential_refactors":[{"area":"Naming","suggestion":"Wrap the call in a main function."}]}"#;

type Reply = Pin<Box<dyn Future<Output = (u16, Value)> + Send>>;
type Handler = Arc<dyn Fn(Value) -> Reply + Send + Sync>;

/// Start a programmable mock Ollama server on an ephemeral port.
///
/// `f` receives each `/api/generate` request body and returns the status and
/// reply body.
pub async fn start_mock_ollama<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, Value)> + Send + 'static,
{
    let handler: Handler = Arc::new(move |body: Value| -> Reply { Box::pin(f(body)) });

    async fn generate(
        State(handler): State<Handler>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let (status, reply) = handler(body).await;
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(reply),
        )
    }

    let app = Router::new()
        .route("/api/generate", post(generate))
        .with_state(handler);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Mock Ollama that always answers with `response` as the generated text.
pub async fn start_mock_ollama_text(response: &'static str) -> SocketAddr {
    start_mock_ollama(move |_| async move {
        (200, json!({ "response": response, "done": true }))
    })
    .await
}

/// Config pointing at `backend` with fast retries, suitable for tests.
pub fn test_config(backend: SocketAddr) -> ExplainerConfig {
    let mut config = ExplainerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.backend.endpoint = format!("http://{}", backend);
    config.backend.request_timeout_ms = 2_000;
    config.backend.connect_timeout_ms = 500;
    config.retries.base_delay_ms = 10;
    config.retries.max_delay_ms = 20;
    config.timeouts.request_secs = 30;
    config
}

/// A running explainer server.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the real server over TCP with `config`.
pub async fn start_server(config: ExplainerConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let receiver: broadcast::Receiver<()> = shutdown.subscribe();

    let server = HttpServer::new(config).unwrap();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    TestServer { addr, shutdown }
}

pub async fn post_explain(server: &TestServer, code: &str, language: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(server.url("/explain"))
        .json(&json!({ "code": code, "language": language }))
        .send()
        .await
        .unwrap()
}
