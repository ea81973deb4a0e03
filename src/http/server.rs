//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the explain and health handlers
//! - Wire up middleware (tracing, request ID, CORS, body limit, timeout)
//! - Bind the server to a listener and serve until shutdown
//! - Prune idle rate-limit windows in the background

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{CorsConfig, ExplainerConfig};
use crate::explain::ExplainService;
use crate::http::handlers;
use crate::http::request::{request_id_of, UuidRequestId, X_REQUEST_ID};
use crate::llm::{BackendError, InferenceBackend, OllamaBackend};
use crate::security::RateLimiter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ExplainService>,
    pub max_body_bytes: usize,
}

/// HTTP server for the code explainer.
pub struct HttpServer {
    router: Router,
    config: ExplainerConfig,
    limiter: Arc<RateLimiter>,
}

impl HttpServer {
    /// Create a server talking to the Ollama endpoint named in `config`.
    pub fn new(config: ExplainerConfig) -> Result<Self, BackendError> {
        let backend = OllamaBackend::new(&config.backend)?;
        Ok(Self::with_backend(config, Arc::new(backend)))
    }

    /// Create a server over any inference backend.
    pub fn with_backend(config: ExplainerConfig, backend: Arc<dyn InferenceBackend>) -> Self {
        let service = Arc::new(ExplainService::from_config(&config, backend));
        let limiter = service.limiter().clone();

        let state = AppState {
            service,
            max_body_bytes: config.request.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            limiter,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ExplainerConfig, state: AppState) -> Router {
        let header = HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .route("/", get(handlers::health))
            .route("/explain", post(handlers::explain))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(DefaultBodyLimit::max(config.request.max_body_bytes))
            .layer(cors_layer(&config.cors))
            .layer(PropagateRequestIdLayer::new(header.clone()))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id_of(request),
                    client = tracing::field::Empty,
                )
            }))
            .layer(SetRequestIdLayer::new(header, UuidRequestId))
    }

    /// The fully layered router.
    ///
    /// `POST /explain` reads the peer address from `ConnectInfo`, so a router
    /// driven without a socket needs a `MockConnectInfo` layer on top.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        if self.config.rate_limit.enabled {
            let limiter = self.limiter.clone();
            let every = Duration::from_secs(self.config.rate_limit.prune_interval_secs.max(1));
            let mut stop = shutdown.resubscribe();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(every);
                ticker.tick().await;
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            let removed = limiter.prune();
                            tracing::debug!(
                                removed,
                                tracked = limiter.tracked_clients(),
                                "Pruned rate-limit windows"
                            );
                        }
                        _ = stop.recv() => break,
                    }
                }
            });
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Listed origins only, with credentials. Methods and headers are mirrored
/// from the preflight, since wildcards are not allowed with credentials.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter(|origin| origin.as_str() != "*")
        .filter_map(|origin| HeaderValue::from_str(origin.trim_end_matches('/')).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::GenerateRequest;
    use async_trait::async_trait;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::{header, Method, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct EchoBackend;

    #[async_trait]
    impl InferenceBackend for EchoBackend {
        fn model(&self) -> &str {
            "echo"
        }

        async fn generate(&self, _request: GenerateRequest<'_>) -> Result<String, BackendError> {
            Ok(
                r#"{"summary":"s","line_by_line":[],"suggested_tests":[],"potential_refactors":[]}"#
                    .into(),
            )
        }
    }

    fn server() -> HttpServer {
        HttpServer::with_backend(ExplainerConfig::default(), Arc::new(EchoBackend))
    }

    fn with_peer(router: Router) -> Router {
        router.layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))))
    }

    fn post_json(body: String) -> Request<Body> {
        Request::post("/explain")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_has_request_id() {
        let response = server()
            .router()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(X_REQUEST_ID));
    }

    #[tokio::test]
    async fn test_client_request_id_is_propagated() {
        let response = server()
            .router()
            .oneshot(
                Request::get("/")
                    .header(X_REQUEST_ID, "trace-me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[X_REQUEST_ID], "trace-me");
    }

    #[tokio::test]
    async fn test_cors_preflight_for_listed_origin() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/explain")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:5173");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");
    }

    #[tokio::test]
    async fn test_cors_ignores_unlisted_origin() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/explain")
                    .header(header::ORIGIN, "http://evil.example")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(!response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn test_explain_without_socket_uses_mock_peer() {
        let body = json!({ "code": "print('hi')", "language": "python" }).to_string();
        let response = with_peer(server().router())
            .oneshot(post_json(body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["summary"], "s");
    }

    #[tokio::test]
    async fn test_oversized_body_is_413_with_detail() {
        let mut config = ExplainerConfig::default();
        config.request.max_body_bytes = 64;
        config.request.max_code_chars = 10;
        let router = HttpServer::with_backend(config, Arc::new(EchoBackend)).router();

        let body = format!(r#"{{"code":"{}","language":"python"}}"#, "x".repeat(200));
        let response = with_peer(router).oneshot(post_json(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(response.headers().contains_key(X_REQUEST_ID));
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(
            json_body(response).await,
            json!({ "detail": "Request body exceeds 64 bytes." })
        );
    }
}
