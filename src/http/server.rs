//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the front controller handlers
//! - Wire up middleware (tracing, request ID, timeout)
//! - Route each request through the path grammar
//! - Fetch resolved URLs from the backend and stream them back
//! - Swap router and fetcher when a new config arrives
//! - Graceful shutdown on the lifecycle broadcast

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::FrontConfig;
use crate::fetch::{ContentFetcher, FetchError};
use crate::http::request::{
    propagate_request_id_layer, raw_query, request_id, set_request_id_layer,
};
use crate::http::response::{fetch_failed, into_client_response, not_found};
use crate::observability::metrics;
use crate::routing::{PathRouter, RouteDecision};

/// Added to the fetch budget for the outer request timeout; the fetch deadline fires first.
const HANDLER_GRACE: Duration = Duration::from_secs(1);

/// Everything a request needs, rebuilt as a unit on config reload.
#[derive(Debug)]
pub struct Dispatch {
    pub router: PathRouter,
    pub fetcher: ContentFetcher,
    pub query_param: Option<String>,
}

impl Dispatch {
    pub fn from_config(config: &FrontConfig) -> Result<Self, FetchError> {
        Ok(Self {
            router: PathRouter::new(config.backend.url.clone(), config.routing.variant),
            fetcher: ContentFetcher::new(&config.timeouts, config.retries.clone())?,
            query_param: config.routing.query_param.clone(),
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<Dispatch>>,
}

impl AppState {
    pub fn new(dispatch: Dispatch) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(dispatch)),
        }
    }

    /// Replace the dispatch used by new requests. In-flight requests keep the old one.
    pub fn reload(&self, config: &FrontConfig) -> Result<(), FetchError> {
        let dispatch = Dispatch::from_config(config)?;
        self.inner.store(Arc::new(dispatch));
        tracing::info!(
            backend_url = %config.backend.url,
            variant = %config.routing.variant,
            "Configuration reloaded"
        );
        Ok(())
    }
}

/// HTTP server for the front controller.
pub struct HttpServer {
    router: Router,
    config: FrontConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: FrontConfig) -> Result<Self, FetchError> {
        let state = AppState::new(Dispatch::from_config(&config)?);
        let router = Self::build_router(&config, state.clone());

        Ok(Self {
            router,
            config,
            state,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &FrontConfig, state: AppState) -> Router {
        let guard = Duration::from_secs(config.timeouts.request_secs) + HANDLER_GRACE;

        Router::new()
            .route("/", get(root_handler))
            .route("/{*path}", get(page_handler))
            .with_state(state)
            .layer(TimeoutLayer::with_status_code(StatusCode::GATEWAY_TIMEOUT, guard))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until the shutdown signal fires.
    ///
    /// Configs received on `config_updates` replace the router and fetcher.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<FrontConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend_url = %self.config.backend.url,
            variant = %self.config.routing.variant,
            "HTTP server starting"
        );

        let state = self.state.clone();
        let mut reload_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = config_updates.recv() => match update {
                        Some(config) => {
                            if let Err(e) = state.reload(&config) {
                                tracing::warn!(error = %e, "Failed to apply new configuration");
                            }
                        }
                        None => break,
                    },
                    _ = reload_shutdown.recv() => break,
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Shared state, for reloading outside of `run`.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

async fn root_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    serve_page(&state, "", &params, &headers).await
}

async fn page_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    serve_page(&state, &path, &params, &headers).await
}

/// Route the request and stream the backend page, or answer 404.
async fn serve_page(
    state: &AppState,
    path: &str,
    params: &HashMap<String, String>,
    headers: &HeaderMap,
) -> Response {
    let start_time = Instant::now();
    let dispatch = state.inner.load_full();
    let request_id = request_id(headers);
    let query = raw_query(path, params, dispatch.query_param.as_deref());

    let url = match dispatch.router.route(&query) {
        RouteDecision::Found(url) => url,
        RouteDecision::NotFound => {
            tracing::warn!(request_id = %request_id, query = %query, "No page matched");
            metrics::record_request("not_found", 404, start_time);
            return not_found();
        }
    };

    tracing::debug!(request_id = %request_id, query = %query, url = %url, "Fetching page");

    match dispatch.fetcher.fetch(&url, request_id).await {
        Ok(upstream) => {
            let status = upstream.status();
            metrics::record_request("found", status.as_u16(), start_time);
            into_client_response(upstream)
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, url = %url, error = %e, "Backend fetch failed");
            metrics::record_request("fetch_failed", e.status().as_u16(), start_time);
            fetch_failed(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::GrammarVariant;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    fn test_config() -> FrontConfig {
        let mut config = FrontConfig::default();
        // Nothing listens on port 1; fetches fail fast.
        config.backend.url = "http://127.0.0.1:1".into();
        config.retries.enabled = false;
        config.timeouts.connect_secs = 1;
        config
    }

    async fn send(router: Router, method: Method, uri: &str) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        router.oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_invalid_path_is_not_found() {
        let server = HttpServer::new(test_config()).unwrap();
        for uri in ["/en/user/login", "/user/login", "/pt-br/about/us", "/"] {
            let response = send(server.router(), Method::GET, uri).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_response_carries_request_id() {
        let server = HttpServer::new(test_config()).unwrap();
        let response = send(server.router(), Method::GET, "/en/other/").await;
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_query_param_overrides_path() {
        let server = HttpServer::new(test_config()).unwrap();
        let response = send(server.router(), Method::GET, "/front.php?q=en%2Fuser%2Flogin").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_bad_gateway() {
        let server = HttpServer::new(test_config()).unwrap();
        let response = send(server.router(), Method::GET, "/en/about").await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_post_not_allowed() {
        let server = HttpServer::new(test_config()).unwrap();
        let response = send(server.router(), Method::POST, "/en/about").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_reload_swaps_router() {
        let server = HttpServer::new(test_config()).unwrap();
        assert_eq!(
            server.state().inner.load().router.variant(),
            GrammarVariant::Permissive
        );

        let mut config = test_config();
        config.routing.variant = GrammarVariant::LegacyNumeric;
        config.backend.url = "https://cms.example".into();
        server.state().reload(&config).unwrap();

        let dispatch = server.state().inner.load();
        assert_eq!(dispatch.router.variant(), GrammarVariant::LegacyNumeric);
        assert_eq!(dispatch.router.backend_url(), "https://cms.example");
    }
}
