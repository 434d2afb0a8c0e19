//! HTTP API.
//!
//! | Method | Path            | Purpose                         |
//! |--------|-----------------|---------------------------------|
//! | POST   | `/index-villa`  | embed and store a villa         |
//! | GET    | `/search`       | ids of the closest villas (≤ 5) |
//! | POST   | `/delete-villa` | remove a villa                  |
//! | GET    | `/health`       | liveness and uptime             |
//! | GET    | `/metrics`      | Prometheus metrics              |

mod handlers;

pub use handlers::{DeleteRequest, HealthResponse, SearchParams, SearchResponse};

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ApiSettings;
use crate::error::{Error, Result};
use crate::metrics::MetricsService;
use crate::search::VillaIndexer;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub listen_address: String,
    pub cors_enabled: bool,
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiSettings::default().into()
    }
}

impl From<ApiSettings> for ApiConfig {
    fn from(settings: ApiSettings) -> Self {
        Self {
            listen_address: settings.listen_address,
            cors_enabled: settings.cors_enabled,
            cors_origins: settings.cors_origins,
        }
    }
}

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub indexer: Arc<VillaIndexer>,
    pub start_time: Instant,
    /// `None` when no Prometheus recorder is installed
    pub metrics: Option<Arc<MetricsService>>,
}

impl AppState {
    pub fn new(indexer: Arc<VillaIndexer>) -> Self {
        Self {
            indexer,
            start_time: Instant::now(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsService>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// HTTP server exposing the indexer.
pub struct ApiServer {
    config: ApiConfig,
    state: AppState,
}

impl ApiServer {
    pub fn with_state(config: ApiConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Build the router with all routes and layers.
    pub fn router(&self) -> Router {
        let router = Router::new()
            .route("/index-villa", post(handlers::index_villa))
            .route("/search", get(handlers::search_villas))
            .route("/delete-villa", post(handlers::delete_villa))
            .route("/health", get(handlers::health))
            .route("/metrics", get(handlers::metrics))
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
            .with_state(self.state.clone());

        if self.config.cors_enabled {
            router.layer(cors_layer(&self.config.cors_origins))
        } else {
            router
        }
    }

    /// Serve until the process is stopped.
    pub async fn run(self, addr: &str) -> Result<()> {
        self.run_until(addr, std::future::pending()).await
    }

    /// Serve until `shutdown` resolves, letting in-flight requests finish.
    pub async fn run_until(
        self,
        addr: &str,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Api(format!("Failed to bind to {}: {}", addr, e)))?;
        info!("API server listening on http://{}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| Error::Api(format!("HTTP server error: {}", e)))
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_config_from_settings() {
        let settings = ApiSettings {
            listen_address: "127.0.0.1:9000".to_string(),
            cors_enabled: false,
            cors_origins: vec!["https://villas.example".to_string()],
        };
        let config = ApiConfig::from(settings);
        assert_eq!(config.listen_address, "127.0.0.1:9000");
        assert!(!config.cors_enabled);
        assert_eq!(config.cors_origins.len(), 1);
    }

    #[test]
    fn test_default_api_config() {
        let config = ApiConfig::default();
        assert_eq!(config.listen_address, "0.0.0.0:8000");
        assert!(config.cors_enabled);
    }
}
