//! Villa search CLI
//!
//! Command-line interface for running the villa search service.

use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use villa_search::api::HealthResponse;
use villa_search::search::{Embedder, EMBEDDING_DIM};
use villa_search::{
    ApiConfig, ApiServer, AppState, EmbeddingService, EmbeddingServiceConfig, Error, MemoryStore,
    MetricsService, QdrantStore, QdrantStoreConfig, Result, ServiceConfig, StoreBackend,
    VectorStore, VillaIndexer,
};

#[derive(Parser)]
#[command(name = "villa-search")]
#[command(author, version, about = "Semantic search service for villa listings", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config.toml")]
        output: String,
    },

    /// Start the HTTP service
    Start {
        /// HTTP API listen address
        #[arg(long)]
        api_addr: Option<String>,

        /// Vector store backend (qdrant or memory)
        #[arg(long)]
        store: Option<StoreBackend>,

        /// Qdrant gRPC endpoint
        #[arg(long)]
        qdrant_url: Option<String>,

        /// Qdrant API key
        #[arg(long, env = "QDRANT_API_KEY", hide_env_values = true)]
        qdrant_api_key: Option<String>,
    },

    /// Check service health
    Health {
        /// API endpoint to check
        #[arg(long, default_value = "http://localhost:8000")]
        endpoint: String,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Init { output } => {
            info!("Writing default configuration to: {}", output);
            ServiceConfig::default().save(&output)?;
            info!("Configuration saved successfully");
        }

        Commands::Start {
            api_addr,
            store,
            qdrant_url,
            qdrant_api_key,
        } => {
            info!("Starting villa search service...");

            // 1. Load configuration, then apply CLI overrides
            let mut config = if Path::new(&cli.config).exists() {
                info!("Loading configuration from: {}", cli.config);
                ServiceConfig::load(&cli.config)?
            } else {
                info!("Using default configuration");
                ServiceConfig::default()
            };
            if let Some(addr) = api_addr {
                config.api.listen_address = addr;
            }
            if let Some(backend) = store {
                config.vector_store.backend = backend;
            }
            if let Some(url) = qdrant_url {
                config.vector_store.url = url;
            }
            if qdrant_api_key.is_some() {
                config.vector_store.api_key = qdrant_api_key;
            }
            config.validate()?;

            // 2. Load the embedding model
            info!("Initializing embedding model (downloads ~90MB on first use)...");
            let embedder: Arc<dyn Embedder> = Arc::new(EmbeddingService::with_config(
                EmbeddingServiceConfig::from(&config.embedding),
            )?);

            // 3. Connect the vector store
            let store: Arc<dyn VectorStore> = match config.vector_store.backend {
                StoreBackend::Qdrant => {
                    info!("Using Qdrant at {}", config.vector_store.url);
                    Arc::new(QdrantStore::new(QdrantStoreConfig::from(
                        &config.vector_store,
                    ))?)
                }
                StoreBackend::Memory => {
                    warn!("Using in-memory vector store; the index is lost on exit");
                    Arc::new(MemoryStore::new())
                }
            };

            // 4. Ensure the collection before accepting requests
            let indexer = Arc::new(VillaIndexer::new(embedder, store));
            indexer.ensure_collection().await?;
            match config.vector_store.backend {
                StoreBackend::Qdrant => info!(
                    "Collection '{}' ready ({} dimensions)",
                    config.vector_store.collection, EMBEDDING_DIM
                ),
                StoreBackend::Memory => {
                    info!("In-memory index ready ({} dimensions)", EMBEDDING_DIM)
                }
            }

            // 5. Metrics are optional; keep serving without them
            let mut app_state = AppState::new(indexer);
            match MetricsService::install() {
                Ok(metrics) => app_state = app_state.with_metrics(Arc::new(metrics)),
                Err(e) => warn!("Metrics disabled: {}", e),
            }

            // 6. Serve until Ctrl+C
            let api_config = ApiConfig::from(config.api.clone());
            let listen_address = api_config.listen_address.clone();
            let api_server = ApiServer::with_state(api_config, app_state);

            info!("Press Ctrl+C to stop");
            api_server
                .run_until(&listen_address, async {
                    if let Err(e) = signal::ctrl_c().await {
                        error!("Failed to listen for shutdown signal: {}", e);
                    }
                    info!("Received shutdown signal");
                })
                .await?;
            info!("Service stopped");
        }

        Commands::Health { endpoint } => {
            info!("Checking service health at: {}", endpoint);

            let health_url = format!("{}/health", endpoint.trim_end_matches('/'));

            match tokio::time::timeout(std::time::Duration::from_secs(5), check_health(&health_url))
                .await
            {
                Ok(Ok(response)) => {
                    info!("Service status: {}", response.status);
                    info!("Version: {}", response.version);
                    info!("Uptime: {} seconds", response.uptime);
                }
                Ok(Err(e)) => {
                    error!("Health check failed: {}", e);
                    std::process::exit(1);
                }
                Err(_) => {
                    error!("Health check timed out");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

/// Perform a health check against the API endpoint.
async fn check_health(url: &str) -> Result<HealthResponse> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    // Parse URL to extract host and path
    let url = url.trim_start_matches("http://");
    let (host_port, path) = url
        .split_once('/')
        .map(|(h, p)| (h, format!("/{}", p)))
        .unwrap_or((url, "/health".to_string()));

    let mut stream = TcpStream::connect(host_port)
        .await
        .map_err(|e| Error::Api(format!("Connection failed: {}", e)))?;

    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path, host_port
    );
    stream
        .write_all(request.as_bytes())
        .await
        .map_err(|e| Error::Api(format!("Write failed: {}", e)))?;

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .map_err(|e| Error::Api(format!("Read failed: {}", e)))?;

    parse_health_response(&String::from_utf8_lossy(&response))
}

/// Parse a raw HTTP/1.1 response from `/health`.
fn parse_health_response(raw: &str) -> Result<HealthResponse> {
    if !raw.starts_with("HTTP/1.1 200") {
        let status_line = raw.lines().next().unwrap_or_default();
        return Err(Error::Api(format!("Unexpected response: {}", status_line)));
    }

    // Body follows the blank line after the headers
    let body = raw
        .split_once("\r\n\r\n")
        .map(|(_, body)| body)
        .ok_or_else(|| Error::Api("Invalid HTTP response".to_string()))?;

    serde_json::from_str(body).map_err(|e| Error::Api(format!("JSON parse error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_healthy_response() {
        let raw = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 45\r\n\r\n\
                   {\"status\":\"ok\",\"version\":\"0.1.0\",\"uptime\":5}";
        let health = parse_health_response(raw).unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.version, "0.1.0");
        assert_eq!(health.uptime, 5);
    }

    #[test]
    fn test_parse_server_error_response() {
        let raw = "HTTP/1.1 500 Internal Server Error\r\ncontent-type: application/json\r\n\r\n\
                   {\"error\":{\"code\":500,\"message\":\"boom\"}}";
        match parse_health_response(raw) {
            Err(Error::Api(message)) => assert!(message.contains("500 Internal Server Error")),
            other => panic!("expected Api error, got {:?}", other.map(|h| h.status)),
        }
    }

    #[test]
    fn test_parse_response_without_body() {
        assert!(parse_health_response("HTTP/1.1 200 OK\r\ncontent-length: 0").is_err());
        assert!(parse_health_response("HTTP/1.1 200 OK\r\n\r\nnot json").is_err());
    }
}
