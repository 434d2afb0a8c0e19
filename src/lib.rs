//! Semantic search service for villa listings.
//!
//! The listing backend pushes villas to `/index-villa`, removes them through
//! `/delete-villa`, and asks `/search` for the identifiers of the villas that
//! best match a free-text query. Embeddings come from a local FastEmbed model
//! and vectors live in Qdrant.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod search;

pub use api::{ApiConfig, ApiServer, AppState};
pub use config::{ServiceConfig, StoreBackend};
pub use error::{Error, Result};
pub use metrics::MetricsService;
pub use search::{
    EmbeddingService, EmbeddingServiceConfig, MemoryStore, QdrantStore, QdrantStoreConfig,
    VectorStore, VillaDocument, VillaIndexer,
};
