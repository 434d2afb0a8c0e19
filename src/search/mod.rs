//! Semantic search module for villa listings.
//!
//! Provides vector-based semantic search using:
//! - FastEmbed for embedding generation (ONNX-based, lightweight)
//! - Qdrant for vector storage and similarity search
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐
//! │  VillaDocument  │────▶│ canonical text  │
//! │  (request body) │     │  "name. desc…"  │
//! └─────────────────┘     └────────┬────────┘
//!                                  │
//!                                  ▼
//!                         ┌─────────────────┐
//!                         │    Embedder     │
//!                         │   (FastEmbed)   │
//!                         └────────┬────────┘
//!                                  │ [f32; 384]
//!                                  ▼
//!                         ┌─────────────────┐
//!                         │   VectorStore   │
//!                         │ (Qdrant/memory) │
//!                         └────────┬────────┘
//!                                  │
//!                                  ▼
//!                         ┌─────────────────┐
//!                         │  ranked ids ≤ 5 │
//!                         └─────────────────┘
//! ```

mod document;
mod embedding;
mod indexer;
mod memory;
mod qdrant;
mod store;

pub use document::{canonical_text, VillaDocument, VillaPayload};
pub use embedding::{Embedder, Embedding, EmbeddingService, EmbeddingServiceConfig};
pub use indexer::{DeleteAck, IndexAck, VillaIndexer};
pub use memory::MemoryStore;
pub use qdrant::{point_id_for, QdrantStore, QdrantStoreConfig};
pub use store::{IndexedRecord, ScoredRecord, VectorStore};

/// Default embedding model (all-MiniLM-L6-v2 - 384 dimensions, good balance of speed/quality)
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

/// Embedding dimension for the default model
pub const EMBEDDING_DIM: usize = 384;

/// Collection holding villa vectors
pub const COLLECTION_NAME: &str = "villas";

/// Maximum number of ids returned by a search
pub const SEARCH_LIMIT: usize = 5;
