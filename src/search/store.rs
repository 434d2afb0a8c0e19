//! Vector store abstraction.

use async_trait::async_trait;

use super::{Embedding, VillaPayload};
use crate::error::Result;

/// One vector with its payload, keyed by the caller's identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedRecord {
    pub id: String,
    pub vector: Embedding,
    pub payload: VillaPayload,
}

impl IndexedRecord {
    /// Build a record whose payload repeats the identifier.
    pub fn new(id: impl Into<String>, vector: Embedding) -> Self {
        let id = id.into();
        Self {
            payload: VillaPayload::new(id.clone()),
            id,
            vector,
        }
    }
}

/// A search hit with its decoded payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub payload: VillaPayload,
    pub score: f32,
}

/// Storage and nearest-neighbour search over villa vectors.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the backing collection if it does not exist yet.
    ///
    /// Returns `true` when the collection had to be created. An existing
    /// collection whose dimension or distance differs is an error.
    async fn ensure_collection(&self, dimension: usize) -> Result<bool>;

    /// Insert or fully replace the record with this id.
    async fn upsert(&self, record: IndexedRecord) -> Result<()>;

    /// Records most similar to `vector`, best first, at most `limit`.
    async fn search(&self, vector: Embedding, limit: usize) -> Result<Vec<ScoredRecord>>;

    /// Remove the record with this id. Unknown ids are not an error.
    async fn delete(&self, id: &str) -> Result<()>;
}
