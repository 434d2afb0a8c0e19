//! Helpers shared by the integration test binaries.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;

use villa_search::search::{Embedder, Embedding};
use villa_search::{MemoryStore, Result, VillaIndexer};

pub const DIM: usize = 64;

/// Bag-of-words embedder so related texts share buckets without a model download.
pub struct WordHashEmbedder;

#[async_trait]
impl Embedder for WordHashEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let mut vector = vec![0.0; DIM];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = word
                .to_lowercase()
                .bytes()
                .fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
            vector[bucket % DIM] += 1.0;
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

/// Indexer over a fresh in-memory store with its collection created.
pub async fn memory_indexer() -> (Arc<VillaIndexer>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let indexer = Arc::new(VillaIndexer::new(Arc::new(WordHashEmbedder), store.clone()));
    indexer.ensure_collection().await.unwrap();
    (indexer, store)
}

pub fn ocean_breeze() -> serde_json::Value {
    serde_json::json!({
        "mongo_id": "v1",
        "name": "Ocean Breeze",
        "description": "Beachfront villa",
        "bedrooms": 4,
        "amenities": ["pool", "wifi"]
    })
}
