//! In-process vector store.
//!
//! Brute-force cosine ranking over a hash map. Intended for local runs
//! without a Qdrant server and for tests; nothing is persisted.

use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{Embedding, IndexedRecord, ScoredRecord, VectorStore};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct Collection {
    dimension: usize,
    records: HashMap<String, IndexedRecord>,
}

/// Vector store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collection: RwLock<Option<Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.collection
            .read()
            .await
            .as_ref()
            .map(|c| c.records.len())
            .unwrap_or(0)
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Fetch a stored record by id.
    pub async fn get(&self, id: &str) -> Option<IndexedRecord> {
        self.collection
            .read()
            .await
            .as_ref()
            .and_then(|c| c.records.get(id).cloned())
    }
}

fn missing_collection() -> Error {
    Error::VectorStore("Collection does not exist".to_string())
}

fn check_vector(collection: &Collection, vector: &[f32]) -> Result<()> {
    if vector.len() != collection.dimension {
        return Err(Error::VectorStore(format!(
            "Wrong vector dimension: expected {}, got {}",
            collection.dimension,
            vector.len()
        )));
    }
    Ok(())
}

/// Cosine similarity; zero vectors score 0.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn ensure_collection(&self, dimension: usize) -> Result<bool> {
        let mut collection = self.collection.write().await;
        match collection.as_ref() {
            Some(existing) if existing.dimension != dimension => Err(Error::VectorStore(format!(
                "Collection exists with dimension {}, requested {}",
                existing.dimension, dimension
            ))),
            Some(_) => Ok(false),
            None => {
                *collection = Some(Collection {
                    dimension,
                    records: HashMap::new(),
                });
                Ok(true)
            }
        }
    }

    async fn upsert(&self, record: IndexedRecord) -> Result<()> {
        let mut guard = self.collection.write().await;
        let collection = guard.as_mut().ok_or_else(missing_collection)?;
        check_vector(collection, &record.vector)?;
        collection.records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn search(&self, vector: Embedding, limit: usize) -> Result<Vec<ScoredRecord>> {
        let guard = self.collection.read().await;
        let collection = guard.as_ref().ok_or_else(missing_collection)?;
        check_vector(collection, &vector)?;

        let mut scored: Vec<(&str, ScoredRecord)> = collection
            .records
            .values()
            .map(|record| {
                (
                    record.id.as_str(),
                    ScoredRecord {
                        payload: record.payload.clone(),
                        score: cosine_similarity(&vector, &record.vector),
                    },
                )
            })
            .collect();

        scored.sort_by(|(id_a, a), (id_b, b)| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| id_a.cmp(id_b))
        });
        scored.truncate(limit);

        Ok(scored.into_iter().map(|(_, hit)| hit).collect())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut guard = self.collection.write().await;
        let collection = guard.as_mut().ok_or_else(missing_collection)?;
        collection.records.remove(id);
        Ok(())
    }
}
