//! The indexing façade: documents in, ranked identifiers out.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

use super::document::validate_id;
use super::embedding::check_dimension;
use super::{Embedder, IndexedRecord, VectorStore, VillaDocument, SEARCH_LIMIT};
use crate::error::Result;
use crate::metrics::{record_operation, Operation};

/// Acknowledgement returned after indexing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexAck {
    pub status: String,
    pub id: String,
}

impl IndexAck {
    fn new(id: impl Into<String>) -> Self {
        Self {
            status: "indexed".to_string(),
            id: id.into(),
        }
    }
}

/// Acknowledgement returned after deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteAck {
    pub status: String,
    pub id: String,
}

impl DeleteAck {
    fn new(id: impl Into<String>) -> Self {
        Self {
            status: "deleted".to_string(),
            id: id.into(),
        }
    }
}

/// Indexes, searches and deletes villas through an embedder and a vector store.
///
/// Holds no state of its own besides the two collaborators, so it can be
/// shared freely behind an `Arc`.
#[derive(Clone)]
pub struct VillaIndexer {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    limit: usize,
}

impl VillaIndexer {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            store,
            limit: SEARCH_LIMIT,
        }
    }

    /// Make sure the store has a collection sized for the embedder.
    ///
    /// Safe to call repeatedly; only the first call against an empty store
    /// creates anything.
    pub async fn ensure_collection(&self) -> Result<()> {
        let dimension = self.embedder.dimension();
        if self.store.ensure_collection(dimension).await? {
            info!("Created vector collection ({} dimensions, cosine)", dimension);
        }
        Ok(())
    }

    /// Embed a villa and store it under its identifier, replacing any previous version.
    #[instrument(skip(self, villa), fields(id = %villa.mongo_id))]
    pub async fn index(&self, villa: &VillaDocument) -> Result<IndexAck> {
        let started = Instant::now();
        let result = self.index_inner(villa).await;
        record_operation(Operation::Index, started, result.is_ok());
        result
    }

    async fn index_inner(&self, villa: &VillaDocument) -> Result<IndexAck> {
        validate_id(&villa.mongo_id)?;

        let text = villa.canonical_text();
        debug!(text = %text, "Embedding villa");
        let vector = self.embedder.embed(&text).await?;
        check_dimension(&vector, self.embedder.dimension())?;

        self.store
            .upsert(IndexedRecord::new(villa.mongo_id.clone(), vector))
            .await?;

        info!("Indexed villa");
        Ok(IndexAck::new(villa.mongo_id.clone()))
    }

    /// Identifiers of the villas closest to `query`, best match first.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<String>> {
        let started = Instant::now();
        let result = self.search_inner(query).await;
        record_operation(Operation::Search, started, result.is_ok());
        result
    }

    async fn search_inner(&self, query: &str) -> Result<Vec<String>> {
        let vector = self.embedder.embed(query).await?;
        check_dimension(&vector, self.embedder.dimension())?;

        let hits = self.store.search(vector, self.limit).await?;
        let ids: Vec<String> = hits
            .into_iter()
            .take(self.limit)
            .map(|hit| hit.payload.mongo_id)
            .collect();

        debug!(results = ids.len(), "Search complete");
        Ok(ids)
    }

    /// Remove a villa from the index. Unknown identifiers are acknowledged as deleted.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<DeleteAck> {
        let started = Instant::now();
        let result = self.delete_inner(id).await;
        record_operation(Operation::Delete, started, result.is_ok());
        result
    }

    async fn delete_inner(&self, id: &str) -> Result<DeleteAck> {
        validate_id(id)?;
        self.store.delete(id).await?;
        info!("Deleted villa");
        Ok(DeleteAck::new(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::search::{Embedding, MemoryStore, ScoredRecord, VillaPayload};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DIM: usize = 64;

    /// Deterministic bag-of-words embedder: each lowercase word bumps one bucket.
    struct WordHashEmbedder;

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

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Embedding> {
            Err(Error::Embedding("model unavailable".to_string()))
        }

        fn dimension(&self) -> usize {
            DIM
        }
    }

    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        async fn embed(&self, _text: &str) -> Result<Embedding> {
            Ok(vec![1.0; 3])
        }

        fn dimension(&self) -> usize {
            DIM
        }
    }

    /// Store that returns more hits than asked for and counts calls.
    #[derive(Default)]
    struct FloodStore {
        searches: AtomicUsize,
    }

    #[async_trait]
    impl VectorStore for FloodStore {
        async fn ensure_collection(&self, _dimension: usize) -> Result<bool> {
            Ok(false)
        }

        async fn upsert(&self, _record: IndexedRecord) -> Result<()> {
            Ok(())
        }

        async fn search(&self, _vector: Embedding, _limit: usize) -> Result<Vec<ScoredRecord>> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            Ok((0..12)
                .map(|i| ScoredRecord {
                    payload: VillaPayload::new(format!("v{}", i)),
                    score: 1.0 - i as f32 * 0.01,
                })
                .collect())
        }

        async fn delete(&self, _id: &str) -> Result<()> {
            Ok(())
        }
    }

    fn villa(id: &str, name: &str, description: &str, amenities: &[&str]) -> VillaDocument {
        VillaDocument {
            mongo_id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            bedrooms: 3,
            amenities: amenities.iter().map(|a| a.to_string()).collect(),
        }
    }

    async fn indexer_with_memory() -> (VillaIndexer, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let indexer = VillaIndexer::new(Arc::new(WordHashEmbedder), store.clone());
        indexer.ensure_collection().await.unwrap();
        (indexer, store)
    }

    #[tokio::test]
    async fn test_index_acknowledges() {
        let (indexer, store) = indexer_with_memory().await;
        let ack = indexer
            .index(&villa("v1", "Ocean Breeze", "Beachfront villa", &["pool", "wifi"]))
            .await
            .unwrap();
        assert_eq!(ack, IndexAck::new("v1"));
        assert_eq!(ack.status, "indexed");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_index_then_search_finds_villa() {
        let (indexer, _) = indexer_with_memory().await;
        indexer
            .index(&villa("v1", "Ocean Breeze", "Beachfront villa", &["pool", "wifi"]))
            .await
            .unwrap();
        indexer
            .index(&villa("v2", "Mountain Lodge", "Alpine chalet", &["fireplace"]))
            .await
            .unwrap();

        let ids = indexer.search("beachfront villa with pool").await.unwrap();
        assert_eq!(ids.first().map(String::as_str), Some("v1"));

        let ids = indexer.search("Ocean Breeze").await.unwrap();
        assert!(ids.contains(&"v1".to_string()));
    }

    #[tokio::test]
    async fn test_delete_removes_from_results() {
        let (indexer, _) = indexer_with_memory().await;
        indexer
            .index(&villa("v1", "Ocean Breeze", "Beachfront villa", &["pool"]))
            .await
            .unwrap();

        let ack = indexer.delete("v1").await.unwrap();
        assert_eq!(ack.status, "deleted");
        assert!(!indexer
            .search("Ocean Breeze")
            .await
            .unwrap()
            .contains(&"v1".to_string()));
    }

    #[tokio::test]
    async fn test_delete_unknown_is_acknowledged() {
        let (indexer, _) = indexer_with_memory().await;
        let ack = indexer.delete("never-indexed").await.unwrap();
        assert_eq!(ack, DeleteAck::new("never-indexed"));
    }

    #[tokio::test]
    async fn test_reindex_keeps_latest_only() {
        let (indexer, store) = indexer_with_memory().await;
        indexer
            .index(&villa("v1", "Ocean Breeze", "Beachfront villa", &["pool"]))
            .await
            .unwrap();
        let updated = villa("v1", "Forest Cabin", "Quiet woodland retreat", &["sauna"]);
        indexer.index(&updated).await.unwrap();

        assert_eq!(store.len().await, 1);
        let expected = WordHashEmbedder.embed(&updated.canonical_text()).await.unwrap();
        assert_eq!(store.get("v1").await.unwrap().vector, expected);
    }

    #[tokio::test]
    async fn test_search_is_capped_at_limit() {
        let store = Arc::new(FloodStore::default());
        let indexer = VillaIndexer::new(Arc::new(WordHashEmbedder), store.clone());

        let ids = indexer.search("anything").await.unwrap();
        assert_eq!(ids.len(), SEARCH_LIMIT);
        assert_eq!(ids[0], "v0");
        assert_eq!(store.searches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_query_is_passed_through() {
        let (indexer, _) = indexer_with_memory().await;
        let ids = indexer.search("").await.unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_empty_id_is_rejected() {
        let (indexer, store) = indexer_with_memory().await;
        let err = indexer
            .index(&villa("", "Nameless", "No id", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(store.is_empty().await);
        assert!(matches!(indexer.delete(" ").await, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates() {
        let store = Arc::new(MemoryStore::new());
        let indexer = VillaIndexer::new(Arc::new(FailingEmbedder), store.clone());
        indexer.ensure_collection().await.unwrap();

        let err = indexer
            .index(&villa("v1", "Ocean Breeze", "Beachfront villa", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
        assert!(store.is_empty().await);
        assert!(indexer.search("pool").await.is_err());
    }

    #[tokio::test]
    async fn test_wrong_dimension_is_rejected() {
        let (_, store) = indexer_with_memory().await;
        let indexer = VillaIndexer::new(Arc::new(ShortEmbedder), store);
        let err = indexer.search("pool").await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        // Collection never ensured, so the store refuses writes.
        let indexer = VillaIndexer::new(Arc::new(WordHashEmbedder), Arc::new(MemoryStore::new()));
        let err = indexer
            .index(&villa("v1", "Ocean Breeze", "Beachfront villa", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::VectorStore(_)));
    }
}
