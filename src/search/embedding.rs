//! Embedding generation.
//!
//! The `Embedder` trait is the seam the indexer talks to. `EmbeddingService`
//! backs it with a local FastEmbed model loaded once at startup.

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::{DEFAULT_MODEL, EMBEDDING_DIM};
use crate::error::{Error, Result};

/// A dense embedding vector.
pub type Embedding = Vec<f32>;

/// Maps text to a fixed-length vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single piece of text.
    async fn embed(&self, text: &str) -> Result<Embedding>;

    /// Length of every vector this embedder produces.
    fn dimension(&self) -> usize;
}

/// Configuration for the FastEmbed-backed service.
#[derive(Debug, Clone)]
pub struct EmbeddingServiceConfig {
    /// Model cache directory (fastembed's default when `None`)
    pub cache_dir: Option<PathBuf>,
    pub show_download_progress: bool,
}

impl Default for EmbeddingServiceConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            show_download_progress: true,
        }
    }
}

impl From<&crate::config::EmbeddingSettings> for EmbeddingServiceConfig {
    fn from(settings: &crate::config::EmbeddingSettings) -> Self {
        Self {
            cache_dir: settings.cache_dir.clone(),
            show_download_progress: settings.show_download_progress,
        }
    }
}

/// FastEmbed all-MiniLM-L6-v2 embedder.
///
/// Cheap to clone; clones share the loaded model.
#[derive(Clone)]
pub struct EmbeddingService {
    model: Arc<Mutex<TextEmbedding>>,
}

impl EmbeddingService {
    /// Load the default model, downloading it on first use.
    pub fn new() -> Result<Self> {
        Self::with_config(EmbeddingServiceConfig::default())
    }

    /// Load the default model with explicit options.
    pub fn with_config(config: EmbeddingServiceConfig) -> Result<Self> {
        let mut options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(config.show_download_progress);
        if let Some(dir) = config.cache_dir {
            options = options.with_cache_dir(dir);
        }

        info!("Loading embedding model {}", DEFAULT_MODEL);
        let model = TextEmbedding::try_new(options).map_err(|e| {
            Error::Embedding(format!("Failed to initialize {}: {}", DEFAULT_MODEL, e))
        })?;

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }
}

#[async_trait]
impl Embedder for EmbeddingService {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let model = Arc::clone(&self.model);
        let text = text.to_string();

        // ONNX inference is CPU bound; keep it off the async workers.
        let mut vectors = tokio::task::spawn_blocking(move || {
            let model = model
                .lock()
                .map_err(|_| Error::Embedding("Embedding model lock poisoned".to_string()))?;
            model
                .embed(vec![text], None)
                .map_err(|e| Error::Embedding(e.to_string()))
        })
        .await
        .map_err(|e| Error::Embedding(format!("Embedding task failed: {}", e)))??;

        let vector = vectors
            .pop()
            .ok_or_else(|| Error::Embedding("Model returned no embedding".to_string()))?;
        check_dimension(&vector, EMBEDDING_DIM)?;
        debug!(dim = vector.len(), "Computed embedding");
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }
}

/// Fail if a vector does not have the expected length.
pub(crate) fn check_dimension(vector: &[f32], expected: usize) -> Result<()> {
    if vector.len() != expected {
        return Err(Error::Embedding(format!(
            "Expected {} dimensions, got {}",
            expected,
            vector.len()
        )));
    }
    Ok(())
}
