//! Service configuration.
//!
//! Loaded from a TOML file; CLI flags override individual values at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::search::COLLECTION_NAME;

/// Top-level configuration for the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP API settings
    pub api: ApiSettings,
    /// Embedding model settings
    pub embedding: EmbeddingSettings,
    /// Vector store settings
    pub vector_store: VectorStoreSettings,
}

/// HTTP API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub listen_address: String,
    pub cors_enabled: bool,
    /// Allowed origins; empty means any origin when CORS is enabled
    pub cors_origins: Vec<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:8000".to_string(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

/// Embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Where downloaded model files are cached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    pub show_download_progress: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            cache_dir: None,
            show_download_progress: true,
        }
    }
}

/// Which vector store backend to run against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Qdrant over gRPC
    #[default]
    Qdrant,
    /// In-process store, contents are lost on exit
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "qdrant" => Ok(StoreBackend::Qdrant),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(Error::Config(format!(
                "Unknown vector store backend '{}' (expected 'qdrant' or 'memory')",
                other
            ))),
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    pub backend: StoreBackend,
    /// Qdrant gRPC endpoint
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub collection: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: "http://localhost:6334".to_string(),
            api_key: None,
            collection: COLLECTION_NAME.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: ServiceConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values that would only fail later at startup.
    pub fn validate(&self) -> Result<()> {
        if self.vector_store.collection.trim().is_empty() {
            return Err(Error::Config("vector_store.collection must not be empty".into()));
        }
        if self.vector_store.backend == StoreBackend::Qdrant && self.vector_store.url.is_empty() {
            return Err(Error::Config("vector_store.url is required for qdrant".into()));
        }
        if self.api.listen_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(Error::Config(format!(
                "Invalid api.listen_address '{}'",
                self.api.listen_address
            )));
        }
        Ok(())
    }
}
