//! Qdrant-backed vector store.

use async_trait::async_trait;
use qdrant_client::qdrant::{
    vectors_config, CollectionInfo, CreateCollectionBuilder, DeletePointsBuilder, Distance,
    PointStruct, PointsIdsList, SearchPointsBuilder, UpsertPointsBuilder, Value, VectorParams,
    VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{Embedding, IndexedRecord, ScoredRecord, VectorStore, VillaPayload};
use crate::error::{Error, Result};

/// Payload key holding the caller's identifier.
const ID_FIELD: &str = "mongo_id";

/// Connection settings for Qdrant.
#[derive(Debug, Clone)]
pub struct QdrantStoreConfig {
    /// gRPC endpoint, e.g. `http://localhost:6334`
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
}

impl From<&crate::config::VectorStoreSettings> for QdrantStoreConfig {
    fn from(settings: &crate::config::VectorStoreSettings) -> Self {
        Self {
            url: settings.url.clone(),
            api_key: settings.api_key.clone(),
            collection: settings.collection.clone(),
        }
    }
}

/// Map a caller identifier onto a Qdrant point id.
///
/// Qdrant only accepts unsigned integers or UUIDs as point ids, while callers
/// use arbitrary strings (MongoDB ObjectIds). The identifier is hashed into a
/// name-based UUID so the same id always addresses the same point; the
/// original string is kept in the payload.
pub fn point_id_for(id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, id.as_bytes())
}

/// Vector store talking to a Qdrant server.
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
}

impl QdrantStore {
    /// Build a client. No connection is made until the first call.
    pub fn new(config: QdrantStoreConfig) -> Result<Self> {
        let client = Qdrant::from_url(&config.url)
            .api_key(config.api_key)
            .build()?;
        Ok(Self {
            client,
            collection: config.collection,
        })
    }

    /// Reject an existing collection whose vectors don't match the embedder.
    async fn check_existing(&self, dimension: usize) -> Result<()> {
        let info = self
            .client
            .collection_info(self.collection.as_str())
            .await?
            .result
            .ok_or_else(|| {
                Error::VectorStore(format!("No info returned for collection '{}'", self.collection))
            })?;
        let params = vector_params(&info).ok_or_else(|| {
            Error::VectorStore(format!(
                "Collection '{}' has no single unnamed vector config",
                self.collection
            ))
        })?;
        check_vector_params(&self.collection, params, dimension)
    }
}

/// The unnamed vector parameters of a collection, if it has them.
fn vector_params(info: &CollectionInfo) -> Option<&VectorParams> {
    let vectors = info.config.as_ref()?.params.as_ref()?.vectors_config.as_ref()?;
    match vectors.config.as_ref()? {
        vectors_config::Config::Params(params) => Some(params),
        vectors_config::Config::ParamsMap(_) => None,
    }
}

fn check_vector_params(collection: &str, params: &VectorParams, dimension: usize) -> Result<()> {
    if params.size != dimension as u64 {
        return Err(Error::VectorStore(format!(
            "Collection '{}' stores {}-dimensional vectors, embedder produces {}",
            collection, params.size, dimension
        )));
    }
    if params.distance != Distance::Cosine as i32 {
        let distance = Distance::try_from(params.distance)
            .map(|d| d.as_str_name())
            .unwrap_or("Unknown");
        return Err(Error::VectorStore(format!(
            "Collection '{}' uses {} distance, expected Cosine",
            collection, distance
        )));
    }
    Ok(())
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_collection(&self, dimension: usize) -> Result<bool> {
        if self.client.collection_exists(self.collection.as_str()).await? {
            self.check_existing(dimension).await?;
            info!("Collection '{}' already exists", self.collection);
            return Ok(false);
        }

        warn!("Collection '{}' not found, creating it", self.collection);
        let create = self
            .client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(dimension as u64, Distance::Cosine)),
            )
            .await;

        match create {
            Ok(_) => {
                info!("Collection '{}' created", self.collection);
                Ok(true)
            }
            Err(e) => {
                // Another instance may have created it between the check and the create.
                if self.client.collection_exists(self.collection.as_str()).await? {
                    debug!("Collection '{}' appeared concurrently: {}", self.collection, e);
                    self.check_existing(dimension).await?;
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn upsert(&self, record: IndexedRecord) -> Result<()> {
        let payload = Payload::try_from(serde_json::to_value(&record.payload)?)?;
        let point = PointStruct::new(
            point_id_for(&record.id).to_string(),
            record.vector,
            payload,
        );

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, vec![point]).wait(true))
            .await?;
        Ok(())
    }

    async fn search(&self, vector: Embedding, limit: usize) -> Result<Vec<ScoredRecord>> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, vector, limit as u64).with_payload(true),
            )
            .await?;

        response
            .result
            .into_iter()
            .map(|point| {
                Ok(ScoredRecord {
                    payload: decode_payload(&point.payload)?,
                    score: point.score,
                })
            })
            .collect()
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(PointsIdsList {
                        ids: vec![point_id_for(id).to_string().into()],
                    })
                    .wait(true),
            )
            .await?;
        Ok(())
    }
}

/// Decode a search hit's payload into its typed form.
fn decode_payload(payload: &HashMap<String, Value>) -> Result<VillaPayload> {
    payload
        .get(ID_FIELD)
        .and_then(|value| value.as_str())
        .map(|id| VillaPayload::new(id.as_str()))
        .ok_or_else(|| {
            Error::VectorStore(format!("Search hit is missing string field '{}'", ID_FIELD))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_id_is_stable() {
        let a = point_id_for("64f1c2a9e4b0a1b2c3d4e5f6");
        let b = point_id_for("64f1c2a9e4b0a1b2c3d4e5f6");
        assert_eq!(a, b);
        assert_ne!(a, point_id_for("64f1c2a9e4b0a1b2c3d4e5f7"));
    }

    #[test]
    fn test_point_id_is_uuid_v5() {
        assert_eq!(point_id_for("v1").get_version_num(), 5);
    }

    #[test]
    fn test_decode_payload() {
        let mut payload = HashMap::new();
        payload.insert(ID_FIELD.to_string(), Value::from("v1"));
        assert_eq!(decode_payload(&payload).unwrap(), VillaPayload::new("v1"));
    }

    #[test]
    fn test_decode_payload_missing_field() {
        let mut payload = HashMap::new();
        payload.insert("name".to_string(), Value::from("Ocean Breeze"));
        assert!(matches!(decode_payload(&payload), Err(Error::VectorStore(_))));
    }

    #[test]
    fn test_decode_payload_wrong_type() {
        let mut payload = HashMap::new();
        payload.insert(ID_FIELD.to_string(), Value::from(42_i64));
        assert!(decode_payload(&payload).is_err());
    }

    #[test]
    fn test_vector_params_match() {
        let params = VectorParamsBuilder::new(384, Distance::Cosine).build();
        assert!(check_vector_params("villas", &params, 384).is_ok());
    }

    #[test]
    fn test_vector_params_wrong_size() {
        let params = VectorParamsBuilder::new(768, Distance::Cosine).build();
        let err = check_vector_params("villas", &params, 384).unwrap_err();
        assert!(matches!(err, Error::VectorStore(_)));
        assert!(err.to_string().contains("768"));
    }

    #[test]
    fn test_vector_params_wrong_distance() {
        let params = VectorParamsBuilder::new(384, Distance::Dot).build();
        let err = check_vector_params("villas", &params, 384).unwrap_err();
        assert!(err.to_string().contains("Dot"));
    }

    #[test]
    fn test_vector_params_missing_config() {
        assert!(vector_params(&CollectionInfo::default()).is_none());
    }

    #[test]
    fn test_config_from_settings() {
        let settings = crate::config::VectorStoreSettings::default();
        let config = QdrantStoreConfig::from(&settings);
        assert_eq!(config.collection, "villas");
        assert_eq!(config.url, "http://localhost:6334");
        assert!(config.api_key.is_none());
    }
}
