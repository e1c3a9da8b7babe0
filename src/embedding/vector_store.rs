//! Vector-store client: cosine-metric collection over fingerprint
//! embeddings, backed by Qdrant.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::instrument;

use crate::error::{Error, Result};
use crate::model::SessionFingerprint;

/// Name of the single collection this crate owns.
pub const COLLECTION_NAME: &str = "geo_spoofer_sessions";

/// One nearest-neighbour hit.
#[derive(Debug, Clone)]
pub struct NeighbourHit {
    pub id: u64,
    /// Cosine similarity in `[0, 1]`, 1 being identical.
    pub score: f32,
    pub payload: SessionFingerprint,
}

/// Persists and queries fingerprint embeddings. All operations are safe to
/// call concurrently from multiple in-flight requests; no client-side
/// caching is required beyond the one-time collection creation.
#[async_trait]
pub trait VectorStoreClient: Send + Sync {
    /// Idempotently create the collection. Safe to call from multiple
    /// concurrent requests; only the first call actually issues the create
    /// RPC.
    async fn ensure_collection(&self) -> Result<()>;

    async fn upsert(&self, id: u64, vector: Vec<f32>, payload: &SessionFingerprint) -> Result<()>;

    async fn search(&self, vector: Vec<f32>, k: usize) -> Result<Vec<NeighbourHit>>;
}

/// Qdrant-backed implementation.
pub struct QdrantVectorStore {
    client: Qdrant,
    dimension: u64,
    creation: OnceCell<()>,
}

impl QdrantVectorStore {
    pub fn new(url: &str, api_key: Option<String>, dimension: usize) -> Result<Self> {
        let mut builder = Qdrant::from_url(url);
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
        let client = builder
            .build()
            .map_err(|e| Error::VectorStoreUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            dimension: dimension as u64,
            creation: OnceCell::new(),
        })
    }

    fn fingerprint_payload(fingerprint: &SessionFingerprint) -> Result<Payload> {
        let value: Value = serde_json::to_value(fingerprint)?;
        Payload::try_from(value).map_err(|e| Error::VectorStoreUnavailable(e.to_string()))
    }
}

#[async_trait]
impl VectorStoreClient for QdrantVectorStore {
    #[instrument(skip(self))]
    async fn ensure_collection(&self) -> Result<()> {
        let dimension = self.dimension;
        let client = &self.client;

        self.creation
            .get_or_try_init(|| async move {
                let exists = client
                    .collection_exists(COLLECTION_NAME)
                    .await
                    .map_err(|e| Error::VectorStoreUnavailable(e.to_string()))?;

                if !exists {
                    client
                        .create_collection(
                            CreateCollectionBuilder::new(COLLECTION_NAME).vectors_config(
                                VectorParamsBuilder::new(dimension, Distance::Cosine),
                            ),
                        )
                        .await
                        .map_err(|e| Error::VectorStoreUnavailable(e.to_string()))?;
                }

                Ok(())
            })
            .await?;

        Ok(())
    }

    #[instrument(name = "vector.upsert", skip(self, vector, payload))]
    async fn upsert(&self, id: u64, vector: Vec<f32>, payload: &SessionFingerprint) -> Result<()> {
        let payload = Self::fingerprint_payload(payload)?;
        let point = PointStruct::new(id, vector, payload);

        self.client
            .upsert_points(UpsertPointsBuilder::new(COLLECTION_NAME, vec![point]))
            .await
            .map_err(|e| Error::VectorStoreUnavailable(e.to_string()))?;

        Ok(())
    }

    #[instrument(name = "vector.search", skip(self, vector))]
    async fn search(&self, vector: Vec<f32>, k: usize) -> Result<Vec<NeighbourHit>> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(COLLECTION_NAME, vector, k as u64).with_payload(true),
            )
            .await
            .map_err(|e| Error::VectorStoreUnavailable(e.to_string()))?;

        response
            .result
            .into_iter()
            .map(|scored| {
                let id = match scored.id.and_then(|id| id.point_id_options) {
                    Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(n)) => n,
                    _ => {
                        return Err(Error::InternalInvariantViolation(
                            "vector store returned a non-numeric point id".to_string(),
                        ))
                    }
                };
                let payload_map: HashMap<String, Value> = scored
                    .payload
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect();
                let payload: SessionFingerprint =
                    serde_json::from_value(Value::Object(payload_map.into_iter().collect()))?;
                Ok(NeighbourHit {
                    id,
                    score: scored.score,
                    payload,
                })
            })
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::test_doubles::InMemoryVectorStore;
    use super::*;
    use crate::model::{
        FingerprintEnvironment, FingerprintLocation, FingerprintNetwork, FingerprintSummary,
        RiskBucket,
    };
    use uuid::Uuid;

    fn sample_fingerprint() -> SessionFingerprint {
        SessionFingerprint {
            id: Uuid::new_v4(),
            timestamp_ms: 0,
            location: FingerprintLocation::default(),
            environment: FingerprintEnvironment::default(),
            network: FingerprintNetwork::default(),
            summary: FingerprintSummary {
                location_score: Some(100),
                environment_score: Some(100),
                overall_risk: RiskBucket::Low,
                spoofing_indicators: Vec::new(),
            },
        }
    }

    #[tokio::test]
    async fn upsert_with_same_id_replaces_not_duplicates() {
        let store = InMemoryVectorStore::default();
        let fp = sample_fingerprint();
        store.upsert(1, vec![1.0, 0.0], &fp).await.unwrap();
        store.upsert(1, vec![0.0, 1.0], &fp).await.unwrap();

        let hits = store.search(vec![0.0, 1.0], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn search_returns_empty_for_empty_collection() {
        let store = InMemoryVectorStore::default();
        let hits = store.search(vec![1.0, 0.0], 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn search_respects_k() {
        let store = InMemoryVectorStore::default();
        let fp = sample_fingerprint();
        for i in 0..10u64 {
            store
                .upsert(i, vec![i as f32, 1.0], &fp)
                .await
                .unwrap();
        }
        let hits = store.search(vec![1.0, 1.0], 5).await.unwrap();
        assert_eq!(hits.len(), 5);
    }
}
