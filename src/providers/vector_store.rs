//! Qdrant-backed vector store for manual chunks

use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter,
    PointStruct, SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue,
    VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::VectorDbConfig;
use crate::error::{Error, Result};
use crate::types::manual::{ChunkMetadata, DocumentChunk};

/// A chunk returned from similarity search, with its score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub text: String,
    pub metadata: ChunkMetadata,
    pub score: f32,
}

/// Vector store client over a hosted Qdrant instance.
///
/// Chunk payloads carry the text, a nested `metadata` object, and a
/// `degraded` flag. Searches always exclude degraded points; they only
/// return to circulation after a successful re-embed.
pub struct QdrantStore {
    client: Qdrant,
    collection_name: String,
    dimensions: usize,
}

impl QdrantStore {
    /// Build the client. The collection itself is created lazily by the
    /// first upsert.
    pub fn new(config: &VectorDbConfig, dimensions: usize) -> Result<Self> {
        let client = Qdrant::from_url(&config.url)
            .api_key(config.api_key.clone())
            .build()
            .map_err(|e| Error::vector_db(format!("Qdrant client build failed: {e}")))?;

        Ok(Self {
            client,
            collection_name: config.collection_name.clone(),
            dimensions,
        })
    }

    /// Create the collection when missing.
    pub async fn ensure_collection(&self) -> Result<()> {
        let exists = self
            .client
            .collection_exists(&self.collection_name)
            .await
            .map_err(|e| Error::vector_db(format!("Collection check failed: {e}")))?;

        if !exists {
            tracing::info!("Creating collection '{}'", self.collection_name);
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection_name).vectors_config(
                        VectorParamsBuilder::new(self.dimensions as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(|e| Error::vector_db(format!("Collection creation failed: {e}")))?;
        }
        Ok(())
    }

    /// Upsert one batch of embedded chunks.
    pub async fn upsert_chunks(&self, chunks: &[DocumentChunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let mut points = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            if chunk.embedding.is_empty() {
                return Err(Error::vector_db("Chunk has no embedding"));
            }
            let payload = Payload::try_from(json!({
                "text": chunk.text,
                "metadata": chunk.metadata,
                "degraded": chunk.degraded,
            }))
            .map_err(|e| Error::vector_db(format!("Payload build failed: {e}")))?;

            points.push(PointStruct::new(
                Uuid::new_v4().to_string(),
                chunk.embedding.clone(),
                payload,
            ));
        }

        let count = points.len();
        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection_name, points))
            .await
            .map_err(|e| Error::vector_db(format!("Upsert failed: {e}")))?;

        Ok(count)
    }

    /// Similarity search constrained to the given metadata conditions.
    /// Degraded points are always excluded.
    pub async fn search(
        &self,
        embedding: Vec<f32>,
        conditions: Vec<Condition>,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let filter = Filter {
            must: conditions,
            must_not: vec![Condition::matches("degraded", true)],
            ..Default::default()
        };

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection_name, embedding, limit as u64)
                    .filter(filter)
                    .with_payload(true),
            )
            .await
            .map_err(|e| Error::vector_db(format!("Search failed: {e}")))?;

        let mut results = Vec::with_capacity(response.result.len());
        for point in response.result {
            match parse_payload(&point.payload) {
                Ok((text, metadata)) => results.push(ScoredChunk {
                    text,
                    metadata,
                    score: point.score,
                }),
                Err(e) => tracing::warn!("Skipping point with malformed payload: {e}"),
            }
        }
        Ok(results)
    }

    /// Count points matching the conditions.
    pub async fn count(&self, conditions: Vec<Condition>) -> Result<u64> {
        let filter = Filter {
            must: conditions,
            ..Default::default()
        };
        let response = self
            .client
            .count(
                CountPointsBuilder::new(&self.collection_name)
                    .filter(filter)
                    .exact(true),
            )
            .await
            .map_err(|e| Error::vector_db(format!("Count failed: {e}")))?;

        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }

    /// Delete points matching the conditions; returns how many matched
    /// beforehand.
    pub async fn delete_by_conditions(&self, conditions: Vec<Condition>) -> Result<u64> {
        let matched = self.count(conditions.clone()).await?;
        if matched == 0 {
            return Ok(0);
        }

        let filter = Filter {
            must: conditions,
            ..Default::default()
        };
        self.client
            .delete_points(DeletePointsBuilder::new(&self.collection_name).points(filter))
            .await
            .map_err(|e| Error::vector_db(format!("Delete failed: {e}")))?;

        Ok(matched)
    }

    /// Best-effort removal of all chunks belonging to a manual.
    ///
    /// Matches by the owning record id first, then by product and filename
    /// for points ingested before record ids were stamped on chunks.
    pub async fn delete_chunks_for_manual(
        &self,
        db_id: &Uuid,
        product_name: &str,
        filename: &str,
    ) -> Result<u64> {
        let by_id = vec![Condition::matches("metadata.db_id", db_id.to_string())];
        let deleted = self.delete_by_conditions(by_id).await?;
        if deleted > 0 {
            tracing::info!("Deleted {deleted} points by db_id {db_id}");
            return Ok(deleted);
        }

        let by_name = vec![
            Condition::matches("metadata.product_name", product_name.to_string()),
            Condition::matches("metadata.filename", filename.to_string()),
        ];
        let deleted = self.delete_by_conditions(by_name).await?;
        if deleted > 0 {
            tracing::info!("Deleted {deleted} points by product/filename for '{product_name}'");
        } else {
            tracing::warn!("No points matched manual '{product_name}' ({filename})");
        }
        Ok(deleted)
    }

    /// Whether the Qdrant instance responds.
    pub async fn health_check(&self) -> Result<bool> {
        match self.client.health_check().await {
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }
}

/// Extract chunk text and typed metadata from a point payload.
fn parse_payload(
    payload: &HashMap<String, QdrantValue>,
) -> Result<(String, ChunkMetadata)> {
    let text = payload
        .get("text")
        .and_then(|v| match &v.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        })
        .ok_or_else(|| Error::vector_db("Point payload missing text"))?;

    let metadata_value = payload
        .get("metadata")
        .map(qdrant_value_to_json)
        .ok_or_else(|| Error::vector_db("Point payload missing metadata"))?;

    let metadata: ChunkMetadata = serde_json::from_value(metadata_value)
        .map_err(|e| Error::vector_db(format!("Malformed chunk metadata: {e}")))?;

    Ok((text, metadata))
}

/// Convert a Qdrant payload value into JSON.
fn qdrant_value_to_json(value: &QdrantValue) -> serde_json::Value {
    match &value.kind {
        None | Some(Kind::NullValue(_)) => serde_json::Value::Null,
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(*b),
        Some(Kind::IntegerValue(i)) => serde_json::Value::from(*i),
        Some(Kind::DoubleValue(d)) => {
            serde_json::Number::from_f64(*d).map_or(serde_json::Value::Null, serde_json::Value::Number)
        }
        Some(Kind::StringValue(s)) => serde_json::Value::String(s.clone()),
        Some(Kind::ListValue(list)) => {
            serde_json::Value::Array(list.values.iter().map(qdrant_value_to_json).collect())
        }
        Some(Kind::StructValue(fields)) => serde_json::Value::Object(
            fields
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), qdrant_value_to_json(v)))
                .collect(),
        ),
    }
}
