//! Reconciliation queue for drift between the metadata store and the
//! vector store
//!
//! Ingestion and deletion never block on a vector-store hiccup: the
//! metadata record stays authoritative and the failed portion of the work
//! is recorded here as a retryable item. Operators can inspect the queue
//! and trigger a retry pass.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::providers::nim::is_null_embedding;
use crate::providers::{EmbeddingProvider, QdrantStore};
use crate::types::manual::DocumentChunk;
use qdrant_client::qdrant::Condition;

/// Work a reconciliation pass can retry.
#[derive(Debug, Clone)]
pub enum ReconcileTask {
    /// Chunks whose embedding or upsert failed; retried by re-embedding
    /// and upserting, then dropping any degraded points left behind.
    ReembedChunks {
        db_id: Uuid,
        chunks: Vec<DocumentChunk>,
    },
    /// A best-effort vector deletion that failed when its manual was
    /// removed.
    PurgeVectors {
        db_id: Uuid,
        product_name: String,
        filename: String,
    },
}

/// One queued work item.
#[derive(Debug, Clone)]
pub struct ReconcileItem {
    pub id: Uuid,
    pub task: ReconcileTask,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Serializable queue entry for the admin surface.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileItemView {
    pub id: Uuid,
    pub task: &'static str,
    pub db_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_count: Option<usize>,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a reconciliation pass.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// In-memory queue of pending reconciliation work.
#[derive(Default)]
pub struct ReconcileQueue {
    items: DashMap<Uuid, ReconcileItem>,
}

impl ReconcileQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a re-embed for chunks that failed to land in the vector store
    /// or landed degraded.
    pub fn enqueue_reembed(&self, db_id: Uuid, chunks: Vec<DocumentChunk>, error: impl Into<String>) {
        if chunks.is_empty() {
            return;
        }
        let item = ReconcileItem {
            id: Uuid::new_v4(),
            task: ReconcileTask::ReembedChunks { db_id, chunks },
            attempts: 0,
            last_error: Some(error.into()),
            created_at: Utc::now(),
        };
        tracing::warn!("Queued re-embed item {} for manual {db_id}", item.id);
        self.items.insert(item.id, item);
    }

    /// Queue a vector purge for a deleted manual.
    pub fn enqueue_purge(
        &self,
        db_id: Uuid,
        product_name: impl Into<String>,
        filename: impl Into<String>,
        error: impl Into<String>,
    ) {
        let item = ReconcileItem {
            id: Uuid::new_v4(),
            task: ReconcileTask::PurgeVectors {
                db_id,
                product_name: product_name.into(),
                filename: filename.into(),
            },
            attempts: 0,
            last_error: Some(error.into()),
            created_at: Utc::now(),
        };
        tracing::warn!("Queued vector purge item {} for manual {db_id}", item.id);
        self.items.insert(item.id, item);
    }

    /// Pending items, oldest first.
    pub fn snapshot(&self) -> Vec<ReconcileItemView> {
        let mut views: Vec<ReconcileItemView> = self
            .items
            .iter()
            .map(|entry| {
                let item = entry.value();
                let (task, db_id, chunk_count) = match &item.task {
                    ReconcileTask::ReembedChunks { db_id, chunks } => {
                        ("reembed_chunks", *db_id, Some(chunks.len()))
                    }
                    ReconcileTask::PurgeVectors { db_id, .. } => ("purge_vectors", *db_id, None),
                };
                ReconcileItemView {
                    id: item.id,
                    task,
                    db_id,
                    chunk_count,
                    attempts: item.attempts,
                    last_error: item.last_error.clone(),
                    created_at: item.created_at,
                }
            })
            .collect();
        views.sort_by_key(|v| v.created_at);
        views
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Retry every pending item once. Successful items leave the queue;
    /// failures stay with a bumped attempt count and the latest error.
    pub async fn run(
        &self,
        embedder: &Arc<dyn EmbeddingProvider>,
        vector_store: &Arc<QdrantStore>,
    ) -> ReconcileReport {
        let ids: Vec<Uuid> = self.items.iter().map(|e| *e.key()).collect();
        let mut report = ReconcileReport {
            processed: 0,
            succeeded: 0,
            failed: 0,
        };

        for id in ids {
            let Some(item) = self.items.get(&id).map(|e| e.value().clone()) else {
                continue;
            };
            report.processed += 1;

            let outcome = match &item.task {
                ReconcileTask::ReembedChunks { db_id, chunks } => {
                    Self::retry_reembed(embedder, vector_store, *db_id, chunks).await
                }
                ReconcileTask::PurgeVectors {
                    db_id,
                    product_name,
                    filename,
                } => vector_store
                    .delete_chunks_for_manual(db_id, product_name, filename)
                    .await
                    .map(|_| ()),
            };

            match outcome {
                Ok(()) => {
                    self.items.remove(&id);
                    report.succeeded += 1;
                    tracing::info!("Reconciliation item {id} completed");
                }
                Err(e) => {
                    if let Some(mut entry) = self.items.get_mut(&id) {
                        entry.attempts += 1;
                        entry.last_error = Some(e.to_string());
                    }
                    report.failed += 1;
                    tracing::warn!("Reconciliation item {id} failed again: {e}");
                }
            }
        }

        report
    }

    async fn retry_reembed(
        embedder: &Arc<dyn EmbeddingProvider>,
        vector_store: &Arc<QdrantStore>,
        db_id: Uuid,
        chunks: &[DocumentChunk],
    ) -> crate::error::Result<()> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_documents(&texts).await?;

        let mut embedded = Vec::with_capacity(chunks.len());
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            if is_null_embedding(&embedding) {
                return Err(crate::error::Error::embedding(
                    "Re-embed still produced a null vector",
                ));
            }
            let mut chunk = chunk.clone();
            chunk.embedding = embedding;
            chunk.degraded = false;
            embedded.push(chunk);
        }

        vector_store.ensure_collection().await?;
        vector_store.upsert_chunks(&embedded).await?;

        // Drop the degraded placeholders now that healthy points exist.
        vector_store
            .delete_by_conditions(vec![
                Condition::matches("metadata.db_id", db_id.to_string()),
                Condition::matches("degraded", true),
            ])
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::manual::ChunkMetadata;

    fn chunk(db_id: Uuid) -> DocumentChunk {
        DocumentChunk::new(
            "Hold the reset button for five seconds.".to_string(),
            ChunkMetadata {
                company_name: "Acme".to_string(),
                product_name: "Widget".to_string(),
                product_code: None,
                filename: "widget.pdf".to_string(),
                db_id,
                source: "https://blobs/widget.pdf".to_string(),
                page: 0,
                page_label: "1".to_string(),
                total_pages: 3,
                producer: None,
                creator: None,
                creation_date: None,
                mod_date: None,
            },
        )
    }

    #[test]
    fn queue_records_and_lists_items() {
        let queue = ReconcileQueue::new();
        assert!(queue.is_empty());

        let db_id = Uuid::new_v4();
        queue.enqueue_reembed(db_id, vec![chunk(db_id)], "upsert failed: HTTP 503");
        queue.enqueue_purge(db_id, "Widget", "widget.pdf", "delete failed: timeout");

        assert_eq!(queue.len(), 2);
        let views = queue.snapshot();
        assert_eq!(views.len(), 2);
        assert!(views.iter().any(|v| v.task == "reembed_chunks" && v.chunk_count == Some(1)));
        assert!(views.iter().any(|v| v.task == "purge_vectors"));
        assert!(views.iter().all(|v| v.db_id == db_id && v.attempts == 0));
    }

    #[test]
    fn empty_reembed_is_not_queued() {
        let queue = ReconcileQueue::new();
        queue.enqueue_reembed(Uuid::new_v4(), Vec::new(), "nothing");
        assert!(queue.is_empty());
    }
}
