//! Ingestion pipeline: stage, upload, record, parse, chunk, embed, upsert

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::providers::nim::is_null_embedding;
use crate::providers::{BlobStore, EmbeddingProvider, QdrantStore};
use crate::reconcile::ReconcileQueue;
use crate::storage::MetadataDb;
use crate::types::manual::{ChunkMetadata, DocumentChunk, ManualRecord};

use super::chunker::TextChunker;
use super::parser::PdfParser;

/// A manual that finished the per-file stages (blob upload, record insert,
/// parse, chunk) and is awaiting the vector upsert pass.
pub struct PreparedManual {
    pub record: ManualRecord,
    pub chunks: Vec<DocumentChunk>,
}

/// Result of a complete single-file ingestion.
pub struct IngestOutcome {
    pub record: ManualRecord,
    pub chunk_count: usize,
    pub chunks_stored: usize,
}

/// Orchestrates manual ingestion across the blob store, metadata store,
/// embedding endpoint, and vector store.
///
/// The metadata record is authoritative: once it exists, later failures
/// (embedding, vector upsert) degrade to reconciliation work instead of
/// aborting the upload.
pub struct IngestPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<QdrantStore>,
    blob_store: Arc<dyn BlobStore>,
    db: Arc<MetadataDb>,
    reconcile: Arc<ReconcileQueue>,
    chunker: TextChunker,
    upsert_batch_size: usize,
}

impl IngestPipeline {
    pub fn new(
        config: &Config,
        embedder: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<QdrantStore>,
        blob_store: Arc<dyn BlobStore>,
        db: Arc<MetadataDb>,
        reconcile: Arc<ReconcileQueue>,
    ) -> Self {
        Self {
            embedder,
            vector_store,
            blob_store,
            db,
            reconcile,
            chunker: TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap),
            upsert_batch_size: config.vector_db.upsert_batch_size,
        }
    }

    /// Ingest one manual end to end.
    pub async fn ingest(
        &self,
        filename: &str,
        data: &[u8],
        company_name: &str,
        product_name: &str,
        product_code: Option<&str>,
    ) -> Result<IngestOutcome> {
        let prepared = self
            .prepare(filename, data, company_name, product_name, product_code)
            .await?;
        let chunk_count = prepared.chunks.len();
        let chunks_stored = self.store_chunks(prepared.chunks).await;

        Ok(IngestOutcome {
            record: prepared.record,
            chunk_count,
            chunks_stored,
        })
    }

    /// Run the per-file stages: staging, blob upload, record insert, parse,
    /// chunk. The vector upsert pass is separate so batch uploads can
    /// combine it across files.
    pub async fn prepare(
        &self,
        filename: &str,
        data: &[u8],
        company_name: &str,
        product_name: &str,
        product_code: Option<&str>,
    ) -> Result<PreparedManual> {
        // Stage to a temp file; parsing and upload both want filesystem
        // access, and the file must be gone on every exit path.
        let mut staged = tempfile::NamedTempFile::new()
            .map_err(|e| Error::internal(format!("Failed to stage upload: {e}")))?;
        staged
            .write_all(data)
            .map_err(|e| Error::internal(format!("Failed to stage upload: {e}")))?;

        let public_id = format!("pdf_manuals/{company_name}_{product_name}_{filename}");
        let blob = self.blob_store.store(&public_id, data).await?;
        tracing::info!("Uploaded '{filename}' to blob storage: {}", blob.uri);

        let record = ManualRecord::new(
            company_name,
            product_name,
            product_code.map(|s| s.to_string()),
            filename,
            blob.uri.clone(),
            blob.public_id.clone(),
        );
        if let Err(e) = self.db.insert_manual(&record) {
            // The blob stays behind; the metadata store defines existence,
            // so there is nothing to roll back to.
            tracing::error!("Metadata insert failed for '{filename}', blob {} orphaned: {e}", blob.public_id);
            return Err(e);
        }

        let staged_bytes = std::fs::read(staged.path())
            .map_err(|e| Error::internal(format!("Failed to read staged upload: {e}")))?;
        let parsed = PdfParser::parse(filename, &staged_bytes)?;
        tracing::info!(
            "Parsed '{filename}': {} pages ({} with text)",
            parsed.total_pages,
            parsed.pages.iter().filter(|p| !p.content.is_empty()).count()
        );

        let mut chunks = Vec::new();
        for page in &parsed.pages {
            for text in self.chunker.split(&page.content) {
                let metadata = ChunkMetadata {
                    company_name: record.company_name.clone(),
                    product_name: record.product_name.clone(),
                    product_code: record.product_code.clone(),
                    filename: record.filename.clone(),
                    db_id: record.id,
                    source: record.storage_uri.clone(),
                    page: page.page,
                    page_label: page.label.clone(),
                    total_pages: parsed.total_pages,
                    producer: parsed.info.producer.clone(),
                    creator: parsed.info.creator.clone(),
                    creation_date: parsed.info.creation_date.clone(),
                    mod_date: parsed.info.mod_date.clone(),
                };
                chunks.push(DocumentChunk::new(text, metadata));
            }
        }
        tracing::info!("Chunked '{filename}' into {} chunks", chunks.len());

        Ok(PreparedManual { record, chunks })
    }

    /// Embed and upsert chunks in fixed-size batches, sequentially.
    ///
    /// A batch that fails is skipped and queued for reconciliation; the
    /// upload as a whole still counts as successful. The chunks may span
    /// several manuals (the batch-upload variant runs one combined pass);
    /// reconciliation items are grouped per manual. Returns the number of
    /// chunks actually stored.
    pub async fn store_chunks(&self, chunks: Vec<DocumentChunk>) -> usize {
        if chunks.is_empty() {
            return 0;
        }

        if let Err(e) = self.vector_store.ensure_collection().await {
            tracing::error!("Vector collection unavailable, queueing all chunks: {e}");
            self.enqueue_by_manual(chunks, &e.to_string());
            return 0;
        }

        let total = chunks.len();
        tracing::info!(
            "Processing {total} chunks in batches of {}",
            self.upsert_batch_size
        );
        let mut stored = 0usize;

        for (batch_index, batch) in chunks.chunks(self.upsert_batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embeddings = match self.embedder.embed_documents(&texts).await {
                Ok(embeddings) => embeddings,
                Err(e) => {
                    tracing::warn!("Embedding batch {} failed, skipping: {e}", batch_index + 1);
                    self.enqueue_by_manual(batch.to_vec(), &e.to_string());
                    continue;
                }
            };

            let mut embedded = Vec::with_capacity(batch.len());
            let mut degraded = Vec::new();
            for (chunk, embedding) in batch.iter().zip(embeddings) {
                let mut chunk = chunk.clone();
                chunk.degraded = is_null_embedding(&embedding);
                chunk.embedding = embedding;
                if chunk.degraded {
                    degraded.push(chunk.clone());
                }
                embedded.push(chunk);
            }

            // Degraded chunks are stored (flagged, excluded from search)
            // and queued for a re-embed.
            if !degraded.is_empty() {
                tracing::warn!(
                    "{} chunks in batch {} received null embeddings",
                    degraded.len(),
                    batch_index + 1
                );
                self.enqueue_by_manual(degraded, "null embedding fallback");
            }

            match self.vector_store.upsert_chunks(&embedded).await {
                Ok(count) => {
                    stored += count;
                    tracing::info!("Upserted batch {}: {count} chunks", batch_index + 1);
                }
                Err(e) => {
                    tracing::warn!("Upsert batch {} failed, skipping: {e}", batch_index + 1);
                    self.enqueue_by_manual(batch.to_vec(), &e.to_string());
                }
            }
        }

        if stored < total {
            tracing::warn!(
                "Stored {stored}/{total} chunks; remainder queued for reconciliation"
            );
        }
        stored
    }

    /// Queue failed chunks for reconciliation, one item per owning manual.
    fn enqueue_by_manual(&self, chunks: Vec<DocumentChunk>, error: &str) {
        let mut groups: HashMap<Uuid, Vec<DocumentChunk>> = HashMap::new();
        for chunk in chunks {
            groups.entry(chunk.metadata.db_id).or_default().push(chunk);
        }
        for (db_id, group) in groups {
            self.reconcile.enqueue_reembed(db_id, group, error);
        }
    }

    /// Delete a manual across the three stores. The metadata row is
    /// authoritative; blob and vector deletions are best-effort.
    pub async fn delete_manual(
        &self,
        record: &ManualRecord,
    ) -> Result<(bool, bool, bool)> {
        let metadata_deleted = self.db.delete_manual(&record.id)?;
        if !metadata_deleted {
            return Err(Error::ManualNotFound(record.product_name.clone()));
        }

        let blob_deleted = match self.blob_store.delete(&record.storage_public_id).await {
            Ok(deleted) => deleted,
            Err(e) => {
                tracing::warn!("Blob deletion failed for {}: {e}", record.storage_public_id);
                false
            }
        };
        if let Some(ref qr_public_id) = record.qr_public_id {
            if let Err(e) = self.blob_store.delete(qr_public_id).await {
                tracing::warn!("QR blob deletion failed for {qr_public_id}: {e}");
            }
        }

        let vectors_deleted = match self
            .vector_store
            .delete_chunks_for_manual(&record.id, &record.product_name, &record.filename)
            .await
        {
            Ok(count) => count > 0,
            Err(e) => {
                tracing::warn!("Vector deletion failed for manual {}: {e}", record.id);
                self.reconcile.enqueue_purge(
                    record.id,
                    record.product_name.clone(),
                    record.filename.clone(),
                    e.to_string(),
                );
                false
            }
        };

        Ok((metadata_deleted, blob_deleted, vectors_deleted))
    }
}

/// Sanity bound applied to uploaded files before staging.
pub fn validate_upload(filename: &str, data: &[u8]) -> Result<()> {
    if data.is_empty() {
        return Err(Error::validation(format!("File '{filename}' is empty")));
    }
    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(Error::validation(format!(
            "File '{filename}' is not a PDF; only PDF manuals are supported"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_validation() {
        assert!(validate_upload("manual.pdf", b"%PDF-1.4").is_ok());
        assert!(validate_upload("Manual.PDF", b"%PDF-1.4").is_ok());
        assert!(validate_upload("manual.docx", b"PK").is_err());
        assert!(validate_upload("manual.pdf", b"").is_err());
    }
}
