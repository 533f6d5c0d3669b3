//! Manual records, chunk metadata, and the query filter

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// One uploaded manual, as stored in the metadata database.
///
/// The metadata store is the source of truth for a manual's existence; the
/// blob and vector entries are dependent artifacts kept consistent
/// best-effort. Records are never updated in place except to backfill the
/// QR fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualRecord {
    /// Store-assigned identifier, immutable
    pub id: Uuid,
    /// Owning company
    pub company_name: String,
    /// Product the manual documents
    pub product_name: String,
    /// Legacy product identifier; kept alongside product_name
    pub product_code: Option<String>,
    /// Original upload filename
    pub filename: String,
    /// Durable blob location of the PDF
    pub storage_uri: String,
    /// Opaque handle used to delete the blob
    pub storage_public_id: String,
    /// QR code image location, backfilled when present
    pub qr_uri: Option<String>,
    /// QR code deletion handle
    pub qr_public_id: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl ManualRecord {
    /// Create a record for a fresh upload.
    pub fn new(
        company_name: impl Into<String>,
        product_name: impl Into<String>,
        product_code: Option<String>,
        filename: impl Into<String>,
        storage_uri: impl Into<String>,
        storage_public_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_name: company_name.into(),
            product_name: product_name.into(),
            product_code,
            filename: filename.into(),
            storage_uri: storage_uri.into(),
            storage_public_id: storage_public_id.into(),
            qr_uri: None,
            qr_public_id: None,
            created_at: Utc::now(),
        }
    }

    /// The product identifier: `product_name` first, legacy `product_code`
    /// when the name is blank.
    pub fn product(&self) -> &str {
        if !self.product_name.trim().is_empty() {
            &self.product_name
        } else {
            self.product_code.as_deref().unwrap_or("")
        }
    }
}

/// Resolve the product identifier from the upload form fields.
///
/// `product_name` wins; the legacy `product_code` field is accepted as a
/// fallback. Rejects the upload when both are absent or blank.
pub fn resolve_product(
    product_name: Option<&str>,
    product_code: Option<&str>,
) -> Result<String> {
    product_name
        .filter(|s| !s.trim().is_empty())
        .or(product_code.filter(|s| !s.trim().is_empty()))
        .map(|s| s.to_string())
        .ok_or_else(|| Error::validation("product_name or product_code is required"))
}

/// Typed metadata attached to every chunk stored in the vector database.
///
/// Serialized as the nested `metadata` payload object; filter keys are
/// `metadata.company_name`, `metadata.product_name`, `metadata.db_id`,
/// `metadata.filename`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub company_name: String,
    pub product_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
    pub filename: String,
    /// Owning ManualRecord id
    pub db_id: Uuid,
    /// Blob storage URI of the source PDF
    pub source: String,
    /// Zero-based page index
    pub page: u32,
    /// Human-readable page label ("1"-based)
    pub page_label: String,
    pub total_pages: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mod_date: Option<String>,
}

/// A chunk of manual text: the unit embedded, stored, and retrieved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Chunk text, at most chunk_size characters
    pub text: String,
    /// Embedding vector; empty until the embedding pass
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
    /// Chunk metadata
    pub metadata: ChunkMetadata,
    /// Set when the embedding is a zero-vector fallback; degraded chunks
    /// are excluded from search until re-embedded
    #[serde(default)]
    pub degraded: bool,
}

impl DocumentChunk {
    /// Create an un-embedded chunk.
    pub fn new(text: String, metadata: ChunkMetadata) -> Self {
        Self {
            text,
            embedding: Vec::new(),
            metadata,
            degraded: false,
        }
    }
}

/// Equality filter scoping a similarity search to one company/product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub company_name: String,
    pub product_name: String,
}

impl QueryFilter {
    /// Validate that both fields are present and non-blank.
    ///
    /// The hardened pipeline never searches unfiltered from user input, to
    /// prevent cross-tenant context leakage.
    pub fn validated(company_name: &str, product_name: &str) -> Result<Self> {
        if company_name.trim().is_empty() || product_name.trim().is_empty() {
            return Err(Error::MissingFilter);
        }
        Ok(Self {
            company_name: company_name.to_string(),
            product_name: product_name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_precedence_prefers_name() {
        let mut record = ManualRecord::new(
            "Acme",
            "Widget",
            Some("WX-100".to_string()),
            "widget.pdf",
            "https://blobs/widget.pdf",
            "acme_widget",
        );
        assert_eq!(record.product(), "Widget");

        record.product_name = String::new();
        assert_eq!(record.product(), "WX-100");
    }

    #[test]
    fn resolve_product_falls_back_to_code() {
        assert_eq!(resolve_product(Some("Widget"), None).unwrap(), "Widget");
        assert_eq!(resolve_product(None, Some("WX-100")).unwrap(), "WX-100");
        assert_eq!(resolve_product(Some("  "), Some("WX-100")).unwrap(), "WX-100");
        assert!(resolve_product(None, None).is_err());
    }

    #[test]
    fn filter_rejects_blank_fields() {
        assert!(QueryFilter::validated("Acme", "Widget").is_ok());
        assert!(matches!(
            QueryFilter::validated("", "Widget"),
            Err(Error::MissingFilter)
        ));
        assert!(matches!(
            QueryFilter::validated("Acme", "   "),
            Err(Error::MissingFilter)
        ));
    }
}
