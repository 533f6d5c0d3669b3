//! Shared application state

use std::sync::Arc;

use crate::auth::routes::provision_default_admin;
use crate::config::Config;
use crate::error::Result;
use crate::generation::AnswerPipeline;
use crate::ingestion::IngestPipeline;
use crate::providers::{
    blob_store, BlobStore, ChatClient, EmbeddingProvider, NimEmbeddings, QdrantStore, RerankClient,
};
use crate::reconcile::ReconcileQueue;
use crate::retrieval::Retriever;
use crate::session::SessionRegistry;
use crate::storage::MetadataDb;

/// Shared application state, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    db: Arc<MetadataDb>,
    vector_store: Arc<QdrantStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    chat: Arc<ChatClient>,
    reranker: Option<Arc<RerankClient>>,
    sessions: Arc<SessionRegistry>,
    reconcile: Arc<ReconcileQueue>,
    ingest: IngestPipeline,
    answer: AnswerPipeline,
}

impl AppState {
    /// Wire up every provider and pipeline from configuration.
    pub fn new(config: Config) -> Result<Self> {
        let db = Arc::new(MetadataDb::new(&config.metadata_db.path)?);
        tracing::info!("Metadata database ready at {}", config.metadata_db.path.display());

        let vector_store = Arc::new(QdrantStore::new(
            &config.vector_db,
            config.embeddings.dimensions,
        )?);
        tracing::info!("Vector store client ready ({})", config.vector_db.url);

        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::new(NimEmbeddings::new(&config.llm, &config.embeddings));
        let chat = Arc::new(ChatClient::new(&config.llm));
        tracing::info!(
            "Model endpoint ready (embeddings: {}, chat: {})",
            config.embeddings.model,
            config.llm.chat_model
        );

        let reranker = RerankClient::from_config(&config.llm, &config.rerank).map(Arc::new);
        match reranker {
            Some(ref r) => tracing::info!("Reranker enabled with model: {}", r.model()),
            None => tracing::warn!("RERANK_MODEL not set, reranking disabled"),
        }

        let blobs: Arc<dyn BlobStore> = Arc::from(blob_store::from_config(&config.blob_store));
        tracing::info!("Blob store ready ({})", blobs.name());

        let sessions = Arc::new(SessionRegistry::new());
        let reconcile = Arc::new(ReconcileQueue::new());

        let ingest = IngestPipeline::new(
            &config,
            Arc::clone(&embedder),
            Arc::clone(&vector_store),
            Arc::clone(&blobs),
            Arc::clone(&db),
            Arc::clone(&reconcile),
        );

        let retriever = Retriever::new(
            Arc::clone(&embedder),
            Arc::clone(&vector_store),
            config.retrieval.fetch_k,
            config.retrieval.fallback,
        );
        let answer = AnswerPipeline::new(
            retriever,
            reranker.clone(),
            Arc::clone(&chat),
            Arc::clone(&sessions),
            config.retrieval.context_k,
        );

        provision_default_admin(&db, &config.auth)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                vector_store,
                embedder,
                chat,
                reranker,
                sessions,
                reconcile,
                ingest,
                answer,
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn db(&self) -> &Arc<MetadataDb> {
        &self.inner.db
    }

    pub fn vector_store(&self) -> &Arc<QdrantStore> {
        &self.inner.vector_store
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedder
    }

    pub fn chat(&self) -> &Arc<ChatClient> {
        &self.inner.chat
    }

    pub fn reranker(&self) -> Option<&Arc<RerankClient>> {
        self.inner.reranker.as_ref()
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.inner.sessions
    }

    pub fn reconcile(&self) -> &Arc<ReconcileQueue> {
        &self.inner.reconcile
    }

    pub fn ingest(&self) -> &IngestPipeline {
        &self.inner.ingest
    }

    pub fn answer(&self) -> &AnswerPipeline {
        &self.inner.answer
    }
}
