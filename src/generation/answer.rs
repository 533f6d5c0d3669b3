//! The answer pipeline: retrieve, rerank, prompt, complete, post-process

use std::sync::Arc;

use crate::error::Result;
use crate::providers::{ChatClient, ChatMessage, RerankClient, ScoredChunk};
use crate::retrieval::Retriever;
use crate::session::SessionRegistry;
use crate::types::manual::QueryFilter;
use crate::types::query::{QueryRequest, Role};

use super::prompt::PromptBuilder;
use super::references;

/// Orchestrates one query end to end.
pub struct AnswerPipeline {
    retriever: Retriever,
    reranker: Option<Arc<RerankClient>>,
    chat: Arc<ChatClient>,
    sessions: Arc<SessionRegistry>,
    context_k: usize,
}

impl AnswerPipeline {
    pub fn new(
        retriever: Retriever,
        reranker: Option<Arc<RerankClient>>,
        chat: Arc<ChatClient>,
        sessions: Arc<SessionRegistry>,
        context_k: usize,
    ) -> Self {
        Self {
            retriever,
            reranker,
            chat,
            sessions,
            context_k,
        }
    }

    /// Answer a query: validate the filter, retrieve and rank context,
    /// call the model once, append references, and record the exchange.
    pub async fn answer(&self, request: &QueryRequest) -> Result<String> {
        let filter = QueryFilter::validated(&request.company_name, &request.product_name)?;

        let mut chunks = self.retriever.retrieve(&request.query, &filter).await?;
        tracing::info!(
            "Retrieved {} candidate chunks for company='{}' product='{}'",
            chunks.len(),
            filter.company_name,
            filter.product_name
        );

        chunks = self.rank(&request.query, chunks).await;
        chunks.truncate(self.context_k);

        let context = PromptBuilder::build_context(&chunks);
        tracing::info!("Assembled context of {} characters from {} chunks", context.len(), chunks.len());

        let mut messages = vec![ChatMessage::system(PromptBuilder::system_prompt(&context))];
        for turn in self.sessions.history(request.session_id()) {
            messages.push(match turn.role {
                Role::User => ChatMessage::user(turn.content),
                Role::Assistant => ChatMessage::assistant(turn.content),
            });
        }
        messages.push(ChatMessage::user(&request.query));
        tracing::info!("Submitting {} messages to the chat model", messages.len());

        let raw = self.chat.complete(&messages).await?;

        let sources = references::collect_sources(&chunks);
        let answer = references::append_references(&raw, &sources);

        self.sessions
            .append_exchange(request.session_id(), &request.query, &answer);

        Ok(answer)
    }

    /// Rerank the candidate set when a reranker is configured; any failure
    /// keeps the similarity-ranked order.
    async fn rank(&self, query: &str, chunks: Vec<ScoredChunk>) -> Vec<ScoredChunk> {
        let Some(ref reranker) = self.reranker else {
            return chunks;
        };

        let passages: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        match reranker.rerank(query, &passages).await {
            Ok(order) if !order.is_empty() => {
                tracing::info!("Reranking kept {} of {} chunks", order.len(), chunks.len());
                order.into_iter().filter_map(|i| chunks.get(i).cloned()).collect()
            }
            Ok(_) => chunks,
            Err(e) => {
                tracing::warn!("Reranking failed, keeping similarity order: {e}");
                chunks
            }
        }
    }
}
