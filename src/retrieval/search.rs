//! Filtered vector search and the cascading-fallback state machine

use qdrant_client::qdrant::Condition;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, QdrantStore, ScoredChunk};
use crate::types::manual::QueryFilter;

/// How far the metadata filter may relax when a search stage comes back
/// empty.
///
/// The ladder is `strict → company-only → unfiltered → fail`, truncated at
/// the configured breadth. `Strict` is the hardened default: an empty
/// strict match fails immediately rather than risking cross-tenant context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchFallback {
    #[default]
    Strict,
    Company,
    Unfiltered,
}

impl FromStr for SearchFallback {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "company" => Ok(Self::Company),
            "unfiltered" => Ok(Self::Unfiltered),
            other => Err(Error::Config(format!(
                "Invalid SEARCH_FALLBACK '{other}' (expected strict, company, or unfiltered)"
            ))),
        }
    }
}

impl SearchFallback {
    /// Filter conditions for each stage, strictest first.
    fn ladder(&self, filter: &QueryFilter) -> Vec<Vec<Condition>> {
        let strict = vec![
            Condition::matches("metadata.company_name", filter.company_name.clone()),
            Condition::matches("metadata.product_name", filter.product_name.clone()),
        ];
        let company_only = vec![Condition::matches(
            "metadata.company_name",
            filter.company_name.clone(),
        )];

        match self {
            Self::Strict => vec![strict],
            Self::Company => vec![strict, company_only],
            Self::Unfiltered => vec![strict, company_only, Vec::new()],
        }
    }

    /// Number of search stages this breadth allows.
    pub fn stages(&self) -> usize {
        match self {
            Self::Strict => 1,
            Self::Company => 2,
            Self::Unfiltered => 3,
        }
    }
}

/// Retrieval front end: embeds the query and walks the fallback ladder.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<QdrantStore>,
    fetch_k: usize,
    fallback: SearchFallback,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<QdrantStore>,
        fetch_k: usize,
        fallback: SearchFallback,
    ) -> Self {
        Self {
            embedder,
            vector_store,
            fetch_k,
            fallback,
        }
    }

    /// Retrieve candidate chunks for a validated filter.
    ///
    /// Over-fetches `fetch_k` candidates to leave room for reranking.
    /// An empty final stage is terminal: `NoContextFound`, with no LLM
    /// call ever made.
    pub async fn retrieve(&self, query: &str, filter: &QueryFilter) -> Result<Vec<ScoredChunk>> {
        let embedding = self.embedder.embed_query(query).await?;

        let ladder = self.fallback.ladder(filter);
        let stages = ladder.len();
        for (stage, conditions) in ladder.into_iter().enumerate() {
            let scoped = !conditions.is_empty();
            let results = self
                .vector_store
                .search(embedding.clone(), conditions, self.fetch_k)
                .await?;

            if !results.is_empty() {
                if stage > 0 {
                    tracing::warn!(
                        "Strict filter empty for company='{}' product='{}'; stage {} matched {} chunks",
                        filter.company_name,
                        filter.product_name,
                        stage + 1,
                        results.len()
                    );
                }
                return Ok(results);
            }

            tracing::info!(
                "Search stage {}/{} ({}) returned no candidates",
                stage + 1,
                stages,
                if scoped { "filtered" } else { "unfiltered" }
            );
        }

        tracing::warn!(
            "No context found for company='{}' product='{}'",
            filter.company_name,
            filter.product_name
        );
        Err(Error::NoContextFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> QueryFilter {
        QueryFilter {
            company_name: "Acme".to_string(),
            product_name: "Widget".to_string(),
        }
    }

    #[test]
    fn fallback_parses_from_config_strings() {
        assert_eq!("strict".parse::<SearchFallback>().unwrap(), SearchFallback::Strict);
        assert_eq!("Company".parse::<SearchFallback>().unwrap(), SearchFallback::Company);
        assert_eq!(
            " unfiltered ".parse::<SearchFallback>().unwrap(),
            SearchFallback::Unfiltered
        );
        assert!("broad".parse::<SearchFallback>().is_err());
    }

    #[test]
    fn ladder_depth_matches_breadth() {
        let f = filter();
        assert_eq!(SearchFallback::Strict.ladder(&f).len(), 1);
        assert_eq!(SearchFallback::Company.ladder(&f).len(), 2);
        assert_eq!(SearchFallback::Unfiltered.ladder(&f).len(), 3);
    }

    #[test]
    fn strict_stage_matches_both_fields() {
        let ladder = SearchFallback::Unfiltered.ladder(&filter());
        assert_eq!(ladder[0].len(), 2);
        assert_eq!(ladder[1].len(), 1);
        assert!(ladder[2].is_empty());
    }
}
