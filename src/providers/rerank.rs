//! Reranking client for a hosted relevance-scoring model

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{LlmConfig, RerankConfig};
use crate::error::{Error, Result};

#[derive(Serialize)]
struct RankingRequest<'a> {
    model: &'a str,
    query: RankingText<'a>,
    passages: Vec<RankingText<'a>>,
}

#[derive(Serialize)]
struct RankingText<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct RankingResponse {
    rankings: Vec<Ranking>,
}

#[derive(Deserialize)]
struct Ranking {
    index: usize,
    #[allow(dead_code)]
    logit: f32,
}

/// Client for a NIM-style `/ranking` endpoint.
///
/// Submits the query plus candidate passages and returns candidate indices
/// in relevance order. The answer pipeline treats any failure here as
/// non-fatal and keeps the similarity-ranked order.
pub struct RerankClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    top_n: usize,
}

impl RerankClient {
    /// Create a rerank client when a model is configured.
    pub fn from_config(llm: &LlmConfig, rerank: &RerankConfig) -> Option<Self> {
        let model = rerank.model.clone()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(llm.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Some(Self {
            client,
            base_url: llm.base_url.clone(),
            api_key: llm.api_key.clone(),
            model,
            top_n: rerank.top_n,
        })
    }

    /// The rerank model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Candidates kept after a reranking pass.
    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Rank passages against the query; returns passage indices ordered
    /// most relevant first, truncated to `top_n`.
    pub async fn rerank(&self, query: &str, passages: &[String]) -> Result<Vec<usize>> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/ranking", self.base_url);
        let request = RankingRequest {
            model: &self.model,
            query: RankingText { text: query },
            passages: passages.iter().map(|p| RankingText { text: p }).collect(),
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::llm(format!("Rerank request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::llm(format!("Rerank failed: HTTP {status} - {body}")));
        }

        let parsed: RankingResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("Failed to parse rerank response: {e}")))?;

        let mut order: Vec<usize> = parsed
            .rankings
            .into_iter()
            .map(|r| r.index)
            .filter(|i| *i < passages.len())
            .collect();
        order.truncate(self.top_n);
        Ok(order)
    }

    /// Whether the ranking endpoint responds.
    pub async fn health_check(&self) -> Result<bool> {
        match self.rerank("health probe", &["probe passage".to_string()]).await {
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LlmConfig, RerankConfig};

    #[test]
    fn disabled_without_model() {
        let rerank = RerankConfig::default();
        assert!(RerankClient::from_config(&LlmConfig::default(), &rerank).is_none());
    }

    #[test]
    fn enabled_with_model() {
        let rerank = RerankConfig {
            model: Some("nvidia/rerank-qa-mistral-4b".to_string()),
            top_n: 8,
        };
        let client = RerankClient::from_config(&LlmConfig::default(), &rerank).unwrap();
        assert_eq!(client.top_n(), 8);
    }
}
