//! Chat completion client for an OpenAI-compatible hosted endpoint

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

/// One message in a chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ModelsResponse {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

/// Chat completion client with status-based failure classification.
///
/// A 404 from the endpoint is enriched with the currently available model
/// identifiers to aid diagnosis; 401 and 403 map to distinct errors. No
/// request is retried automatically.
pub struct ChatClient {
    client: Client,
    config: LlmConfig,
}

impl ChatClient {
    /// Create a new chat client.
    pub fn new(config: &LlmConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            config: config.clone(),
        }
    }

    /// The configured chat model identifier.
    pub fn model(&self) -> &str {
        &self.config.chat_model
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.api_key {
            Some(ref key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Submit one chat completion call with the configured sampling
    /// parameters and return the assistant text.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let request = CompletionRequest {
            model: &self.config.chat_model,
            messages,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .authorized(self.client.post(&url).json(&request))
            .send()
            .await
            .map_err(|e| Error::llm(format!("Chat completion request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.classify_failure(status, body).await);
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("Failed to parse completion response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::llm("Completion response contained no choices"))
    }

    /// Map an upstream failure status to the error taxonomy.
    async fn classify_failure(&self, status: StatusCode, body: String) -> Error {
        match status {
            StatusCode::NOT_FOUND => {
                let available = self.list_models().await.unwrap_or_default();
                Error::ModelNotFound {
                    model: self.config.chat_model.clone(),
                    available,
                }
            }
            StatusCode::UNAUTHORIZED => Error::Unauthorized(
                "Chat API authentication failed. Check the configured API key.".to_string(),
            ),
            StatusCode::FORBIDDEN => Error::Forbidden(
                "Access denied by the chat API. Check account permissions.".to_string(),
            ),
            _ => Error::llm(format!("Chat API error: HTTP {status} - {body}")),
        }
    }

    /// List the model identifiers currently offered by the endpoint.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/models", self.config.base_url);
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| Error::llm(format!("Model listing failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::llm(format!(
                "Model listing failed: HTTP {}",
                response.status()
            )));
        }

        let parsed: ModelsResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("Failed to parse model list: {e}")))?;

        Ok(parsed.data.into_iter().map(|m| m.id).collect())
    }

    /// Probe the endpoint with a minimal one-token completion.
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let probe_messages = [ChatMessage::user("Test")];
        let probe = CompletionRequest {
            model: &self.config.chat_model,
            messages: &probe_messages,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            max_tokens: 1,
        };

        match self.authorized(self.client.post(&url).json(&probe)).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors_set_roles() {
        assert_eq!(ChatMessage::system("s").role, "system");
        assert_eq!(ChatMessage::user("u").role, "user");
        assert_eq!(ChatMessage::assistant("a").role, "assistant");
    }
}
