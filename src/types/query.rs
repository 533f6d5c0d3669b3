//! Query and conversation request types

use serde::{Deserialize, Serialize};

/// Request body for the query endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub query: String,
    /// Company filter, required
    pub company_name: String,
    /// Product filter, required
    pub product_name: String,
    /// Caller-supplied session token; conversation memory and upload
    /// tracking are keyed by it
    #[serde(default)]
    pub user_id: Option<String>,
}

impl QueryRequest {
    /// Session key for this request.
    pub fn session_id(&self) -> &str {
        self.user_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("default_user")
    }
}

/// Role of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One conversation turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_defaults_when_absent_or_blank() {
        let mut request = QueryRequest {
            query: "how do I reset it?".to_string(),
            company_name: "Acme".to_string(),
            product_name: "Widget".to_string(),
            user_id: None,
        };
        assert_eq!(request.session_id(), "default_user");

        request.user_id = Some("  ".to_string());
        assert_eq!(request.session_id(), "default_user");

        request.user_id = Some("alice".to_string());
        assert_eq!(request.session_id(), "alice");
    }

    #[test]
    fn role_serializes_lowercase() {
        let turn = Turn::user("A");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "user");
    }
}
