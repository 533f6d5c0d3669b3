//! Route handlers

pub mod admin;
pub mod companies;
pub mod query;
pub mod upload;

use serde::Deserialize;

/// Optional session token accepted by session-scoped GET endpoints.
#[derive(Debug, Deserialize)]
pub struct SessionParams {
    #[serde(default)]
    pub user_id: Option<String>,
}

impl SessionParams {
    /// Session key for this request.
    pub fn session_id(&self) -> &str {
        self.user_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("default_user")
    }
}
