//! Session-scoped state: conversation memory and upload tracking
//!
//! Each caller-supplied session token maps to its own session object, so
//! concurrent callers no longer interleave through shared module state.
//! Sessions are in-memory only and unbounded; they are cleared explicitly
//! and lost on restart.

use dashmap::DashMap;

use crate::types::query::Turn;

/// Per-session state
#[derive(Debug, Default, Clone)]
pub struct Session {
    /// Ordered conversation turns, replayed into each prompt
    pub turns: Vec<Turn>,
    /// Filenames from the session's most recent upload call
    pub uploaded_files: Vec<String>,
    /// Company of the most recent upload
    pub current_company: Option<String>,
}

/// Registry of sessions keyed by caller token.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conversation history for a session, in append order.
    pub fn history(&self, session_id: &str) -> Vec<Turn> {
        self.sessions
            .get(session_id)
            .map(|s| s.turns.clone())
            .unwrap_or_default()
    }

    /// Append one query/response exchange.
    pub fn append_exchange(&self, session_id: &str, query: &str, response: &str) {
        let mut session = self.sessions.entry(session_id.to_string()).or_default();
        session.turns.push(Turn::user(query));
        session.turns.push(Turn::assistant(response));
    }

    /// Clear a session's conversation memory.
    pub fn clear_conversation(&self, session_id: &str) {
        if let Some(mut session) = self.sessions.get_mut(session_id) {
            session.turns.clear();
        }
    }

    /// Reset the uploaded-file list ahead of a new upload call.
    pub fn begin_upload(&self, session_id: &str) {
        let mut session = self.sessions.entry(session_id.to_string()).or_default();
        session.uploaded_files.clear();
    }

    /// Record an uploaded file and the company it belongs to.
    pub fn record_upload(&self, session_id: &str, filename: &str, company: &str) {
        let mut session = self.sessions.entry(session_id.to_string()).or_default();
        session.uploaded_files.push(filename.to_string());
        session.current_company = Some(company.to_string());
    }

    /// The session's uploaded filenames.
    pub fn uploaded_files(&self, session_id: &str) -> Vec<String> {
        self.sessions
            .get(session_id)
            .map(|s| s.uploaded_files.clone())
            .unwrap_or_default()
    }

    /// Drop one filename from the session list. Returns false when the file
    /// was not tracked.
    pub fn remove_file(&self, session_id: &str, filename: &str) -> bool {
        let Some(mut session) = self.sessions.get_mut(session_id) else {
            return false;
        };
        let before = session.uploaded_files.len();
        session.uploaded_files.retain(|f| f != filename);
        session.uploaded_files.len() < before
    }

    /// The session's current company.
    pub fn current_company(&self, session_id: &str) -> Option<String> {
        self.sessions
            .get(session_id)
            .and_then(|s| s.current_company.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::query::Role;

    #[test]
    fn history_preserves_order_and_clear_empties() {
        let registry = SessionRegistry::new();
        registry.append_exchange("default_user", "A", "B");

        let turns = registry.history("default_user");
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].content, "A");
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[1].content, "B");

        registry.clear_conversation("default_user");
        assert!(registry.history("default_user").is_empty());
    }

    #[test]
    fn sessions_are_isolated() {
        let registry = SessionRegistry::new();
        registry.append_exchange("alice", "hi", "hello");
        assert!(registry.history("bob").is_empty());
        assert_eq!(registry.history("alice").len(), 2);

        registry.clear_conversation("bob");
        assert_eq!(registry.history("alice").len(), 2);
    }

    #[test]
    fn upload_tracking_resets_per_call() {
        let registry = SessionRegistry::new();
        registry.begin_upload("default_user");
        registry.record_upload("default_user", "old.pdf", "Acme");

        registry.begin_upload("default_user");
        registry.record_upload("default_user", "widget.pdf", "Globex");

        assert_eq!(registry.uploaded_files("default_user"), vec!["widget.pdf"]);
        assert_eq!(registry.current_company("default_user").as_deref(), Some("Globex"));

        assert!(registry.remove_file("default_user", "widget.pdf"));
        assert!(!registry.remove_file("default_user", "widget.pdf"));
        assert!(registry.uploaded_files("default_user").is_empty());
    }
}
