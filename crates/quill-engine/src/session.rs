//! Session data model: one persisted, resumable conversation

use chrono::{DateTime, Utc};
use quill_ai::{Message, Role};
use serde::{Deserialize, Serialize};

/// One persisted conversation and its accumulated cost.
///
/// Messages are append-only during a live session and strictly alternate
/// starting with `user`; `total_cost` is owned by the cost accountant and
/// only ever grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque unique identifier, assigned at creation
    pub id: String,
    /// Instant of creation, immutable
    pub created_at: DateTime<Utc>,
    /// Pricing/model variant, fixed for the session's lifetime
    pub model: String,
    /// Ordered transcript
    pub messages: Vec<Message>,
    /// Accumulated spend in dollars, never rounded internally
    pub total_cost: f64,
}

impl Session {
    /// Create a fresh in-memory session for the given model.
    /// Nothing is persisted until the first committed turn.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            model: model.into(),
            messages: vec![],
            total_cost: 0.0,
        }
    }

    /// Role of the most recent message, if any
    pub fn last_role(&self) -> Option<Role> {
        self.messages.last().map(|m| m.role)
    }

    /// First user message truncated for list display
    pub fn preview(&self) -> String {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| truncate(&m.content, 60))
            .unwrap_or_else(|| "New conversation".to_string())
    }

    /// Build the list-view summary for this session
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            created_at: self.created_at,
            model: self.model.clone(),
            preview: self.preview(),
            total_cost: self.total_cost,
        }
    }
}

/// What the session list shows without loading full transcripts
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub model: String,
    pub preview: String,
    pub total_cost: f64,
}

impl SessionSummary {
    /// Format the creation instant for display
    pub fn created_at_display(&self) -> String {
        self.created_at.format("%Y-%m-%d %H:%M").to_string()
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new("claude-sonnet-4-5-20250929");
        assert!(session.messages.is_empty());
        assert_eq!(session.total_cost, 0.0);
        assert_eq!(session.last_role(), None);
        assert!(!session.id.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Session::new("m");
        let b = Session::new("m");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_preview_uses_first_user_message() {
        let mut session = Session::new("m");
        session.messages.push(Message::user("What is Rust?"));
        session.messages.push(Message::assistant("A language."));
        assert_eq!(session.preview(), "What is Rust?");
    }

    #[test]
    fn test_preview_truncates_long_input() {
        let mut session = Session::new("m");
        session.messages.push(Message::user("x".repeat(100)));
        let preview = session.preview();
        assert_eq!(preview.chars().count(), 63);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_preview_of_empty_session() {
        let session = Session::new("m");
        assert_eq!(session.preview(), "New conversation");
    }

    #[test]
    fn test_serde_round_trip() {
        let mut session = Session::new("claude-opus-4-20250514");
        session.messages.push(Message::user("hi"));
        session.messages.push(Message::assistant("hello"));
        session.total_cost = 0.0072;

        let json = serde_json::to_string(&session).unwrap();
        let restored: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, session);
    }
}
