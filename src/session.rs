//! Conversation session state and the session store

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::topic;

/// Response style preference for a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Short replies, essentials only
    #[default]
    Concise,
    /// Fuller replies with a follow-up question
    Detailed,
}

impl Tone {
    /// Parse a wire-level tone string. Anything outside the accepted set
    /// returns `None` so callers can ignore it without failing the message.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "concise" => Some(Self::Concise),
            "detailed" => Some(Self::Detailed),
            _ => None,
        }
    }
}

/// State for one active conversation, keyed by connection identity
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque conversation token minted at start
    pub conversation_id: String,
    /// Topic of the most recent utterance, used for interruption recovery
    pub last_topic: String,
    /// Number of processed utterances; never decreases
    pub message_count: u64,
    /// Current response style preference
    pub tone: Tone,
}

impl Session {
    /// Create a fresh session in the greeting state
    #[must_use]
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            last_topic: topic::GREETING.to_string(),
            message_count: 0,
            tone: Tone::default(),
        }
    }
}

/// Process-wide map from connection identity to [`Session`].
///
/// The store is injected into the orchestrator, which is its only writer.
/// Access is per-key exclusive via the inner lock; sessions on different
/// connections never contend on anything beyond the map itself.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session, replacing any previous entry for the connection
    pub async fn insert(&self, session_id: impl Into<String>, session: Session) {
        self.inner.write().await.insert(session_id.into(), session);
    }

    /// Remove and return the session for a connection, if any
    pub async fn remove(&self, session_id: &str) -> Option<Session> {
        self.inner.write().await.remove(session_id)
    }

    /// Snapshot of the session for a connection, if any
    pub async fn get(&self, session_id: &str) -> Option<Session> {
        self.inner.read().await.get(session_id).cloned()
    }

    /// Apply `f` to the stored session. Returns `false` when no session
    /// exists for the connection, leaving the store untouched.
    pub async fn update<F>(&self, session_id: &str, f: F) -> bool
    where
        F: FnOnce(&mut Session),
    {
        match self.inner.write().await.get_mut(session_id) {
            Some(session) => {
                f(session);
                true
            }
            None => false,
        }
    }

    /// Number of active sessions
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether the store has no active sessions
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
