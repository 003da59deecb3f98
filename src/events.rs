//! Outbound conversation events
//!
//! Everything the gateway says to a connected client goes through this enum;
//! the WebSocket layer serializes each event as a tagged JSON object.

use serde::Serialize;

/// Kind discriminator carried by streamed response fragments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    Text,
}

/// Event emitted to a connected client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Conversation created; carries the opening small-talk line
    ConversationStarted {
        conversation_id: String,
        message: String,
    },
    /// One streamed response fragment, in upstream emission order
    AiResponseStream {
        kind: FragmentKind,
        content: String,
        conversation_id: String,
    },
    /// Recovery line after the user interrupted the assistant
    InterruptionHandled {
        message: String,
        conversation_id: String,
    },
    /// Conversation removed
    ConversationEnded,
    /// Non-fatal error surfaced to this connection only
    Error { message: String },
}

impl Event {
    /// Build an error event
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Build a text fragment event
    #[must_use]
    pub fn text_fragment(content: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self::AiResponseStream {
            kind: FragmentKind::Text,
            content: content.into(),
            conversation_id: conversation_id.into(),
        }
    }
}
