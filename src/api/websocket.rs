//! WebSocket transport for conversation sessions
//!
//! Each connection gets a transport-assigned session id, an outbound mpsc
//! channel drained by a send task, and a receive loop that dispatches
//! inbound messages to the orchestrator one at a time. Sequential dispatch
//! is what serializes per-session processing; different connections run
//! independently.

use std::sync::Arc;

use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::ApiState;
use crate::events::Event;

/// Outbound events buffered per connection
const OUTBOUND_CHANNEL_CAPACITY: usize = 32;

/// Incoming WebSocket message from a client
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsIncoming {
    /// Open a conversation for this connection
    StartConversation,
    /// A captured utterance; the audio payload is currently opaque to the
    /// core and resolved to text by the transcriber seam
    AudioInput {
        #[serde(default)]
        audio_data: Option<String>,
        #[serde(default)]
        conversation_id: Option<String>,
    },
    /// The user spoke over the assistant
    Interrupt,
    /// Response style preference; validated by the orchestrator
    TonePreference { tone: String },
    /// Close the conversation but keep the socket
    EndConversation,
}

/// Build the WebSocket router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/ws", get(ws_upgrade))
        .with_state(state)
}

/// Handle the WebSocket upgrade request
async fn ws_upgrade(State(state): State<Arc<ApiState>>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one connection until either side goes away
async fn handle_socket(socket: WebSocket, state: Arc<ApiState>) {
    // Connection identity is minted here, never taken from the client.
    let session_id = format!("conn-{}", Uuid::new_v4());
    tracing::info!(session_id, "WebSocket connected");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Event>(OUTBOUND_CHANNEL_CAPACITY);

    // Forward orchestrator events to the socket in channel order.
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(text) => {
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::error!(error = %e, "failed to serialize outbound event"),
            }
        }
    });

    let recv_state = Arc::clone(&state);
    let recv_session_id = session_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            match message {
                Message::Text(text) => {
                    handle_message(&text, &recv_state, &recv_session_id, &tx).await;
                }
                Message::Close(_) => {
                    tracing::info!(session_id = %recv_session_id, "WebSocket closed by client");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.orchestrator.on_disconnect(&session_id).await;
    tracing::info!(session_id, "WebSocket disconnected");
}

/// Dispatch a single inbound message to the orchestrator
async fn handle_message(
    text: &str,
    state: &Arc<ApiState>,
    session_id: &str,
    tx: &mpsc::Sender<Event>,
) {
    let incoming: WsIncoming = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(session_id, error = %e, "ignoring malformed client message");
            return;
        }
    };

    let orchestrator = &state.orchestrator;
    match incoming {
        WsIncoming::StartConversation => orchestrator.on_start(session_id, tx).await,
        WsIncoming::AudioInput { audio_data, .. } => {
            let audio = audio_data.unwrap_or_default();
            orchestrator
                .on_utterance(session_id, audio.as_bytes(), tx)
                .await;
        }
        WsIncoming::Interrupt => orchestrator.on_interrupt(session_id, tx).await,
        WsIncoming::TonePreference { tone } => {
            orchestrator.on_tone_preference(session_id, &tone).await;
        }
        WsIncoming::EndConversation => orchestrator.on_end(session_id, tx).await,
    }
}
