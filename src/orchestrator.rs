//! Session orchestration
//!
//! One orchestrator serves every connection. Each inbound transport event
//! maps to a method here; the method looks up the session, decides the
//! route (small talk, streamed generation, interruption recovery), and
//! emits outbound [`Event`]s through the connection's channel. Inbound
//! events for a single connection are dispatched sequentially by its
//! receive loop, so at most one generation call is in flight per session.

use std::sync::{Arc, Mutex, PoisonError};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::events::Event;
use crate::gemini::TextGenerator;
use crate::session::{Session, SessionStore, Tone};
use crate::smalltalk::small_talk_reply;
use crate::transcriber::Transcriber;
use crate::{prompt, topic};

/// Error message for operations on a connection with no active conversation
const NO_CONVERSATION: &str = "No active conversation found.";

/// Drives conversations: routes utterances and relays streamed replies
pub struct Orchestrator {
    store: SessionStore,
    generator: Arc<dyn TextGenerator>,
    transcriber: Arc<dyn Transcriber>,
    rng: Mutex<StdRng>,
}

impl Orchestrator {
    /// Create an orchestrator over an injected store and collaborators
    #[must_use]
    pub fn new(
        store: SessionStore,
        generator: Arc<dyn TextGenerator>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Self {
        Self {
            store,
            generator,
            transcriber,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Like [`Orchestrator::new`] with a seeded RNG, so greeting selection
    /// is deterministic in tests
    #[must_use]
    pub fn with_seed(
        store: SessionStore,
        generator: Arc<dyn TextGenerator>,
        transcriber: Arc<dyn Transcriber>,
        seed: u64,
    ) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..Self::new(store, generator, transcriber)
        }
    }

    fn pick_small_talk(&self) -> &'static str {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        small_talk_reply(&mut *rng)
    }

    /// Start a conversation for a connection.
    ///
    /// Probes upstream connectivity first; on success inserts a fresh
    /// session and emits `conversation_started` with a greeting. On probe
    /// failure emits a single error event and creates nothing.
    pub async fn on_start(&self, session_id: &str, tx: &mpsc::Sender<Event>) {
        tracing::info!(session_id, "starting conversation");

        match self
            .generator
            .generate_once(prompt::PROBE_PROMPT, prompt::probe_params())
            .await
        {
            Ok(_) => {
                let conversation_id = Uuid::new_v4().to_string();
                self.store
                    .insert(session_id, Session::new(conversation_id.clone()))
                    .await;

                send(
                    tx,
                    Event::ConversationStarted {
                        conversation_id,
                        message: self.pick_small_talk().to_string(),
                    },
                )
                .await;
            }
            Err(e) => {
                tracing::error!(session_id, error = %e, "conversation start probe failed");
                send(
                    tx,
                    Event::error("Failed to start conversation. Please try again."),
                )
                .await;
            }
        }
    }

    /// Process a user utterance.
    ///
    /// Session state (`last_topic`, `message_count`) is updated before any
    /// upstream dispatch, for the small-talk branch too. Fragments are
    /// forwarded in arrival order; fragments already emitted are never
    /// retracted when the stream dies mid-way.
    pub async fn on_utterance(&self, session_id: &str, audio: &[u8], tx: &mpsc::Sender<Event>) {
        let Some(session) = self.store.get(session_id).await else {
            tracing::warn!(session_id, "utterance for unknown session");
            send(tx, Event::error(NO_CONVERSATION)).await;
            return;
        };

        let text = match self.transcriber.transcribe(audio).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(session_id, error = %e, "transcription failed");
                send(tx, Event::error("Error processing your voice input.")).await;
                return;
            }
        };

        let detected = topic::detect_topic(&text);
        self.store
            .update(session_id, |s| {
                s.last_topic = detected.to_string();
                s.message_count += 1;
            })
            .await;
        tracing::debug!(session_id, topic = detected, "utterance classified");

        if detected == topic::GREETING {
            let reply = self.pick_small_talk();
            send(tx, Event::text_fragment(reply, session.conversation_id)).await;
            return;
        }

        let (composed, params) = prompt::compose(&text, session.tone);
        let mut fragments = match self.generator.generate_streaming(&composed, params).await {
            Ok(rx) => rx,
            Err(e) => {
                tracing::error!(session_id, error = %e, "streaming request failed");
                send(tx, Event::error("Error processing your voice input.")).await;
                return;
            }
        };

        let mut emitted = 0_usize;
        while let Some(item) = fragments.recv().await {
            match item {
                Ok(content) => {
                    emitted += 1;
                    send(
                        tx,
                        Event::text_fragment(content, session.conversation_id.clone()),
                    )
                    .await;
                }
                Err(e) => {
                    // Partial output stands; only a stream that produced
                    // nothing surfaces an error to the client.
                    if emitted == 0 {
                        tracing::error!(session_id, error = %e, "stream failed before output");
                        send(tx, Event::error("Error processing your voice input.")).await;
                    } else {
                        tracing::warn!(
                            session_id,
                            emitted,
                            error = %e,
                            "stream terminated abnormally"
                        );
                    }
                    return;
                }
            }
        }
        tracing::debug!(session_id, emitted, "response stream complete");
    }

    /// Handle a user interruption.
    ///
    /// Always emits exactly one `interruption_handled` event for an active
    /// session; upstream failure degrades to a canned line referencing the
    /// last topic so the user is never left without a prompt to continue.
    pub async fn on_interrupt(&self, session_id: &str, tx: &mpsc::Sender<Event>) {
        let Some(session) = self.store.get(session_id).await else {
            tracing::warn!(session_id, "interrupt for unknown session");
            send(tx, Event::error(NO_CONVERSATION)).await;
            return;
        };

        let message = match self
            .generator
            .generate_once(
                &prompt::interruption_prompt(&session.last_topic),
                prompt::interrupt_params(),
            )
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(session_id, error = %e, "interruption recovery degraded to fallback");
                prompt::interruption_fallback(&session.last_topic)
            }
        };

        send(
            tx,
            Event::InterruptionHandled {
                message,
                conversation_id: session.conversation_id,
            },
        )
        .await;
    }

    /// Update the session's tone preference.
    ///
    /// Invalid tones and unknown sessions are ignored with a log line only;
    /// no event goes to the far end either way.
    pub async fn on_tone_preference(&self, session_id: &str, tone: &str) {
        let Some(parsed) = Tone::parse(tone) else {
            tracing::warn!(session_id, tone, "ignoring invalid tone preference");
            return;
        };
        if self.store.update(session_id, |s| s.tone = parsed).await {
            tracing::debug!(session_id, ?parsed, "tone preference updated");
        } else {
            tracing::warn!(session_id, "tone preference for unknown session");
        }
    }

    /// End the conversation. Idempotent: ending an absent session still
    /// emits `conversation_ended`.
    pub async fn on_end(&self, session_id: &str, tx: &mpsc::Sender<Event>) {
        self.store.remove(session_id).await;
        tracing::info!(session_id, "conversation ended");
        send(tx, Event::ConversationEnded).await;
    }

    /// Clean up after the transport dropped. Same removal as
    /// [`Orchestrator::on_end`], but the socket is gone so nothing is emitted.
    pub async fn on_disconnect(&self, session_id: &str) {
        if self.store.remove(session_id).await.is_some() {
            tracing::info!(session_id, "session cleaned up on disconnect");
        }
    }
}

/// Send an event, ignoring a closed channel (the client is gone)
async fn send(tx: &mpsc::Sender<Event>, event: Event) {
    if tx.send(event).await.is_err() {
        tracing::debug!("outbound channel closed, dropping event");
    }
}
