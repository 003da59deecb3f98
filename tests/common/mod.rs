//! Shared test utilities

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::mpsc;

use rev_gateway::api::ApiState;
use rev_gateway::gemini::{self, FragmentReceiver, GeminiClient, GenerationParams};
use rev_gateway::{
    Error, Event, FixedTranscriber, Orchestrator, Result, SessionStore, TextGenerator, Transcriber,
};

/// Scripted generator standing in for the upstream API.
///
/// `once` feeds `generate_once`; `stream` feeds `generate_streaming`, where
/// the outer `Err` rejects the request itself and an inner `Err` aborts the
/// stream after the items before it.
pub struct FakeGenerator {
    pub once: std::result::Result<String, String>,
    pub stream: std::result::Result<Vec<std::result::Result<String, String>>, String>,
    pub prompts: Mutex<Vec<String>>,
}

impl Default for FakeGenerator {
    fn default() -> Self {
        Self {
            once: Ok("Sure, let's talk Revolt.".to_string()),
            stream: Ok(Vec::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl FakeGenerator {
    pub fn with_fragments(fragments: &[&str]) -> Self {
        Self {
            stream: Ok(fragments.iter().map(|f| Ok((*f).to_string())).collect()),
            ..Self::default()
        }
    }

    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate_once(&self, prompt: &str, _params: GenerationParams) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.once.clone().map_err(Error::Upstream)
    }

    async fn generate_streaming(
        &self,
        prompt: &str,
        _params: GenerationParams,
    ) -> Result<FragmentReceiver> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let items = self.stream.clone().map_err(Error::Upstream)?;
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            for item in items {
                if tx.send(item.map_err(Error::Upstream)).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }
}

/// Transcriber that replays a scripted sequence of utterances
pub struct ScriptedTranscriber {
    utterances: Mutex<VecDeque<String>>,
}

impl ScriptedTranscriber {
    pub fn new(utterances: &[&str]) -> Self {
        Self {
            utterances: Mutex::new(utterances.iter().map(|u| (*u).to_string()).collect()),
        }
    }
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String> {
        Ok(self
            .utterances
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "Tell me about RV400 features".to_string()))
    }
}

/// Orchestrator over a fake generator, plus the store it writes to
pub fn test_orchestrator(
    generator: FakeGenerator,
    transcriber: impl Transcriber + 'static,
) -> (Orchestrator, SessionStore) {
    let store = SessionStore::new();
    let orchestrator = Orchestrator::with_seed(
        store.clone(),
        Arc::new(generator),
        Arc::new(transcriber),
        7,
    );
    (orchestrator, store)
}

/// Event channel sized for test scenarios
pub fn event_channel() -> (mpsc::Sender<Event>, mpsc::Receiver<Event>) {
    mpsc::channel(64)
}

/// Drain everything already emitted on the channel
pub fn drain(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Build API state backed by a real (never-called) Gemini client
pub fn test_api_state() -> Arc<ApiState> {
    let store = SessionStore::new();
    let gemini = Arc::new(GeminiClient::new(
        SecretString::from("test-key".to_string()),
        gemini::DEFAULT_BASE_URL,
        gemini::DEFAULT_MODEL,
    ));
    let generator: Arc<dyn TextGenerator> = gemini.clone();
    let orchestrator = Arc::new(Orchestrator::new(
        store.clone(),
        generator,
        Arc::new(FixedTranscriber::default()),
    ));
    Arc::new(ApiState {
        store,
        orchestrator,
        gemini,
        started_at: Instant::now(),
    })
}
