//! Client for the Google generative-language API
//!
//! Two request shapes: a one-shot `generateContent` call (conversation
//! probe, interruption recovery) and a streaming `streamGenerateContent`
//! call whose SSE-framed body is decoded by [`sse::SseDecoder`] and relayed
//! through an ordered channel. The client sits behind [`TextGenerator`] so
//! the orchestrator can be driven by a scripted implementation in tests.

pub mod sse;

use async_trait::async_trait;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc};

use crate::{Error, Result};

/// Models accepted by the model-switch endpoint
pub const AVAILABLE_MODELS: &[&str] = &[
    "gemini-2.0-flash-exp",
    "gemini-2.0-flash",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
];

/// Default generation model
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Buffered fragments between the decoder task and the consumer
const FRAGMENT_CHANNEL_CAPACITY: usize = 32;

/// Whether `model` is in the permitted model list
#[must_use]
pub fn is_available(model: &str) -> bool {
    AVAILABLE_MODELS.contains(&model)
}

/// Sampling parameters for one generation request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

/// Ordered, forward-only sequence of response fragments.
///
/// Fragments arrive in upstream emission order. An `Err` item means the
/// stream terminated abnormally; no further items follow it. Dropping the
/// receiver cancels the producer.
pub type FragmentReceiver = mpsc::Receiver<Result<String>>;

/// Text generation seam between the orchestrator and the upstream API
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Single request/response generation
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upstream`] on a non-success status or a payload
    /// without the candidate text path.
    async fn generate_once(&self, prompt: &str, params: GenerationParams) -> Result<String>;

    /// Streaming generation
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upstream`] if the request itself is rejected;
    /// mid-stream failures surface as an `Err` item on the channel.
    async fn generate_streaming(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<FragmentReceiver>;
}

/// HTTP client for the generative-language API
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: RwLock<String>,
}

impl GeminiClient {
    /// Create a client for the given API key, base URL, and initial model
    #[must_use]
    pub fn new(
        api_key: SecretString,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.into(),
            model: RwLock::new(model.into()),
        }
    }

    /// Currently selected model
    pub async fn current_model(&self) -> String {
        self.model.read().await.clone()
    }

    /// Switch the current model, validating against [`AVAILABLE_MODELS`].
    /// Unknown models are rejected without mutating the selection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a model outside the permitted list.
    pub async fn set_model(&self, model: &str) -> Result<String> {
        if !is_available(model) {
            return Err(Error::Config(format!(
                "unknown model: {model} (available: {})",
                AVAILABLE_MODELS.join(", ")
            )));
        }
        let mut current = self.model.write().await;
        *current = model.to_string();
        tracing::info!(model, "switched generation model");
        Ok(model.to_string())
    }

    async fn endpoint(&self, operation: &str) -> String {
        let model = self.model.read().await;
        format!("{}/{}:{operation}", self.base_url, *model)
    }

    async fn post(&self, url: &str, prompt: &str, params: GenerationParams) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&GenerateRequest::user(prompt, params))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "generation API error");
            return Err(Error::Upstream(format!("{status}: {body}")));
        }
        Ok(response)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_once(&self, prompt: &str, params: GenerationParams) -> Result<String> {
        let url = self.endpoint("generateContent").await;
        let response = self.post(&url, prompt, params).await?;

        let body = response.text().await?;
        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Upstream(format!("unparseable response payload: {e}")))?;
        parsed
            .into_first_text()
            .ok_or_else(|| Error::Upstream("response missing candidate text".to_string()))
    }

    async fn generate_streaming(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<FragmentReceiver> {
        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent").await);
        let response = self.post(&url, prompt, params).await?;

        let (tx, rx) = mpsc::channel(FRAGMENT_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            let bytes = response.bytes_stream();
            futures::pin_mut!(bytes);
            let mut decoder = sse::SseDecoder::new();
            while let Some(chunk) = bytes.next().await {
                match chunk {
                    Ok(chunk) => {
                        for fragment in decoder.feed(&chunk) {
                            // Receiver dropped: the consumer cancelled the stream.
                            if tx.send(Ok(fragment)).await.is_err() {
                                return;
                            }
                        }
                        if decoder.is_done() {
                            return;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "streaming response aborted");
                        let _ = tx.send(Err(Error::Upstream(e.to_string()))).await;
                        return;
                    }
                }
            }
        });
        Ok(rx)
    }
}

/// Request body for both generation endpoints
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationParams,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl<'a> GenerateRequest<'a> {
    fn user(text: &'a str, params: GenerationParams) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text }],
            }],
            generation_config: params,
        }
    }
}

/// Response document for both generation endpoints
#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate part, if present and non-empty
    pub(crate) fn into_first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|text| !text.is_empty())
    }
}
