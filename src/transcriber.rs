//! Speech-to-text seam
//!
//! The gateway does not perform recognition itself; utterance text resolution
//! is delegated behind this trait. The shipped implementation returns a fixed
//! utterance, matching the current deployment where the browser sends audio
//! but transcription is not yet wired up.

use async_trait::async_trait;

use crate::Result;

/// Resolves captured audio to utterance text
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe audio bytes to text
    ///
    /// # Errors
    ///
    /// Returns an error if transcription fails.
    async fn transcribe(&self, audio: &[u8]) -> Result<String>;
}

/// Transcriber that ignores the audio and returns a fixed utterance
pub struct FixedTranscriber {
    utterance: String,
}

impl FixedTranscriber {
    /// Create a transcriber that always resolves to `utterance`
    #[must_use]
    pub fn new(utterance: impl Into<String>) -> Self {
        Self {
            utterance: utterance.into(),
        }
    }
}

impl Default for FixedTranscriber {
    fn default() -> Self {
        Self::new("Tell me about RV400 features")
    }
}

#[async_trait]
impl Transcriber for FixedTranscriber {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String> {
        Ok(self.utterance.clone())
    }
}
