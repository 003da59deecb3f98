//! Rev Gateway - voice-chat session and streaming-response relay
//!
//! This library provides the server side of the Rev voice assistant:
//! - Per-connection conversation sessions (start, utterance, interrupt,
//!   tone preference, end)
//! - Utterance routing: small talk is answered locally, everything else
//!   goes to the generation API
//! - In-order relay of chunked streaming responses back to the client
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  Browser client                      │
//! │   Mic capture  │  Speech synthesis  │  UI           │
//! └────────────────────┬────────────────────────────────┘
//!                      │ WebSocket events
//! ┌────────────────────▼────────────────────────────────┐
//! │                  Rev Gateway                         │
//! │   Session Store │ Orchestrator │ Topic │ Prompt     │
//! └────────────────────┬────────────────────────────────┘
//!                      │ HTTP + SSE
//! ┌────────────────────▼────────────────────────────────┐
//! │          Generative-language API (Gemini)            │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod gemini;
pub mod orchestrator;
pub mod prompt;
pub mod session;
pub mod smalltalk;
pub mod topic;
pub mod transcriber;

pub use config::Config;
pub use error::{Error, Result};
pub use events::{Event, FragmentKind};
pub use gemini::{GeminiClient, GenerationParams, TextGenerator};
pub use orchestrator::Orchestrator;
pub use session::{Session, SessionStore, Tone};
pub use transcriber::{FixedTranscriber, Transcriber};
