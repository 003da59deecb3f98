//! Incremental decoder for the streaming generation response
//!
//! The streaming endpoint delivers newline-delimited `data: <json>` events
//! whose bytes arrive at arbitrary chunk boundaries. The decoder buffers
//! partial lines across chunks and only parses complete lines; a trailing
//! incomplete line stays buffered until more data arrives. A literal
//! `data: [DONE]` line terminates the sequence and is not itself a fragment.
//! Lines that fail JSON parsing or lack the candidate text path are skipped
//! so sparse or heartbeat lines never fail the stream.

use super::GenerateResponse;

/// End-of-stream sentinel payload
const DONE_SENTINEL: &str = "[DONE]";

/// Stateful line decoder for an SSE-framed byte stream
///
/// Buffers raw bytes rather than text: a chunk boundary may fall inside a
/// multi-byte character, so bytes are only decoded once a full line is
/// available.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    /// Create a decoder with an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, returning the text fragments completed by it
    /// in arrival order. Once the end sentinel has been seen, further input
    /// is ignored.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.done {
            return Vec::new();
        }

        self.buffer.extend_from_slice(chunk);

        let mut fragments = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = String::from_utf8_lossy(&self.buffer[..newline])
                .trim()
                .to_string();
            self.buffer.drain(..=newline);

            let Some(data) = line.strip_prefix("data: ") else {
                continue;
            };
            if data == DONE_SENTINEL {
                self.done = true;
                self.buffer.clear();
                break;
            }
            if let Some(text) = extract_text(data) {
                fragments.push(text);
            }
        }
        fragments
    }

    /// Whether the end-of-stream sentinel has been seen
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }
}

/// Pull the candidate text out of one event payload.
///
/// Returns `None` for unparseable JSON, payloads without the candidate text
/// path, and empty text parts.
fn extract_text(data: &str) -> Option<String> {
    serde_json::from_str::<GenerateResponse>(data)
        .ok()
        .and_then(GenerateResponse::into_first_text)
}
