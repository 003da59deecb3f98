//! Prompt composition for the generation API
//!
//! Pure functions from an utterance, the session tone, and a detected input
//! language to the final prompt string and sampling parameters.

use crate::gemini::GenerationParams;
use crate::session::Tone;

/// One-shot prompt used to probe upstream connectivity at conversation start
pub const PROBE_PROMPT: &str = "Hello, start a conversation about Revolt Motors";

/// Max output tokens for a detailed-tone reply
const DETAILED_MAX_TOKENS: u32 = 200;

/// Max output tokens for a concise-tone reply
const CONCISE_MAX_TOKENS: u32 = 120;

/// Parameters for the conversation-start probe
#[must_use]
pub const fn probe_params() -> GenerationParams {
    GenerationParams {
        temperature: 0.8,
        top_k: 40,
        top_p: 0.95,
        max_output_tokens: 200,
    }
}

/// Parameters for the short interruption-recovery request
#[must_use]
pub const fn interrupt_params() -> GenerationParams {
    GenerationParams {
        temperature: 0.7,
        top_k: 40,
        top_p: 0.9,
        max_output_tokens: 80,
    }
}

/// Compose the full prompt and sampling parameters for a user utterance.
///
/// The language hint comes from a Devanagari test on the utterance; the tone
/// picks the response-style instructions and the output-token ceiling.
#[must_use]
pub fn compose(utterance: &str, tone: Tone) -> (String, GenerationParams) {
    let language_hint = if contains_devanagari(utterance) {
        "Respond in Hindi if the user's message is in Hindi, otherwise English."
    } else {
        "Respond in English."
    };

    let (tone_instructions, max_output_tokens) = match tone {
        Tone::Detailed => (
            "Provide comprehensive but focused information. Include 2-3 key points and a relevant follow-up question.",
            DETAILED_MAX_TOKENS,
        ),
        Tone::Concise => (
            "Keep responses very concise (1-2 sentences max). Focus on the most essential information only.",
            CONCISE_MAX_TOKENS,
        ),
    };

    let prompt = format!(
        "You are Rev, Revolt Motors' assistant. Be warm, humble, and conversational. \
         Use short, friendly sentences and everyday words. When it helps, ask a brief \
         follow-up to clarify needs. {language_hint} Stay strictly on Revolt Motors \
         vehicles, features, pricing, service, availability, warranty, and company info; \
         if asked anything else, politely say you can only help with Revolt Motors topics \
         and suggest a relevant alternative. If interrupted, quickly summarize where you \
         stopped and ask how to continue.\n\
         \n\
         Tone: friendly, concise, humble.\n\
         Role: Revolt Motors-only.\n\
         Follow-ups: 1 short question max when needed.\n\
         Prioritize the 1-2 most helpful facts first. Avoid long lists. Offer a relevant next step.\n\
         Response Style: {tone_instructions}\n\
         \n\
         User:\n\
         {utterance}"
    );

    let params = GenerationParams {
        temperature: 0.7,
        top_k: 40,
        top_p: 0.9,
        max_output_tokens,
    };

    (prompt, params)
}

/// Prompt for the short recovery request after the user interrupts
#[must_use]
pub fn interruption_prompt(last_topic: &str) -> String {
    format!(
        "You were interrupted while talking about {last_topic}. Quickly summarize where \
         you stopped and ask how to continue. Keep it to 1-2 sentences max."
    )
}

/// Locally-generated recovery line used when the upstream call fails
#[must_use]
pub fn interruption_fallback(last_topic: &str) -> String {
    format!(
        "No problem - do you want me to continue about {last_topic} or focus on something else?"
    )
}

/// Whether the utterance contains any character in the Devanagari block
/// (U+0900 to U+097F)
fn contains_devanagari(utterance: &str) -> bool {
    utterance.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c))
}
