//! Keyword-based topic detection
//!
//! Routes utterances to a coarse topic label. The same scan decides both
//! small-talk short-circuiting (greeting keywords) and the context used to
//! recover from an interruption.

/// Topic label returned when no keyword matches
pub const GENERAL_INQUIRY: &str = "general inquiry";

/// Topic label that short-circuits to a canned small-talk reply
pub const GREETING: &str = "greeting";

/// Ordered `(keyword, topic)` pairs.
///
/// Declaration order is the match priority: the first keyword found as a
/// substring of the lower-cased utterance wins. "What's the price of RV400?"
/// therefore resolves to "RV400 features", not "pricing".
const TOPIC_KEYWORDS: &[(&str, &str)] = &[
    ("rv400", "RV400 features"),
    ("rv300", "RV300 features"),
    ("price", "pricing"),
    ("cost", "pricing"),
    ("range", "battery range"),
    ("battery", "battery and charging"),
    ("charging", "charging"),
    ("service", "service and maintenance"),
    ("warranty", "warranty"),
    ("test ride", "test ride availability"),
    ("availability", "availability"),
    ("dealer", "dealer locations"),
    ("hi", GREETING),
    ("hello", GREETING),
    ("how are you", GREETING),
];

/// Detect the topic of an utterance.
///
/// Case-insensitive substring scan over [`TOPIC_KEYWORDS`] in declaration
/// order; falls back to [`GENERAL_INQUIRY`].
#[must_use]
pub fn detect_topic(utterance: &str) -> &'static str {
    let message = utterance.to_lowercase();
    TOPIC_KEYWORDS
        .iter()
        .find(|(keyword, _)| message.contains(keyword))
        .map_or(GENERAL_INQUIRY, |(_, topic)| *topic)
}
