//! Canned small-talk replies
//!
//! Greetings never hit the generation API; a reply is picked from a fixed
//! pool with an injected RNG so selection is seedable in tests.

use rand::Rng;

/// Fixed pool of small-talk replies
const SMALL_TALK: &[&str] = &[
    "Hi! I'm Rev. Are you interested in RV400 features, price, or test ride availability?",
    "Hello! I'm here to help with Revolt Motors. What would you like to know about our electric motorcycles?",
    "Hey there! I'm Rev from Revolt Motors. Should we talk about RV400 specs, pricing, or something else?",
];

/// Pick a small-talk reply uniformly at random
pub fn small_talk_reply<R: Rng>(rng: &mut R) -> &'static str {
    SMALL_TALK[rng.gen_range(0..SMALL_TALK.len())]
}
