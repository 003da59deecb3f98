//! Conversation flow tests driving the orchestrator with scripted collaborators

mod common;

use common::{FakeGenerator, ScriptedTranscriber, drain, event_channel, test_orchestrator};
use rev_gateway::{Event, Session, Tone};

#[tokio::test]
async fn start_creates_session_and_greets() {
    let (orchestrator, store) =
        test_orchestrator(FakeGenerator::default(), ScriptedTranscriber::new(&[]));
    let (tx, mut rx) = event_channel();

    orchestrator.on_start("conn-1", &tx).await;

    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    let Event::ConversationStarted {
        conversation_id,
        message,
    } = &events[0]
    else {
        panic!("expected conversation_started, got {events:?}");
    };
    assert!(!message.is_empty());

    let session = store.get("conn-1").await.expect("session created");
    assert_eq!(&session.conversation_id, conversation_id);
    assert_eq!(session.message_count, 0);
    assert_eq!(session.last_topic, "greeting");
    assert_eq!(session.tone, Tone::Concise);
}

#[tokio::test]
async fn start_probe_failure_emits_error_and_creates_nothing() {
    let generator = FakeGenerator {
        once: Err("connection refused".to_string()),
        ..FakeGenerator::default()
    };
    let (orchestrator, store) = test_orchestrator(generator, ScriptedTranscriber::new(&[]));
    let (tx, mut rx) = event_channel();

    orchestrator.on_start("conn-1", &tx).await;

    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], Event::Error { .. }));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn utterance_without_session_errors_and_mutates_nothing() {
    let (orchestrator, store) =
        test_orchestrator(FakeGenerator::default(), ScriptedTranscriber::new(&[]));
    let (tx, mut rx) = event_channel();

    orchestrator.on_utterance("conn-ghost", b"audio", &tx).await;

    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], Event::Error { .. }));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn message_count_tracks_every_utterance_regardless_of_branch() {
    let generator = FakeGenerator::with_fragments(&["The RV400 has a 150 km range."]);
    let transcriber =
        ScriptedTranscriber::new(&["hello", "what is the range", "how are you today"]);
    let (orchestrator, store) = test_orchestrator(generator, transcriber);
    let (tx, mut rx) = event_channel();

    orchestrator.on_start("conn-1", &tx).await;
    for _ in 0..3 {
        orchestrator.on_utterance("conn-1", &[], &tx).await;
    }

    let session = store.get("conn-1").await.unwrap();
    assert_eq!(session.message_count, 3);
    // Last utterance was small talk, so the topic reflects it.
    assert_eq!(session.last_topic, "greeting");
    // Start greeting + three replies (two small talk, one streamed fragment).
    let events = drain(&mut rx);
    assert_eq!(events.len(), 4);
}

#[tokio::test]
async fn small_talk_short_circuits_without_upstream_call() {
    let generator = FakeGenerator::default();
    let (orchestrator, store) =
        test_orchestrator(generator, ScriptedTranscriber::new(&["hi there"]));
    let (tx, mut rx) = event_channel();

    store.insert("conn-1", Session::new("conv-1")).await;
    orchestrator.on_utterance("conn-1", &[], &tx).await;

    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        Event::AiResponseStream { content, conversation_id, .. }
            if !content.is_empty() && conversation_id == "conv-1"
    ));
    assert_eq!(store.get("conn-1").await.unwrap().message_count, 1);
}

#[tokio::test]
async fn fragments_are_forwarded_in_upstream_order() {
    let generator = FakeGenerator::with_fragments(&["The RV400 ", "starts at ", "1.25 lakh."]);
    let (orchestrator, store) = test_orchestrator(
        generator,
        ScriptedTranscriber::new(&["what is the price of RV400"]),
    );
    let (tx, mut rx) = event_channel();

    store.insert("conn-1", Session::new("conv-1")).await;
    orchestrator.on_utterance("conn-1", &[], &tx).await;

    let contents: Vec<String> = drain(&mut rx)
        .into_iter()
        .map(|event| match event {
            Event::AiResponseStream {
                content,
                conversation_id,
                ..
            } => {
                assert_eq!(conversation_id, "conv-1");
                content
            }
            other => panic!("unexpected event: {other:?}"),
        })
        .collect();
    assert_eq!(contents, ["The RV400 ", "starts at ", "1.25 lakh."]);

    // Topic was updated before dispatch; rv400 wins over price by declaration order.
    assert_eq!(store.get("conn-1").await.unwrap().last_topic, "RV400 features");
}

#[tokio::test]
async fn stream_rejection_emits_single_error_after_state_update() {
    let generator = FakeGenerator {
        stream: Err("503 overloaded".to_string()),
        ..FakeGenerator::default()
    };
    let (orchestrator, store) =
        test_orchestrator(generator, ScriptedTranscriber::new(&["battery health"]));
    let (tx, mut rx) = event_channel();

    store.insert("conn-1", Session::new("conv-1")).await;
    orchestrator.on_utterance("conn-1", &[], &tx).await;

    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], Event::Error { .. }));

    // The update-before-dispatch rule holds even when the call fails.
    let session = store.get("conn-1").await.unwrap();
    assert_eq!(session.message_count, 1);
    assert_eq!(session.last_topic, "battery and charging");
}

#[tokio::test]
async fn mid_stream_failure_keeps_already_emitted_fragments() {
    let generator = FakeGenerator {
        stream: Ok(vec![
            Ok("Charging takes ".to_string()),
            Ok("about four hours".to_string()),
            Err("connection reset".to_string()),
        ]),
        ..FakeGenerator::default()
    };
    let (orchestrator, store) =
        test_orchestrator(generator, ScriptedTranscriber::new(&["charging time?"]));
    let (tx, mut rx) = event_channel();

    store.insert("conn-1", Session::new("conv-1")).await;
    orchestrator.on_utterance("conn-1", &[], &tx).await;

    let events = drain(&mut rx);
    assert_eq!(events.len(), 2);
    assert!(
        events
            .iter()
            .all(|event| matches!(event, Event::AiResponseStream { .. })),
        "partial output stands and no error follows it: {events:?}"
    );
    assert_eq!(store.get("conn-1").await.unwrap().message_count, 1);
}

#[tokio::test]
async fn interrupt_recovers_with_generated_text_referencing_last_topic() {
    let generator = FakeGenerator {
        once: Ok("We were on pricing. Continue?".to_string()),
        ..FakeGenerator::default()
    };
    let (orchestrator, store) = test_orchestrator(generator, ScriptedTranscriber::new(&[]));
    let (tx, mut rx) = event_channel();

    store.insert("conn-1", Session::new("conv-1")).await;
    store
        .update("conn-1", |s| s.last_topic = "pricing".to_string())
        .await;
    orchestrator.on_interrupt("conn-1", &tx).await;

    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        Event::InterruptionHandled { message, conversation_id }
            if message == "We were on pricing. Continue?" && conversation_id == "conv-1"
    ));
}

#[tokio::test]
async fn interrupt_prompt_carries_last_topic() {
    let generator = std::sync::Arc::new(FakeGenerator::default());
    let store = rev_gateway::SessionStore::new();
    let orchestrator = rev_gateway::Orchestrator::with_seed(
        store.clone(),
        generator.clone(),
        std::sync::Arc::new(ScriptedTranscriber::new(&[])),
        7,
    );
    let (tx, mut rx) = event_channel();

    store.insert("conn-1", Session::new("conv-1")).await;
    store
        .update("conn-1", |s| s.last_topic = "battery range".to_string())
        .await;
    orchestrator.on_interrupt("conn-1", &tx).await;
    drain(&mut rx);

    let prompts = generator.recorded_prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("interrupted while talking about battery range"));
}

#[tokio::test]
async fn interrupt_upstream_failure_degrades_to_local_fallback() {
    let generator = FakeGenerator {
        once: Err("500 internal".to_string()),
        ..FakeGenerator::default()
    };
    let (orchestrator, store) = test_orchestrator(generator, ScriptedTranscriber::new(&[]));
    let (tx, mut rx) = event_channel();

    store.insert("conn-1", Session::new("conv-1")).await;
    store
        .update("conn-1", |s| s.last_topic = "warranty".to_string())
        .await;
    orchestrator.on_interrupt("conn-1", &tx).await;

    let events = drain(&mut rx);
    assert_eq!(events.len(), 1, "exactly one event, never an error: {events:?}");
    assert!(matches!(
        &events[0],
        Event::InterruptionHandled { message, .. } if message.contains("warranty")
    ));
}

#[tokio::test]
async fn interrupt_without_session_errors() {
    let (orchestrator, _store) =
        test_orchestrator(FakeGenerator::default(), ScriptedTranscriber::new(&[]));
    let (tx, mut rx) = event_channel();

    orchestrator.on_interrupt("conn-ghost", &tx).await;

    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], Event::Error { .. }));
}

#[tokio::test]
async fn invalid_tone_is_ignored_without_any_event() {
    let (orchestrator, store) =
        test_orchestrator(FakeGenerator::default(), ScriptedTranscriber::new(&[]));
    let (tx, mut rx) = event_channel();

    store.insert("conn-1", Session::new("conv-1")).await;
    orchestrator.on_tone_preference("conn-1", "bogus").await;

    assert!(drain(&mut rx).is_empty());
    assert_eq!(store.get("conn-1").await.unwrap().tone, Tone::Concise);

    orchestrator.on_tone_preference("conn-1", "detailed").await;
    assert!(drain(&mut rx).is_empty());
    assert_eq!(store.get("conn-1").await.unwrap().tone, Tone::Detailed);
    drop(tx);
}

#[tokio::test]
async fn tone_for_unknown_session_is_ignored() {
    let (orchestrator, store) =
        test_orchestrator(FakeGenerator::default(), ScriptedTranscriber::new(&[]));

    orchestrator.on_tone_preference("conn-ghost", "detailed").await;
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn end_is_idempotent_and_always_acknowledged() {
    let (orchestrator, store) =
        test_orchestrator(FakeGenerator::default(), ScriptedTranscriber::new(&[]));
    let (tx, mut rx) = event_channel();

    // Ending with no prior conversation still acknowledges.
    orchestrator.on_end("conn-1", &tx).await;
    let events = drain(&mut rx);
    assert_eq!(events, vec![Event::ConversationEnded]);

    store.insert("conn-1", Session::new("conv-1")).await;
    orchestrator.on_end("conn-1", &tx).await;
    assert_eq!(drain(&mut rx), vec![Event::ConversationEnded]);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn disconnect_cleans_up_silently() {
    let (orchestrator, store) =
        test_orchestrator(FakeGenerator::default(), ScriptedTranscriber::new(&[]));

    store.insert("conn-1", Session::new("conv-1")).await;
    orchestrator.on_disconnect("conn-1").await;
    assert!(store.is_empty().await);

    // Disconnecting an already-absent session is a no-op.
    orchestrator.on_disconnect("conn-1").await;
}
