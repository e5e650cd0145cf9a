use chatweave::conversation::DeliveryPhase;
use chatweave::error::SequencerError;
use chatweave::{DeliveryEngine, DeliveryOutcome, EngineConfig, MessageRole};
use std::time::Duration;

use crate::support::{contents, instant_engine, single_chat};

fn one_second_per_unit() -> DeliveryEngine {
    let mut config = EngineConfig::instant();
    config.typing.base_delay_ms = 1_000;
    config.typing.max_delay_ms = 1_000;
    config.rng_seed = Some(5);
    DeliveryEngine::new(config)
}

#[tokio::test(start_paused = true)]
async fn units_land_one_typing_delay_apart() {
    let engine = one_second_per_unit();
    let conversation = single_chat();

    let task = tokio::spawn({
        let engine = engine.clone();
        let conversation = conversation.clone();
        async move { engine.deliver(&conversation, "one|||two|||three").await }
    });

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(contents(&conversation), vec!["one"]);
    assert_eq!(conversation.phase(), DeliveryPhase::Delivering);

    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(contents(&conversation), vec!["one", "two"]);

    let report = task.await.unwrap();
    assert_eq!(report.outcome, DeliveryOutcome::Completed);
    assert_eq!(contents(&conversation), vec!["one", "two", "three"]);
    assert_eq!(conversation.phase(), DeliveryPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn cancel_keeps_delivered_prefix_and_discards_the_rest() {
    let engine = one_second_per_unit();
    let conversation = single_chat();

    let task = tokio::spawn({
        let engine = engine.clone();
        let conversation = conversation.clone();
        async move { engine.deliver(&conversation, "one|||two|||three").await }
    });

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert!(engine.cancel(&conversation));
    assert_eq!(conversation.phase(), DeliveryPhase::Idle);

    let report = task.await.unwrap();
    assert_eq!(report.outcome, DeliveryOutcome::Cancelled);
    assert_eq!(report.delivered.len(), 1);
    assert_eq!(report.discarded, 2);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(contents(&conversation), vec!["one"]);
    assert!(conversation.lock().counters.cancelled);
}

#[tokio::test(start_paused = true)]
async fn second_turn_is_refused_while_first_delivers() {
    let engine = one_second_per_unit();
    let conversation = single_chat();

    let task = tokio::spawn({
        let engine = engine.clone();
        let conversation = conversation.clone();
        async move { engine.deliver(&conversation, "one|||two").await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    let refused = engine.deliver(&conversation, "intruder").await;
    assert!(refused.is_refused());

    task.await.unwrap();
    assert_eq!(contents(&conversation), vec!["one", "two"]);
}

#[tokio::test(start_paused = true)]
async fn new_turn_after_cancel_is_not_disturbed_by_the_old_one() {
    let engine = one_second_per_unit();
    let conversation = single_chat();

    let old = tokio::spawn({
        let engine = engine.clone();
        let conversation = conversation.clone();
        async move { engine.deliver(&conversation, "a|||b|||c").await }
    });
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    engine.cancel(&conversation);

    let fresh = engine.deliver(&conversation, "x|||y").await;
    assert_eq!(fresh.outcome, DeliveryOutcome::Completed);
    assert_eq!(old.await.unwrap().outcome, DeliveryOutcome::Cancelled);

    assert_eq!(contents(&conversation), vec!["a", "x", "y"]);
    assert_eq!(conversation.phase(), DeliveryPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn reroll_is_refused_while_delivering() {
    let engine = one_second_per_unit();
    let conversation = single_chat();

    let task = tokio::spawn({
        let engine = engine.clone();
        let conversation = conversation.clone();
        async move { engine.deliver(&conversation, "one|||two").await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    let err = engine.reroll(&conversation, None).await.unwrap_err();
    assert!(matches!(err, SequencerError::Busy(_)));
    task.await.unwrap();
}

#[tokio::test]
async fn reroll_replays_last_turn_after_player_message() {
    let engine = instant_engine(5);
    let conversation = single_chat();

    engine.player_say(&conversation, "how was work?").unwrap();
    engine.deliver(&conversation, "long day。tired").await;
    let first_ids: Vec<String> = conversation.messages().iter().map(|m| m.id.clone()).collect();

    let report = engine.reroll(&conversation, None).await.unwrap();

    assert_eq!(report.outcome, DeliveryOutcome::Completed);
    assert_eq!(contents(&conversation), vec!["how was work?", "long day。", "tired"]);
    let messages = conversation.messages();
    assert_eq!(messages[0].role, MessageRole::User);
    assert_ne!(messages[1].id, first_ids[1]);
}

#[tokio::test]
async fn reroll_leaves_earlier_assistant_turns_in_place() {
    let engine = instant_engine(5);
    let conversation = single_chat();

    engine.deliver(&conversation, "first turn").await;
    engine.deliver(&conversation, "second turn").await;

    let report = engine.reroll(&conversation, None).await.unwrap();

    assert_eq!(report.outcome, DeliveryOutcome::Completed);
    assert_eq!(contents(&conversation), vec!["first turn", "second turn"]);
    assert_eq!(report.delivered.len(), 1);
    assert_eq!(conversation.messages()[1].id, report.delivered[0]);
}

#[tokio::test]
async fn reroll_with_replacement_swaps_only_the_last_turn() {
    let engine = instant_engine(5);
    let conversation = single_chat();

    engine.deliver(&conversation, "morning").await;
    engine.player_say(&conversation, "and now?").unwrap();
    engine.deliver(&conversation, "wrong answer").await;

    engine.reroll(&conversation, Some("better answer")).await.unwrap();

    assert_eq!(contents(&conversation), vec!["morning", "and now?", "better answer"]);
}

#[tokio::test(start_paused = true)]
async fn reroll_removes_the_prefix_of_a_cancelled_turn() {
    let engine = one_second_per_unit();
    let conversation = single_chat();
    engine.deliver(&conversation, "kept").await;

    let task = tokio::spawn({
        let engine = engine.clone();
        let conversation = conversation.clone();
        async move { engine.deliver(&conversation, "a|||b|||c").await }
    });
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    engine.cancel(&conversation);
    task.await.unwrap();
    assert_eq!(contents(&conversation), vec!["kept", "a"]);

    engine.reroll(&conversation, None).await.unwrap();
    assert_eq!(contents(&conversation), vec!["kept", "a", "b", "c"]);
}

#[tokio::test(start_paused = true)]
async fn conversation_stays_delivering_between_reroll_removal_and_replay() {
    let engine = one_second_per_unit();
    let conversation = single_chat();
    engine.deliver(&conversation, "one|||two").await;

    let task = tokio::spawn({
        let engine = engine.clone();
        let conversation = conversation.clone();
        async move { engine.reroll(&conversation, None).await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(conversation.phase(), DeliveryPhase::Delivering);
    assert!(contents(&conversation).is_empty());
    assert!(engine.deliver(&conversation, "intruder").await.is_refused());

    let report = task.await.unwrap().unwrap();
    assert_eq!(report.outcome, DeliveryOutcome::Completed);
    assert_eq!(contents(&conversation), vec!["one", "two"]);
}
