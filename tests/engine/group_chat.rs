use chatweave::{MessageKind, MessagePayload};
use rust_decimal::Decimal;

use crate::support::{contents, group_chat, instant_engine, speakers};

#[tokio::test]
async fn speakers_on_one_line_are_split() {
    let engine = instant_engine(2);
    let conversation = group_chat();

    engine.deliver(&conversation, "Alice: hi Bob：yo").await;

    assert_eq!(contents(&conversation), vec!["hi", "yo"]);
    assert_eq!(speakers(&conversation), vec!["alice", "bob"]);
}

#[tokio::test]
async fn alternating_speakers_keep_their_order() {
    let engine = instant_engine(2);
    let conversation = group_chat();

    let report = engine
        .deliver(&conversation, "Alice: hi\nBob: yo\nAlice: again")
        .await;

    assert_eq!(contents(&conversation), vec!["hi", "yo", "again"]);
    assert_eq!(speakers(&conversation), vec!["alice", "bob", "alice"]);
    assert_eq!(report.flow.dropped_by_streak, 0);
}

#[tokio::test]
async fn one_speaker_cannot_monopolize_the_turn() {
    let engine = instant_engine(2);
    let conversation = group_chat();

    let report = engine
        .deliver(&conversation, "Alice: 1|||2|||3|||4\nBob: ok")
        .await;

    assert_eq!(contents(&conversation), vec!["1", "2", "ok"]);
    assert_eq!(report.flow.dropped_by_streak, 2);
    assert_eq!(conversation.lock().counters.dropped_by_streak, 2);
}

#[tokio::test]
async fn model_never_speaks_as_the_player() {
    let engine = instant_engine(2);
    let conversation = group_chat();

    engine
        .deliver(&conversation, "Alice: morning\nMe: I'm the player now")
        .await;

    let senders = speakers(&conversation);
    assert!(!senders.is_empty());
    assert!(senders.iter().all(|s| s == "alice"));
}

#[tokio::test]
async fn unknown_leading_speaker_is_discarded() {
    let engine = instant_engine(2);
    let conversation = group_chat();

    engine.deliver(&conversation, "Zed: hi\nBob: hey").await;

    assert_eq!(contents(&conversation), vec!["hey"]);
    assert_eq!(speakers(&conversation), vec!["bob"]);
}

#[tokio::test]
async fn missing_sticker_is_dropped_in_groups() {
    let engine = instant_engine(2);
    let conversation = group_chat();

    engine
        .deliver(&conversation, "Carol: [sticker:angry]|||fine")
        .await;

    assert_eq!(contents(&conversation), vec!["fine"]);
}

#[tokio::test]
async fn character_lucky_packet_is_shared_with_everyone_else() {
    let engine = instant_engine(2);
    let conversation = group_chat();

    let report = engine
        .deliver(&conversation, "Alice: [redpacket:9]Happy Friday")
        .await;

    let message = conversation.messages().remove(0);
    assert_eq!(message.kind, MessageKind::RedPacket);
    let MessagePayload::RedPacket { packet_id, .. } = message.payload else {
        panic!("expected red packet payload");
    };

    assert_eq!(report.member_claims.len(), 2);
    for handle in report.member_claims {
        handle.await.unwrap();
    }

    let outcome = engine.player_claim(&conversation, &packet_id).unwrap();
    assert!(outcome.is_new());

    let state = conversation.lock();
    let packet = state.ledger.packet(&packet_id).unwrap();
    assert!(packet.is_exhausted());
    assert_eq!(packet.claims.len(), 3);
    assert_eq!(packet.claimed_total(), Decimal::new(9, 0));
    assert!(packet.claims.iter().all(|c| c.amount >= Decimal::new(1, 2)));
    assert!(packet.claim_of("alice").is_none());
}

#[tokio::test]
async fn exclusive_packet_turns_others_away() {
    let engine = instant_engine(2);
    let conversation = group_chat();

    let report = engine
        .deliver(&conversation, "Alice: [redpacket:5:Bob]for the tickets")
        .await;
    for handle in report.member_claims {
        handle.await.unwrap();
    }

    let state = conversation.lock();
    let packet = &state.ledger.packets()[0];
    assert_eq!(packet.recipient_id.as_deref(), Some("bob"));
    assert_eq!(packet.claims.len(), 1);
    assert_eq!(packet.claims[0].participant_id, "bob");
    assert_eq!(state.ledger.balance("bob"), Some(Decimal::new(1_005, 0)));
    assert_eq!(state.ledger.balance("carol"), Some(Decimal::new(1_000, 0)));
}

#[tokio::test]
async fn roster_name_inside_a_quote_stays_in_the_quote() {
    let engine = instant_engine(2);
    let conversation = group_chat();

    engine
        .deliver(&conversation, "Alice: [quote:Carol:ask Bob: now]sure")
        .await;

    assert_eq!(contents(&conversation), vec!["sure"]);
    assert_eq!(speakers(&conversation), vec!["alice"]);
    let messages = conversation.messages();
    let quoted = messages[0].quoted.as_ref().unwrap();
    assert_eq!(quoted.name, "Carol");
    assert_eq!(quoted.content, "ask Bob: now");
}
