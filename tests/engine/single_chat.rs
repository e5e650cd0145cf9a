use chatweave::conversation::MessageRole;
use chatweave::{DeliveryOutcome, MessageKind, MessagePayload, Presence, StickerSet};
use rust_decimal::Decimal;

use crate::support::{contents, instant_engine, single_chat};

#[tokio::test]
async fn multi_sentence_reply_arrives_as_separate_messages() {
    let engine = instant_engine(1);
    let conversation = single_chat();

    let report = engine.deliver(&conversation, "A。B！").await;

    assert_eq!(report.outcome, DeliveryOutcome::Completed);
    assert_eq!(contents(&conversation), vec!["A。", "B！"]);
    assert!(
        conversation
            .messages()
            .iter()
            .all(|m| m.role == MessageRole::Assistant && m.is_from("luna"))
    );
}

#[tokio::test]
async fn decorative_markers_never_reach_the_log() {
    let engine = instant_engine(1);
    let conversation = single_chat();

    engine.deliver(&conversation, "[wink] see you at eight").await;

    assert_eq!(contents(&conversation), vec!["see you at eight"]);
}

#[tokio::test]
async fn empty_turn_delivers_placeholder() {
    let engine = instant_engine(1);
    let conversation = single_chat();

    engine.deliver(&conversation, "[wink][smile]").await;

    assert_eq!(contents(&conversation), vec!["…"]);
}

#[tokio::test]
async fn rich_messages_keep_their_kind() {
    let engine = instant_engine(1).with_stickers(["happy!"].into_iter().collect::<StickerSet>());
    let conversation = single_chat();

    engine
        .deliver(
            &conversation,
            "[voice]miss you|||[sticker:happy!]|||[location]Shibuya station|||[image]a cat on the sofa",
        )
        .await;

    let kinds: Vec<MessageKind> = conversation.messages().iter().map(|m| m.kind).collect();
    assert_eq!(
        kinds,
        vec![
            MessageKind::Voice,
            MessageKind::Sticker,
            MessageKind::Location,
            MessageKind::Image
        ]
    );
    assert_eq!(contents(&conversation)[1], "happy!");
}

#[tokio::test]
async fn sticker_name_punctuation_never_splits_it() {
    let engine = instant_engine(1).with_stickers(["happy!"].into_iter().collect::<StickerSet>());
    let conversation = single_chat();

    engine.deliver(&conversation, "[sticker:happy!]").await;

    let messages = conversation.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind, MessageKind::Sticker);
    assert_eq!(messages[0].content, "happy!");
}

#[tokio::test]
async fn unavailable_sticker_falls_back_to_its_name() {
    let engine = instant_engine(1);
    let conversation = single_chat();

    engine.deliver(&conversation, "[sticker:angry]").await;

    let messages = conversation.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind, MessageKind::Text);
    assert_eq!(messages[0].content, "angry");
}

#[tokio::test]
async fn character_transfer_moves_money_to_pending() {
    let engine = instant_engine(1);
    let conversation = single_chat();

    engine
        .deliver(&conversation, "buy yourself dinner|||[transfer:52]")
        .await;

    let messages = conversation.messages();
    let MessagePayload::Transfer {
        transfer_id,
        recipient_id,
        ..
    } = &messages[1].payload
    else {
        panic!("expected a transfer message");
    };
    assert_eq!(recipient_id, "me");
    assert_eq!(
        conversation.lock().ledger.balance("luna"),
        Some(Decimal::new(948, 0))
    );

    engine
        .player_accept_transfer(&conversation, transfer_id)
        .unwrap();
    assert_eq!(
        conversation.lock().ledger.balance("me"),
        Some(Decimal::new(1_052, 0))
    );
}

#[tokio::test]
async fn unaffordable_transfer_becomes_fallback_text() {
    let engine = instant_engine(1);
    let conversation = single_chat();

    let report = engine.deliver(&conversation, "[transfer:99999]").await;

    assert_eq!(report.money_rejections, 1);
    let messages = conversation.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind, MessageKind::Text);
    assert_eq!(
        messages[0].content,
        engine.config().load().text.insufficient_funds_fallback
    );
    assert_eq!(
        conversation.lock().ledger.balance("luna"),
        Some(Decimal::new(1_000, 0))
    );
}

#[tokio::test]
async fn counterpart_collects_player_money_after_replying() {
    let engine = instant_engine(1);
    let conversation = single_chat();

    engine
        .player_send_transfer(&conversation, Decimal::new(20, 0), None)
        .unwrap();
    let report = engine.deliver(&conversation, "thank you!").await;

    report.auto_claim.expect("auto-claim scheduled").await.unwrap();

    assert_eq!(
        conversation.lock().ledger.balance("luna"),
        Some(Decimal::new(1_020, 0))
    );
    let last = conversation.messages().pop().unwrap();
    assert_eq!(last.role, MessageRole::System);
    assert_eq!(last.content, "Lu accepted a transfer of ¥20.00");
}

#[tokio::test]
async fn auto_claim_can_be_disabled() {
    let mut config = chatweave::EngineConfig::instant();
    config.auto_claim.enabled = false;
    let engine = chatweave::DeliveryEngine::new(config);
    let conversation = single_chat();

    engine
        .player_send_transfer(&conversation, Decimal::new(20, 0), None)
        .unwrap();
    let report = engine.deliver(&conversation, "thank you!").await;

    assert!(report.auto_claim.is_none());
}

#[tokio::test]
async fn sign_off_marks_counterpart_offline() {
    let engine = instant_engine(1);
    let conversation = single_chat();

    let report = engine.deliver(&conversation, "好困，睡了。晚安").await;

    assert_eq!(report.presence, Some(Presence::Offline));
    assert_eq!(conversation.presence(), Presence::Offline);
}

#[tokio::test]
async fn questions_do_not_change_presence() {
    let engine = instant_engine(1);
    let conversation = single_chat();

    let report = engine.deliver(&conversation, "are you busy?").await;

    assert_eq!(report.presence, None);
    assert_eq!(conversation.presence(), Presence::Online);
}
