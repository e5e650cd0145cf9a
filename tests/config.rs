use chatweave::config::{ConfigHandle, LedgerConfig};
use chatweave::{Conversation, ConversationState, DeliveryEngine, EngineConfig, Participant};
use std::fs;

fn write_config(path: &std::path::Path, max_units: usize) {
    fs::write(
        path,
        format!(
            r#"
rng_seed = 11

[flow]
max_units_per_turn = {max_units}

[typing]
base_delay_ms = 0
per_char_ms = 0
jitter_ms = 0
max_delay_ms = 0

[text]
empty_turn_placeholder = "(silence)"
"#
        ),
    )
    .unwrap();
}

fn conversation() -> Conversation {
    Conversation::new(ConversationState::single(
        "c1",
        Participant::player("me", "Me"),
        Participant::new("luna", "Luna"),
        &LedgerConfig::default(),
    ))
}

#[tokio::test]
async fn file_config_drives_the_engine_and_reloads_live() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.toml");
    write_config(&path, 2);

    let handle = ConfigHandle::new(EngineConfig::load_from_path(&path).unwrap());
    let engine = DeliveryEngine::with_config_handle(handle.clone());
    let conv = conversation();

    let report = engine.deliver(&conv, "a|||b|||c").await;
    assert_eq!(report.delivered.len(), 2);
    assert_eq!(report.flow.dropped_by_volume, 1);

    write_config(&path, 5);
    handle.reload().unwrap();

    let report = engine.deliver(&conv, "d|||e|||f").await;
    assert_eq!(report.delivered.len(), 3);

    engine.deliver(&conv, "[wink]").await;
    assert_eq!(conv.messages().last().unwrap().content, "(silence)");
}

#[test]
fn invalid_file_is_rejected_with_context() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.toml");
    write_config(&path, 0);

    let err = EngineConfig::load_from_path(&path).unwrap_err();
    assert!(format!("{err:#}").contains("max_units_per_turn"));
}
