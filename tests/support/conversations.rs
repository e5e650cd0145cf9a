#![allow(dead_code)]

use chatweave::config::LedgerConfig;
use chatweave::{Conversation, ConversationState, DeliveryEngine, EngineConfig, Participant, Roster};

pub fn instant_engine(seed: u64) -> DeliveryEngine {
    let mut config = EngineConfig::instant();
    config.rng_seed = Some(seed);
    DeliveryEngine::new(config)
}

pub fn single_chat() -> Conversation {
    Conversation::new(ConversationState::single(
        "dm-luna",
        Participant::player("me", "Me"),
        Participant::new("luna", "Luna").with_nickname("Lu"),
        &LedgerConfig::default(),
    ))
}

pub fn group_chat() -> Conversation {
    Conversation::new(ConversationState::group(
        "group-book-club",
        Roster::new(vec![
            Participant::player("me", "Me"),
            Participant::new("alice", "Alice"),
            Participant::new("bob", "Bob"),
            Participant::new("carol", "Carol"),
        ]),
        &LedgerConfig::default(),
    ))
}

pub fn contents(conversation: &Conversation) -> Vec<String> {
    conversation
        .messages()
        .into_iter()
        .map(|message| message.content)
        .collect()
}

pub fn speakers(conversation: &Conversation) -> Vec<String> {
    conversation
        .messages()
        .into_iter()
        .map(|message| message.sender_id.unwrap_or_default())
        .collect()
}
