//! Things the player does: messages and money sent from the client side.

use rust_decimal::Decimal;
use tokio::task::JoinHandle;

use super::engine::DeliveryEngine;
use super::materialize::format_amount;
use crate::conversation::{
    Conversation, ConversationMode, ConversationState, Message, MessageKind, MessagePayload,
    MessageRole,
};
use crate::error::{EngineError, LedgerError, SequencerError};
use crate::ledger::{ClaimOutcome, PacketTarget};
use crate::observability::DeliveryEvent;

impl DeliveryEngine {
    /// Append a plain player message.
    pub fn player_say(
        &self,
        conversation: &Conversation,
        text: &str,
    ) -> Result<Message, EngineError> {
        self.player_append(conversation, |_state, player| {
            Ok(Message::text(MessageRole::User, player, text))
        })
    }

    /// Send money to `recipient_id`, or to the counterpart in single mode.
    pub fn player_send_transfer(
        &self,
        conversation: &Conversation,
        amount: Decimal,
        recipient_id: Option<&str>,
    ) -> Result<Message, EngineError> {
        let config = self.config().load_full();
        self.player_append(conversation, |state, player| {
            let recipient = player_recipient(state, player, recipient_id)?;
            let transfer = state.ledger.create_transfer(player, &recipient, amount)?;
            Ok(Message::new(
                MessageRole::User,
                Some(player.to_string()),
                MessageKind::Transfer,
                format_amount(&config.ledger.currency_symbol, transfer.amount),
                MessagePayload::Transfer {
                    transfer_id: transfer.id,
                    amount: transfer.amount,
                    recipient_id: recipient,
                },
            ))
        })
    }

    /// Send a red packet. Without a target it goes to the counterpart in
    /// single mode and to every member as a lucky packet in group mode.
    ///
    /// In group mode the members' claims are scheduled right away.
    pub fn player_send_red_packet(
        &self,
        conversation: &Conversation,
        amount: Decimal,
        target: Option<PacketTarget>,
        greeting: Option<&str>,
    ) -> Result<(Message, Vec<JoinHandle<()>>), EngineError> {
        let config = self.config().load_full();
        let message = self.player_append(conversation, |state, player| {
            let target = match target {
                Some(PacketTarget::Exclusive { recipient_id }) => PacketTarget::Exclusive {
                    recipient_id: player_recipient(state, player, Some(&recipient_id))?,
                },
                Some(lucky) => lucky,
                None => default_player_target(state, player)?,
            };
            let greeting = greeting
                .filter(|g| !g.trim().is_empty())
                .unwrap_or(config.ledger.default_greeting.as_str());
            let packet = state.ledger.create_red_packet(player, amount, target, greeting)?;
            Ok(Message::new(
                MessageRole::User,
                Some(player.to_string()),
                MessageKind::RedPacket,
                greeting,
                MessagePayload::RedPacket {
                    packet_id: packet.id,
                    kind: packet.kind,
                    amount: packet.total_amount,
                    greeting: greeting.to_string(),
                },
            ))
        })?;

        let mode = conversation.lock().mode;
        let handles = match (&message.payload, mode) {
            (MessagePayload::RedPacket { packet_id, .. }, ConversationMode::Group) => {
                self.schedule_member_claims(conversation, packet_id)
            }
            _ => Vec::new(),
        };
        Ok((message, handles))
    }

    /// Accept a transfer addressed to the player and announce it.
    pub fn player_accept_transfer(
        &self,
        conversation: &Conversation,
        transfer_id: &str,
    ) -> Result<Message, EngineError> {
        let config = self.config().load_full();
        let (conversation_id, player, amount, message) = {
            let mut state = conversation.lock();
            let player = state
                .player_id()
                .map(str::to_string)
                .ok_or_else(|| SequencerError::UnknownParticipant("player".into()))?;
            let transfer = state.ledger.accept_transfer(transfer_id, &player)?;
            let name = state.display_name(&player).to_string();
            let message = Message::system(config.text.transfer_accepted(
                &name,
                transfer.amount,
                &config.ledger.currency_symbol,
            ));
            state.append(message.clone());
            (state.id.clone(), player, transfer.amount, message)
        };

        self.observer().record_event(&DeliveryEvent::ClaimSettled {
            conversation: conversation_id.clone(),
            participant: player,
            amount,
        });
        self.observer().record_event(&DeliveryEvent::MessageAppended {
            conversation: conversation_id,
            message: message.clone(),
        });
        Ok(message)
    }

    /// Claim a red packet as the player.
    pub fn player_claim(
        &self,
        conversation: &Conversation,
        packet_id: &str,
    ) -> Result<ClaimOutcome, EngineError> {
        let player = conversation
            .lock()
            .player_id()
            .map(str::to_string)
            .ok_or_else(|| SequencerError::UnknownParticipant("player".into()))?;
        Ok(self.claim_packet(conversation, packet_id, &player)?)
    }

    fn player_append<F>(&self, conversation: &Conversation, build: F) -> Result<Message, EngineError>
    where
        F: FnOnce(&mut ConversationState, &str) -> Result<Message, EngineError>,
    {
        let (conversation_id, message) = {
            let mut state = conversation.lock();
            let player = state
                .player_id()
                .map(str::to_string)
                .ok_or_else(|| SequencerError::UnknownParticipant("player".into()))?;
            let message = build(&mut state, &player)?;
            state.append(message.clone());
            (state.id.clone(), message)
        };

        self.observer().record_event(&DeliveryEvent::MessageAppended {
            conversation: conversation_id,
            message: message.clone(),
        });
        Ok(message)
    }
}

fn player_recipient(
    state: &ConversationState,
    player: &str,
    recipient_id: Option<&str>,
) -> Result<String, EngineError> {
    match recipient_id {
        Some(id) => match state.roster.get(id) {
            Some(participant) if participant.id != player => Ok(participant.id.clone()),
            _ => Err(SequencerError::UnknownParticipant(id.to_string()).into()),
        },
        None if state.mode == ConversationMode::Single => state
            .counterpart()
            .map(|c| c.id.clone())
            .ok_or_else(|| LedgerError::MissingRecipient.into()),
        None => Err(LedgerError::MissingRecipient.into()),
    }
}

fn default_player_target(state: &ConversationState, player: &str) -> Result<PacketTarget, EngineError> {
    match state.mode {
        ConversationMode::Single => Ok(PacketTarget::Exclusive {
            recipient_id: player_recipient(state, player, None)?,
        }),
        ConversationMode::Group => {
            let members = state.roster.members().count().max(1);
            let count = u32::try_from(members).map_err(|_| LedgerError::InvalidCount)?;
            Ok(PacketTarget::Lucky { count })
        }
    }
}
