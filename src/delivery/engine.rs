use arc_swap::ArcSwap;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::materialize::materialize;
use super::plan::{TurnPlan, plan_turn};
use super::unit::DeliveryUnit;
use crate::config::{ConfigHandle, EngineConfig};
use crate::conversation::{
    Conversation, ConversationMode, ConversationState, DeliveryPhase, MessageKind, MessagePayload, Presence,
    TurnCounters, TurnRecord,
};
use crate::directive::StickerSet;
use crate::error::SequencerError;
use crate::flow::FlowReport;
use crate::observability::{DeliveryEvent, DeliveryObserver, create_observer};
use crate::status::classify;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Every queued unit was delivered.
    Completed,
    /// The turn was interrupted; the rest of the queue was discarded.
    Cancelled,
    /// Another turn was already delivering. Nothing happened.
    Refused,
}

/// What happened during one call to [`DeliveryEngine::deliver`].
#[derive(Debug)]
pub struct DeliveryReport {
    pub outcome: DeliveryOutcome,
    /// Ids of the messages this turn appended, in order.
    pub delivered: Vec<String>,
    pub discarded: usize,
    pub flow: FlowReport,
    pub money_rejections: usize,
    /// Set when the status classifier changed presence after this turn.
    pub presence: Option<Presence>,
    /// Pending auto-claim for money the player sent the counterpart.
    pub auto_claim: Option<JoinHandle<()>>,
    /// Group mode: members grabbing red packets sent during this turn.
    pub member_claims: Vec<JoinHandle<()>>,
}

impl DeliveryReport {
    fn refused() -> Self {
        Self {
            outcome: DeliveryOutcome::Refused,
            delivered: Vec::new(),
            discarded: 0,
            flow: FlowReport::default(),
            money_rejections: 0,
            presence: None,
            auto_claim: None,
            member_claims: Vec::new(),
        }
    }

    pub fn is_refused(&self) -> bool {
        self.outcome == DeliveryOutcome::Refused
    }
}

/// A turn that has been planned and marked `Delivering`.
struct StartedTurn {
    conversation_id: String,
    generation: u64,
    token: CancellationToken,
    plan: TurnPlan,
}

struct EngineInner {
    config: ConfigHandle,
    stickers: ArcSwap<StickerSet>,
    observer: Arc<dyn DeliveryObserver>,
    rng: Mutex<StdRng>,
}

/// Drives conversations: plans turns, releases units on typing delays,
/// settles money and schedules automatic claims.
///
/// Cheap to clone; clones share config, sticker set, observer and RNG.
#[derive(Clone)]
pub struct DeliveryEngine {
    inner: Arc<EngineInner>,
}

impl DeliveryEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_config_handle(ConfigHandle::new(config))
    }

    pub fn with_config_handle(config: ConfigHandle) -> Self {
        let snapshot = config.load_full();
        let rng = match snapshot.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Self {
            inner: Arc::new(EngineInner {
                config,
                stickers: ArcSwap::from_pointee(StickerSet::new()),
                observer: Arc::from(create_observer(&snapshot.observability)),
                rng: Mutex::new(rng),
            }),
        }
    }

    /// Builder: replace the observer. Call before cloning the engine.
    pub fn with_observer(self, observer: Arc<dyn DeliveryObserver>) -> Self {
        let inner = Arc::try_unwrap(self.inner).unwrap_or_else(|shared| EngineInner {
            config: shared.config.clone(),
            stickers: ArcSwap::new(shared.stickers.load_full()),
            observer: Arc::clone(&shared.observer),
            rng: Mutex::new(StdRng::clone(&shared.rng())),
        });
        Self {
            inner: Arc::new(EngineInner { observer, ..inner }),
        }
    }

    pub fn with_stickers(self, stickers: StickerSet) -> Self {
        self.set_stickers(stickers);
        self
    }

    /// Swap the renderable sticker set. Turns already planned are unaffected.
    pub fn set_stickers(&self, stickers: StickerSet) {
        self.inner.stickers.store(Arc::new(stickers));
    }

    pub fn config(&self) -> &ConfigHandle {
        &self.inner.config
    }

    pub(crate) fn observer(&self) -> &dyn DeliveryObserver {
        self.inner.observer.as_ref()
    }

    pub(crate) fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.inner.rng()
    }

    /// Deliver one model turn into `conversation`.
    ///
    /// Refused without side effects while another turn is delivering.
    /// Resolves once the queue is drained or the turn is cancelled.
    pub async fn deliver(&self, conversation: &Conversation, raw: &str) -> DeliveryReport {
        let config = self.inner.config.load_full();
        let stickers = self.inner.stickers.load_full();

        let turn = {
            let mut state = conversation.lock();
            if state.is_delivering() {
                tracing::debug!(conversation = %state.id, "delivery refused; turn in progress");
                self.observer().record_event(&DeliveryEvent::TurnRefused {
                    conversation: state.id.clone(),
                });
                return DeliveryReport::refused();
            }
            self.begin_turn(&mut state, raw, &config, &stickers)
        };

        self.run_turn(conversation, &config, turn).await
    }

    /// Plan `raw` and move the conversation to `Delivering`. Caller holds
    /// the lock and has checked the conversation is idle.
    fn begin_turn(
        &self,
        state: &mut ConversationState,
        raw: &str,
        config: &EngineConfig,
        stickers: &StickerSet,
    ) -> StartedTurn {
        let plan = {
            let mut rng = self.rng();
            plan_turn(raw, state, config, stickers, &mut *rng)
        };

        let token = CancellationToken::new();
        state.phase = DeliveryPhase::Delivering;
        state.generation = state.generation.wrapping_add(1);
        state.cancel = Some(token.clone());
        state.last_turn = Some(TurnRecord::new(raw));
        state.counters = TurnCounters {
            units_queued: plan.units.len(),
            dropped_by_streak: plan.flow.dropped_by_streak,
            dropped_by_volume: plan.flow.dropped_by_volume,
            ..TurnCounters::default()
        };

        StartedTurn {
            conversation_id: state.id.clone(),
            generation: state.generation,
            token,
            plan,
        }
    }

    async fn run_turn(
        &self,
        conversation: &Conversation,
        config: &EngineConfig,
        turn: StartedTurn,
    ) -> DeliveryReport {
        let StartedTurn {
            conversation_id,
            generation,
            token,
            plan,
        } = turn;

        self.observer().record_event(&DeliveryEvent::TurnStarted {
            conversation: conversation_id.clone(),
            units: plan.units.len(),
        });
        if plan.flow != FlowReport::default() {
            self.observer().record_event(&DeliveryEvent::FlowTrimmed {
                conversation: conversation_id.clone(),
                dropped_by_streak: plan.flow.dropped_by_streak,
                dropped_by_volume: plan.flow.dropped_by_volume,
            });
        }

        let started = Instant::now();
        let mut report = self
            .drain(conversation, config, generation, &token, plan.units.into())
            .await;
        report.flow = plan.flow;

        if report.outcome == DeliveryOutcome::Cancelled {
            self.observer().record_event(&DeliveryEvent::TurnCancelled {
                conversation: conversation_id,
                discarded: report.discarded,
            });
            return report;
        }

        self.observer().record_event(&DeliveryEvent::TurnFinished {
            conversation: conversation_id,
            delivered: report.delivered.len(),
            duration: started.elapsed(),
        });
        self.after_turn(conversation, config, &mut report);
        report
    }

    async fn drain(
        &self,
        conversation: &Conversation,
        config: &EngineConfig,
        generation: u64,
        token: &CancellationToken,
        mut queue: VecDeque<DeliveryUnit>,
    ) -> DeliveryReport {
        let mut delivered = Vec::with_capacity(queue.len());
        let mut money_rejections = 0;
        let mut cancelled = false;

        while let Some(unit) = queue.pop_front() {
            tokio::select! {
                biased;
                () = token.cancelled() => {
                    queue.push_front(unit);
                    cancelled = true;
                    break;
                }
                () = tokio::time::sleep(unit.delay) => {}
            }

            let appended = {
                let mut state = conversation.lock();
                if token.is_cancelled() || state.generation != generation {
                    None
                } else {
                    let out = materialize(unit.clone(), &mut state, config);
                    if let Some(err) = &out.rejection {
                        money_rejections += 1;
                        state.counters.money_rejections += 1;
                        self.observer().record_event(&DeliveryEvent::MoneyRejected {
                            conversation: state.id.clone(),
                            speaker: unit.speaker_id.clone(),
                            reason: err.to_string(),
                        });
                    }
                    state.counters.units_delivered += 1;
                    if let Some(turn) = state.last_turn.as_mut() {
                        turn.message_ids.push(out.message.id.clone());
                    }
                    state.append(out.message.clone());
                    Some((state.id.clone(), out.message))
                }
            };

            let Some((conversation_id, message)) = appended else {
                queue.push_front(unit);
                cancelled = true;
                break;
            };
            delivered.push(message.id.clone());
            self.observer().record_event(&DeliveryEvent::MessageAppended {
                conversation: conversation_id,
                message,
            });
        }

        if !cancelled {
            let mut state = conversation.lock();
            if state.generation == generation {
                state.phase = DeliveryPhase::Idle;
                state.cancel = None;
            }
        }

        DeliveryReport {
            outcome: if cancelled {
                DeliveryOutcome::Cancelled
            } else {
                DeliveryOutcome::Completed
            },
            delivered,
            discarded: queue.len(),
            flow: FlowReport::default(),
            money_rejections,
            presence: None,
            auto_claim: None,
            member_claims: Vec::new(),
        }
    }

    /// Follow-ups once a turn has fully delivered: presence and auto-claim
    /// in single mode, member claims in group mode.
    fn after_turn(&self, conversation: &Conversation, config: &EngineConfig, report: &mut DeliveryReport) {
        let mode = conversation.lock().mode;
        if mode == ConversationMode::Group {
            let packets: Vec<String> = conversation
                .lock()
                .messages
                .iter()
                .filter(|m| report.delivered.contains(&m.id))
                .filter_map(|m| match &m.payload {
                    MessagePayload::RedPacket { packet_id, .. } => Some(packet_id.clone()),
                    _ => None,
                })
                .collect();
            for packet_id in packets {
                report
                    .member_claims
                    .extend(self.schedule_member_claims(conversation, &packet_id));
            }
            return;
        }

        let (conversation_id, presence, pending) = {
            let mut state = conversation.lock();

            let text: Vec<&str> = state
                .messages
                .iter()
                .filter(|m| report.delivered.contains(&m.id))
                .filter(|m| matches!(m.kind, MessageKind::Text | MessageKind::QuotedText))
                .map(|m| m.content.as_str())
                .collect();
            let presence = classify(&text.join("\n"), &config.status)
                .filter(|presence| *presence != state.presence);
            if let Some(presence) = presence {
                state.presence = presence;
            }

            let pending = match (state.counterpart(), state.player_id()) {
                (Some(counterpart), Some(player)) if config.auto_claim.enabled => {
                    let items = state.ledger.pending_for(&counterpart.id, player);
                    (!items.is_empty()).then(|| (counterpart.id.clone(), player.to_string()))
                }
                _ => None,
            };
            (state.id.clone(), presence, pending)
        };

        if let Some(presence) = presence {
            tracing::info!(conversation = %conversation_id, %presence, "presence inferred from turn");
            self.observer().record_event(&DeliveryEvent::PresenceChanged {
                conversation: conversation_id,
                presence,
            });
            report.presence = Some(presence);
        }

        if let Some((claimant, from)) = pending {
            report.auto_claim = Some(self.spawn_auto_claim(
                conversation.clone(),
                claimant,
                from,
                Duration::from_millis(config.auto_claim.delay_ms),
            ));
        }
    }

    /// Interrupt the delivering turn. Returns `false` when idle.
    ///
    /// Already-appended messages stay; the rest of the queue is discarded and
    /// the conversation is idle when this returns.
    pub fn cancel(&self, conversation: &Conversation) -> bool {
        let mut state = conversation.lock();
        if !state.is_delivering() {
            return false;
        }
        if let Some(token) = state.cancel.take() {
            token.cancel();
        }
        state.phase = DeliveryPhase::Idle;
        state.counters.cancelled = true;
        tracing::info!(conversation = %state.id, "delivery cancelled");
        true
    }

    /// Discard the last turn's assistant messages and deliver again.
    ///
    /// Uses `replacement` when given, otherwise replays the last raw turn.
    /// Money the removed messages moved is returned if nobody collected it.
    pub async fn reroll(
        &self,
        conversation: &Conversation,
        replacement: Option<&str>,
    ) -> Result<DeliveryReport, SequencerError> {
        let config = self.inner.config.load_full();
        let stickers = self.inner.stickers.load_full();

        let turn = {
            let mut state = conversation.lock();
            if state.is_delivering() {
                return Err(SequencerError::Busy(state.id.clone()));
            }
            let raw = replacement
                .map(str::to_string)
                .or_else(|| state.last_turn.as_ref().map(|turn| turn.raw.clone()))
                .ok_or_else(|| SequencerError::NothingToReroll(state.id.clone()))?;

            let removed = state.take_last_turn_messages();
            for message in &removed {
                match &message.payload {
                    MessagePayload::Transfer { transfer_id, .. } => {
                        if let Err(err) = state.ledger.refund_transfer(transfer_id) {
                            tracing::debug!(transfer = %transfer_id, error = %err, "transfer kept on reroll");
                        }
                    }
                    MessagePayload::RedPacket { packet_id, .. } => {
                        if let Err(err) = state.ledger.refund_red_packet(packet_id) {
                            tracing::debug!(packet = %packet_id, error = %err, "red packet kept on reroll");
                        }
                    }
                    _ => {}
                }
            }

            self.observer().record_event(&DeliveryEvent::Rerolled {
                conversation: state.id.clone(),
                removed: removed.len(),
            });
            // Still under the lock, so no other turn can start before the replay.
            self.begin_turn(&mut state, &raw, &config, &stickers)
        };

        Ok(self.run_turn(conversation, &config, turn).await)
    }
}

impl EngineInner {
    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
