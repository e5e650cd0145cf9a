use crate::config::FlowConfig;
use crate::conversation::ConversationMode;

/// Anything the flow controller can filter by speaker.
pub trait Attributed {
    fn speaker_id(&self) -> &str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowReport {
    pub dropped_by_streak: usize,
    pub dropped_by_volume: usize,
}

/// Caps one turn: consecutive units per speaker (group mode) and total units.
#[derive(Debug, Clone)]
pub struct FlowController {
    max_units: usize,
    max_streak: Option<usize>,
}

impl FlowController {
    pub fn new(config: &FlowConfig, mode: ConversationMode) -> Self {
        Self {
            max_units: config.max_units_per_turn,
            max_streak: (mode == ConversationMode::Group)
                .then_some(config.max_consecutive_per_speaker),
        }
    }

    /// Filter `units` in order. Units dropped for streak still extend the
    /// streak; nothing is ever reordered.
    pub fn apply<T: Attributed>(&self, units: Vec<T>) -> (Vec<T>, FlowReport) {
        let mut report = FlowReport::default();
        let mut kept = Vec::with_capacity(units.len().min(self.max_units));
        let mut streak_speaker: Option<String> = None;
        let mut streak = 0usize;

        for unit in units {
            if streak_speaker.as_deref() == Some(unit.speaker_id()) {
                streak += 1;
            } else {
                streak_speaker = Some(unit.speaker_id().to_string());
                streak = 1;
            }

            if let Some(cap) = self.max_streak
                && streak > cap
            {
                report.dropped_by_streak += 1;
                continue;
            }
            kept.push(unit);
        }

        if kept.len() > self.max_units {
            report.dropped_by_volume = kept.len() - self.max_units;
            kept.truncate(self.max_units);
        }

        if report != FlowReport::default() {
            tracing::debug!(
                dropped_by_streak = report.dropped_by_streak,
                dropped_by_volume = report.dropped_by_volume,
                kept = kept.len(),
                "flow control trimmed turn"
            );
        }
        (kept, report)
    }
}
