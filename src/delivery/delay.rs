use rand::Rng;
use std::time::Duration;

use crate::config::TypingConfig;

/// Simulated typing time for a unit of `chars` characters.
///
/// `base + per_char * chars + jitter`, capped at `max_delay_ms`.
pub fn typing_delay<R: Rng + ?Sized>(chars: usize, config: &TypingConfig, rng: &mut R) -> Duration {
    let chars = u64::try_from(chars).unwrap_or(u64::MAX);
    let jitter = if config.jitter_ms == 0 {
        0
    } else {
        rng.random_range(0..=config.jitter_ms)
    };

    let ms = config
        .base_delay_ms
        .saturating_add(config.per_char_ms.saturating_mul(chars))
        .saturating_add(jitter)
        .min(config.max_delay_ms);
    Duration::from_millis(ms)
}

/// Voice bubble length shown by the client, derived from the spoken text.
pub fn voice_duration_secs(text: &str) -> u32 {
    let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
    chars.div_ceil(4).clamp(1, 60)
}
