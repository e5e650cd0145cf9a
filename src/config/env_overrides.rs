use super::EngineConfig;

impl EngineConfig {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("CHATWEAVE_MAX_UNITS")
            && let Ok(units) = value.parse::<usize>()
            && units > 0
        {
            self.flow.max_units_per_turn = units;
        }

        if let Ok(value) = std::env::var("CHATWEAVE_MAX_STREAK")
            && let Ok(streak) = value.parse::<usize>()
            && streak > 0
        {
            self.flow.max_consecutive_per_speaker = streak;
        }

        if let Ok(value) = std::env::var("CHATWEAVE_INSTANT")
            && matches!(value.as_str(), "1" | "true" | "yes")
        {
            let instant = Self::instant();
            self.typing = instant.typing;
            self.auto_claim.delay_ms = 0;
            self.auto_claim.member_claim_min_ms = 0;
            self.auto_claim.member_claim_max_ms = 0;
        }

        if let Ok(value) = std::env::var("CHATWEAVE_SEED")
            && let Ok(seed) = value.parse::<u64>()
        {
            self.rng_seed = Some(seed);
        }

        if let Ok(backend) = std::env::var("CHATWEAVE_OBSERVABILITY")
            && !backend.is_empty()
        {
            self.observability.backend = backend;
        }
    }
}
