use super::traits::{DeliveryEvent, DeliveryObserver};

/// Zero-overhead observer; every method compiles to nothing.
pub struct NoopObserver;

impl DeliveryObserver for NoopObserver {
    #[inline(always)]
    fn record_event(&self, _event: &DeliveryEvent) {}

    fn name(&self) -> &str {
        "noop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_name() {
        assert_eq!(NoopObserver.name(), "noop");
    }

    #[test]
    fn noop_record_event_does_not_panic() {
        NoopObserver.record_event(&DeliveryEvent::TurnRefused {
            conversation: "c1".into(),
        });
        NoopObserver.flush();
    }
}
