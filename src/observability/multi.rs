use super::traits::{DeliveryEvent, DeliveryObserver};
use std::sync::Arc;

/// Fans every event out to several observers, in order.
pub struct MultiObserver {
    observers: Vec<Arc<dyn DeliveryObserver>>,
}

impl MultiObserver {
    pub fn new(observers: Vec<Arc<dyn DeliveryObserver>>) -> Self {
        Self { observers }
    }
}

impl DeliveryObserver for MultiObserver {
    fn record_event(&self, event: &DeliveryEvent) {
        for observer in &self.observers {
            observer.record_event(event);
        }
    }

    fn flush(&self) {
        for observer in &self.observers {
            observer.flush();
        }
    }

    fn name(&self) -> &str {
        "multi"
    }
}
