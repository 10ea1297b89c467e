//! Broadcast event sink.

use tokio::sync::broadcast;
use tracing::trace;

use equipreg_core::constants::DEFAULT_EVENT_BUFFER;
use equipreg_core::error::Result;
use equipreg_core::traits::EventSink;
use equipreg_core::types::RegistrationEvent;

/// Fan-out of registration events to any number of subscribers.
///
/// Cloning is cheap and every clone feeds the same channel, so one clone can
/// be handed to the registry as its sink while others are kept for
/// subscribing. Subscribers only see events committed after they subscribed.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<RegistrationEvent>,
}

impl EventBus {
    /// Creates a bus with the default buffer.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_BUFFER)
    }

    /// Creates a bus buffering up to `capacity` events per subscriber.
    ///
    /// A zero capacity is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to events committed from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistrationEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for EventBus {
    fn publish(&self, event: &RegistrationEvent) -> Result<()> {
        // No subscribers is normal: the event is simply not observed
        match self.sender.send(event.clone()) {
            Ok(receivers) => trace!(sequence = event.sequence, receivers, "Event broadcast"),
            Err(_) => trace!(sequence = event.sequence, "No event subscribers"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use equipreg_core::types::Principal;
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    fn event(sequence: u64) -> RegistrationEvent {
        RegistrationEvent::new(sequence, sequence * 10, "Drill", Principal::new("ea").unwrap(), "Qm")
    }

    #[test]
    fn test_publish_without_subscribers_is_ok() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);
        assert!(bus.publish(&event(1)).is_ok());
    }

    #[test]
    fn test_subscribers_receive_in_order() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.clone().subscribe();

        bus.publish(&event(1)).unwrap();
        bus.publish(&event(2)).unwrap();

        for rx in [&mut a, &mut b] {
            assert_eq!(rx.try_recv().unwrap().sequence, 1);
            assert_eq!(rx.try_recv().unwrap().sequence, 2);
            assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        }
    }

    #[test]
    fn test_late_subscriber_misses_earlier_events() {
        let bus = EventBus::new();
        bus.publish(&event(1)).unwrap();

        let mut rx = bus.subscribe();
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_slow_subscriber_lags() {
        let bus = EventBus::with_capacity(2);
        let mut rx = bus.subscribe();

        for seq in 1..=4 {
            bus.publish(&event(seq)).unwrap();
        }

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(2))));
        assert_eq!(rx.recv().await.unwrap().sequence, 3);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let bus = EventBus::with_capacity(0);
        let mut rx = bus.subscribe();
        bus.publish(&event(1)).unwrap();
        assert_eq!(rx.try_recv().unwrap().sequence, 1);
    }
}
