//! In-process fan-out of client events.
//!
//! Transports (websocket, SSE, ...) subscribe to the hub and forward what they
//! receive. Publishing never blocks; an event published while nobody listens
//! is dropped, and a subscriber that falls more than `capacity` events behind
//! loses the oldest ones.

use agora_shared::events::BroadcastEvent;
use tokio::sync::broadcast;
use tracing::trace;

use crate::ports::NotificationPublisher;

#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<BroadcastEvent>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl NotificationPublisher for EventHub {
    fn publish(&self, event: BroadcastEvent) {
        match self.tx.send(event) {
            Ok(receivers) => trace!(receivers, "event published"),
            Err(broadcast::error::SendError(event)) => {
                trace!(event = %event.event, "event dropped, no subscribers");
            }
        }
    }
}
