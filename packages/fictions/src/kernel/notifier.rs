//! Fire-and-forget event dispatch.
//!
//! Actions hand events to the `Notifier`; a background worker forwards them
//! to the `StreamHub`. Failures are logged and never reach the request.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domains::fictions::events::FictionEvent;
use crate::kernel::stream_hub::StreamHub;

#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<FictionEvent>,
}

impl Notifier {
    /// Spawns the forwarding worker on the current runtime.
    pub fn spawn(hub: StreamHub) -> Self {
        let (notifier, rx) = Self::channel();
        tokio::spawn(forward(rx, hub));
        notifier
    }

    /// A notifier whose events are read straight from the returned receiver.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<FictionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn notify(&self, event: FictionEvent) {
        debug!(event = ?event, "dispatching event");
        if let Err(e) = self.tx.send(event) {
            warn!(event = ?e.0, "event dropped, dispatcher is gone");
        }
    }

    pub fn notify_all(&self, events: impl IntoIterator<Item = FictionEvent>) {
        for event in events {
            self.notify(event);
        }
    }
}

async fn forward(mut rx: mpsc::UnboundedReceiver<FictionEvent>, hub: StreamHub) {
    while let Some(event) = rx.recv().await {
        if let Err(e) = hub.publish_event(&event).await {
            warn!(error = %e, topic = %event.topic(), "failed to publish event");
        }
    }
    debug!("event dispatcher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ComponentId, FictionId};

    #[tokio::test]
    async fn test_worker_forwards_to_hub() {
        let hub = StreamHub::new();
        let mut rx = hub.subscribe_component(ComponentId::new(2)).await;
        let notifier = Notifier::spawn(hub);

        notifier.notify(FictionEvent::FictionVoted {
            component_id: ComponentId::new(2),
            fiction_id: FictionId::new(8),
            voter_id: crate::common::UserId::new(3),
        });

        let payload = rx.recv().await.unwrap();
        assert_eq!(payload["type"], "fiction_voted");
        assert_eq!(payload["fiction_id"], 8);
    }

    #[test]
    fn test_closed_channel_does_not_panic() {
        let (notifier, rx) = Notifier::channel();
        drop(rx);
        notifier.notify(FictionEvent::CreationEnabled {
            component_id: ComponentId::new(1),
        });
    }
}
