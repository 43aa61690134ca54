use crate::Manager;
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;
use std::sync::Arc;

/// Bridges the in-process event bus to the SSE relay: every domain event
/// published on the bus is broadcast to all registered subscriptions.
///
/// Recipient selection is deliberately absent here; the relay fans out and
/// each subscription's handler decides between live delivery and queueing.
pub struct SseDomainEventHandler {
    sse_manager: Arc<Manager>,
}

impl SseDomainEventHandler {
    pub fn new(sse_manager: Arc<Manager>) -> Self {
        Self { sse_manager }
    }
}

#[async_trait]
impl EventHandler for SseDomainEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        debug!(
            "Broadcasting {} to {} subscription(s)",
            event.event_type,
            self.sse_manager.subscription_count()
        );

        self.sse_manager.notify_subscribers(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn handled_events_reach_live_subscriptions() {
        let manager = Arc::new(Manager::new());
        let handler = SseDomainEventHandler::new(manager.clone());

        let (_id, mut rx) = manager.subscribe(None);
        handler
            .handle(&DomainEvent::new("note.created", json!({"id": "n-1"})))
            .await;

        assert!(rx.try_recv().is_ok());
    }
}
