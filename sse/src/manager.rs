use crate::handler::SubscriberHandler;
use crate::message::Notification;
use crate::subscriber::{ChannelSubscriber, SubscriptionId};
use axum::response::sse::Event;
use dashmap::DashMap;
use events::DomainEvent;
use log::*;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Process-wide subscription registry. Constructed once at startup and
/// passed to whoever needs it; subscribe / broadcast / remove all go through
/// this one instance.
pub struct Manager {
    registry: DashMap<SubscriptionId, Arc<SubscriberHandler>>,
}

impl Manager {
    pub fn new() -> Self {
        Self {
            registry: DashMap::new(),
        }
    }

    /// Binds a fresh live channel to the subscription and returns the
    /// receiving end for the HTTP layer to stream from. Reuses the existing
    /// handler (and its backlog) when the id is known; generates an id
    /// otherwise. The entry API makes concurrent subscribes for the same id
    /// agree on a single handler.
    pub fn subscribe(
        &self,
        subscription_id: Option<SubscriptionId>,
    ) -> (SubscriptionId, UnboundedReceiver<Result<Event, Infallible>>) {
        let subscription_id = subscription_id.unwrap_or_default();

        let handler = self
            .registry
            .entry(subscription_id.clone())
            .or_insert_with(|| Arc::new(SubscriberHandler::new(subscription_id.clone())))
            .clone();

        let (tx, rx) = mpsc::unbounded_channel();
        handler.attach(Arc::new(ChannelSubscriber::new(tx)));
        info!("Registered SSE subscription {subscription_id}");

        (subscription_id, rx)
    }

    /// Fans the event out to every registered subscription. Each handler
    /// contains its own delivery failure; one dead client never surfaces
    /// here.
    pub fn notify_subscribers(&self, event: &DomainEvent) {
        let notification = match Notification::try_from(event) {
            Ok(notification) => notification,
            Err(e) => {
                error!("Failed to serialize SSE event: {e}");
                return;
            }
        };

        for entry in self.registry.iter() {
            entry.value().send(notification.clone());
        }
    }

    /// Tears the subscription down entirely, dropping any undelivered
    /// backlog. This is the explicit-unsubscribe path; a mere disconnect
    /// keeps the handler (and backlog) for the next reconnect.
    pub fn remove(&self, subscription_id: &SubscriptionId) {
        if self.registry.remove(subscription_id).is_some() {
            info!("Removed SSE subscription {subscription_id}");
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.registry.len()
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(data: &str) -> DomainEvent {
        DomainEvent::new("case.created", json!({ "id": data }))
    }

    #[test]
    fn subscribe_without_an_id_generates_one() {
        let manager = Manager::new();
        let (first, _rx1) = manager.subscribe(None);
        let (second, _rx2) = manager.subscribe(None);

        assert_ne!(first, second);
        assert_eq!(manager.subscription_count(), 2);
    }

    #[test]
    fn subscribing_again_resumes_the_same_backlog() {
        let manager = Manager::new();
        let (id, rx) = manager.subscribe(None);

        // Client goes away: its channel closes and the next send demotes the
        // handler to queueing.
        drop(rx);
        manager.notify_subscribers(&event("c-1"));

        let (resumed_id, mut rx) = manager.subscribe(Some(id.clone()));
        assert_eq!(resumed_id, id);
        assert_eq!(manager.subscription_count(), 1);

        // The event queued while disconnected arrives on the new channel.
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn broadcast_failure_of_one_subscription_is_isolated() {
        let manager = Manager::new();
        let (dead_id, dead_rx) = manager.subscribe(None);
        let (_live_id, mut live_rx) = manager.subscribe(None);

        drop(dead_rx);
        manager.notify_subscribers(&event("c-1"));

        // The live subscription received the event...
        assert!(live_rx.try_recv().is_ok());

        // ...and the dead one kept it queued for its next reconnect.
        let (_, mut revived_rx) = manager.subscribe(Some(dead_id));
        assert!(revived_rx.try_recv().is_ok());
    }

    #[test]
    fn remove_drops_the_handler_and_its_backlog() {
        let manager = Manager::new();
        let (id, rx) = manager.subscribe(None);
        drop(rx);
        manager.notify_subscribers(&event("c-1"));

        manager.remove(&id);
        assert_eq!(manager.subscription_count(), 0);

        // A later subscribe with the same id starts from an empty backlog.
        let (_, mut rx) = manager.subscribe(Some(id));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn events_broadcast_to_all_live_subscriptions() {
        let manager = Manager::new();
        let (_id1, mut rx1) = manager.subscribe(None);
        let (_id2, mut rx2) = manager.subscribe(None);

        manager.notify_subscribers(&event("c-1"));

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }
}
