use crate::message::Notification;
use crate::subscriber::{Subscriber, SubscriptionId};
use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

struct HandlerState {
    /// The current live channel. `None` means the subscription is
    /// disconnected and events accumulate in `queue`.
    subscriber: Option<Arc<dyn Subscriber>>,
    /// Undelivered notifications in arrival order.
    queue: VecDeque<Notification>,
}

/// Per-subscription delivery state: at most one live channel plus the FIFO
/// backlog of everything not yet delivered.
///
/// All mutation happens under one lock, so an event arriving concurrently
/// with a reconnect cannot interleave with the drain. A consequence worth
/// noting: while a subscriber is attached the queue is always empty (a
/// successful attach drains it, and a failed send detaches before queueing),
/// so queueing a failed live send at the tail is indistinguishable from
/// queueing it at the head.
pub struct SubscriberHandler {
    subscription_id: SubscriptionId,
    state: Mutex<HandlerState>,
}

impl SubscriberHandler {
    pub fn new(subscription_id: SubscriptionId) -> Self {
        Self {
            subscription_id,
            state: Mutex::new(HandlerState {
                subscriber: None,
                queue: VecDeque::new(),
            }),
        }
    }

    pub fn subscription_id(&self) -> &SubscriptionId {
        &self.subscription_id
    }

    /// Delivers the notification live when a channel is attached, otherwise
    /// queues it. A failed live send demotes the subscription to disconnected
    /// and preserves the notification for redelivery on the next attach.
    pub fn send(&self, notification: Notification) {
        let mut state = self.state.lock();
        match state.subscriber.clone() {
            Some(subscriber) => {
                if subscriber.deliver(&notification).is_err() {
                    warn!(
                        "Send to subscription {} failed, queueing for redelivery",
                        self.subscription_id
                    );
                    state.subscriber = None;
                    state.queue.push_back(notification);
                }
            }
            None => state.queue.push_back(notification),
        }
    }

    /// Binds a new live channel, replacing any previous one without closing
    /// it, then drains the backlog head-first. On the first failed delivery
    /// the failed notification goes back to the head of the queue (order
    /// preserved) and the subscription reverts to disconnected.
    pub fn attach(&self, subscriber: Arc<dyn Subscriber>) {
        let mut state = self.state.lock();
        state.subscriber = Some(subscriber.clone());

        while let Some(notification) = state.queue.pop_front() {
            if subscriber.deliver(&notification).is_err() {
                warn!(
                    "Backlog drain for subscription {} failed, {} notification(s) kept",
                    self.subscription_id,
                    state.queue.len() + 1
                );
                state.queue.push_front(notification);
                state.subscriber = None;
                return;
            }
        }

        debug!("Subscription {} connected, backlog drained", self.subscription_id);
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().subscriber.is_some()
    }

    pub fn queued(&self) -> usize {
        self.state.lock().queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriber::DeliveryError;
    use parking_lot::Mutex as PlMutex;

    /// Records everything delivered to it; optionally starts failing when it
    /// sees a configured notification, and keeps failing from then on.
    struct ScriptedSubscriber {
        received: PlMutex<Vec<Notification>>,
        fail_on: Option<String>,
        broken: PlMutex<bool>,
    }

    impl ScriptedSubscriber {
        fn reliable() -> Arc<Self> {
            Arc::new(Self {
                received: PlMutex::new(Vec::new()),
                fail_on: None,
                broken: PlMutex::new(false),
            })
        }

        fn failing_from(data: &str) -> Arc<Self> {
            Arc::new(Self {
                received: PlMutex::new(Vec::new()),
                fail_on: Some(data.to_string()),
                broken: PlMutex::new(false),
            })
        }

        fn broken() -> Arc<Self> {
            Arc::new(Self {
                received: PlMutex::new(Vec::new()),
                fail_on: None,
                broken: PlMutex::new(true),
            })
        }

        fn received_data(&self) -> Vec<String> {
            self.received.lock().iter().map(|n| n.data.clone()).collect()
        }
    }

    impl Subscriber for ScriptedSubscriber {
        fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
            let mut broken = self.broken.lock();
            if *broken {
                return Err(DeliveryError);
            }
            if self.fail_on.as_deref() == Some(notification.data.as_str()) {
                *broken = true;
                return Err(DeliveryError);
            }
            self.received.lock().push(notification.clone());
            Ok(())
        }
    }

    fn notification(data: &str) -> Notification {
        Notification::new("case.created", data)
    }

    #[test]
    fn backlog_drains_in_fifo_order_on_attach() {
        let handler = SubscriberHandler::new(SubscriptionId::new());
        for data in ["e1", "e2", "e3"] {
            handler.send(notification(data));
        }
        assert_eq!(handler.queued(), 3);

        let subscriber = ScriptedSubscriber::reliable();
        handler.attach(subscriber.clone());

        assert_eq!(subscriber.received_data(), vec!["e1", "e2", "e3"]);
        assert_eq!(handler.queued(), 0);
        assert!(handler.is_connected());
    }

    #[test]
    fn failed_drain_requeues_the_failed_notification_at_the_head() {
        let handler = SubscriberHandler::new(SubscriptionId::new());
        for data in ["e1", "e2", "e3"] {
            handler.send(notification(data));
        }

        let subscriber = ScriptedSubscriber::failing_from("e2");
        handler.attach(subscriber.clone());

        // e1 was delivered and is not requeued; e2 failed and leads the
        // backlog again, with e3 still behind it.
        assert_eq!(subscriber.received_data(), vec!["e1"]);
        assert!(!handler.is_connected());
        assert_eq!(handler.queued(), 2);

        let retry = ScriptedSubscriber::reliable();
        handler.attach(retry.clone());
        assert_eq!(retry.received_data(), vec!["e2", "e3"]);
    }

    #[test]
    fn live_send_delivers_without_touching_the_queue() {
        let handler = SubscriberHandler::new(SubscriptionId::new());
        let subscriber = ScriptedSubscriber::reliable();
        handler.attach(subscriber.clone());

        handler.send(notification("e1"));

        assert_eq!(subscriber.received_data(), vec!["e1"]);
        assert_eq!(handler.queued(), 0);
        assert!(handler.is_connected());
    }

    #[test]
    fn failed_live_send_demotes_and_preserves_the_notification() {
        let handler = SubscriberHandler::new(SubscriptionId::new());
        handler.attach(ScriptedSubscriber::broken());

        handler.send(notification("e1"));
        handler.send(notification("e2"));

        assert!(!handler.is_connected());
        assert_eq!(handler.queued(), 2);

        // The frame that failed while live is redelivered first; nothing was
        // lost and arrival order holds.
        let retry = ScriptedSubscriber::reliable();
        handler.attach(retry.clone());
        assert_eq!(retry.received_data(), vec!["e1", "e2"]);
    }

    #[test]
    fn reconnect_replaces_the_live_channel_outright() {
        let handler = SubscriberHandler::new(SubscriptionId::new());
        let first = ScriptedSubscriber::reliable();
        let second = ScriptedSubscriber::reliable();

        handler.attach(first.clone());
        handler.attach(second.clone());
        handler.send(notification("e1"));

        // Only the replacement channel sees traffic; the stale one is simply
        // forgotten, never closed by the relay.
        assert!(first.received_data().is_empty());
        assert_eq!(second.received_data(), vec!["e1"]);
    }
}
