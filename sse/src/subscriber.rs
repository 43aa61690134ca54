use crate::message::Notification;
use axum::response::sse::Event;
use std::convert::Infallible;
use std::fmt;
use tokio::sync::mpsc::UnboundedSender;

/// Stable identity of one subscription. Clients keep it across reconnects to
/// resume the same backlog; when a client connects without one, the server
/// generates it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for SubscriptionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The transport write failed; the client behind the channel is gone.
#[derive(Debug, PartialEq, Eq)]
pub struct DeliveryError;

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "live channel closed")
    }
}

impl std::error::Error for DeliveryError {}

/// Capability to push one notification to a live client. A failure means the
/// channel is unusable and the caller must fall back to queueing; closing the
/// underlying transport is the transport layer's business, not ours.
pub trait Subscriber: Send + Sync {
    fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError>;
}

/// Channel-backed subscriber: the HTTP layer holds the receiving end and
/// streams frames out on the response. Sends never block; a dropped receiver
/// (client went away) surfaces as a send error.
pub struct ChannelSubscriber {
    sender: UnboundedSender<Result<Event, Infallible>>,
}

impl ChannelSubscriber {
    pub fn new(sender: UnboundedSender<Result<Event, Infallible>>) -> Self {
        Self { sender }
    }
}

impl Subscriber for ChannelSubscriber {
    fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        self.sender
            .send(Ok(notification.to_sse_event()))
            .map_err(|_| DeliveryError)
    }
}
