//! Event system infrastructure for the Event Relay Platform.
//!
//! This crate provides the in-process event bus that decouples event
//! producers (the web boundary, upstream business services) from the
//! infrastructure that reacts to events (the SSE relay, logging, caches).
//!
//! # Architecture
//!
//! - **DomainEvent**: the single event shape flowing through the platform.
//!   The `event_type` string discriminates the business occurrence; the
//!   entity data rides along as a serialized JSON value.
//! - **EventHandler**: Trait for implementing event handlers
//! - **EventPublisher**: Publishes events to registered handlers
//!
//! This crate has no dependencies on internal crates (entity, outbox, etc.),
//! avoiding circular dependencies. Entity data is carried as serialized JSON
//! values.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// A type alias that represents any Entity's internal id field data type.
/// This matches the definition in the entity crate to maintain compatibility.
pub type Id = Uuid;

/// A business-level occurrence emitted when a domain operation completes.
///
/// The same value is appended to the durable outbox (as its serialized
/// payload) and broadcast to connected SSE subscribers, so it carries
/// everything both consumers need: the discriminator, a reference to the
/// affected entity, the entity body itself, and the acting user context.
///
/// Serialized with camelCase keys (`eventType`, `resultType`, `resultId`,
/// `result`, `userId`, `roles`, `occurredOn`) — the wire format downstream
/// broker consumers are keyed on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    /// Discriminator naming the kind of occurrence, e.g. `"case.created"`
    /// or `"document.status.changed"`.
    pub event_type: String,
    /// Type name of the affected entity, e.g. `"com.case.Document"`.
    pub result_type: Option<String>,
    /// Identifier of the affected entity within its type.
    pub result_id: Option<String>,
    /// Complete serialized entity body. Sent to subscribers so frontends can
    /// update without a follow-up API call.
    pub result: Value,
    /// Identity of the user whose action produced the event, if any.
    pub user_id: Option<String>,
    /// Roles the acting user held at the time of the action.
    pub roles: Vec<String>,
    /// When the occurrence happened (producer clock).
    pub occurred_on: DateTime<Utc>,
}

impl DomainEvent {
    /// Create an event stamped with the current time and no user context.
    pub fn new(event_type: impl Into<String>, result: Value) -> Self {
        Self {
            event_type: event_type.into(),
            result_type: None,
            result_id: None,
            result,
            user_id: None,
            roles: Vec::new(),
            occurred_on: Utc::now(),
        }
    }

    pub fn with_result_ref(
        mut self,
        result_type: impl Into<String>,
        result_id: impl Into<String>,
    ) -> Self {
        self.result_type = Some(result_type.into());
        self.result_id = Some(result_id.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>, roles: Vec<String>) -> Self {
        self.user_id = Some(user_id.into());
        self.roles = roles;
        self
    }
}

/// Trait for handling domain events.
/// Implementations can perform side effects like pushing SSE notifications,
/// updating caches, logging, etc.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    /// Store the returned publisher in your application state.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    /// Publish an event to all registered handlers.
    /// Handlers are called sequentially; a handler must contain its own
    /// failures so the remaining handlers still run.
    pub async fn publish(&self, event: DomainEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
