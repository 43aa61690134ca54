//! Durable outbox for business-critical domain events.
//!
//! Domain operations that must reach external systems record their events
//! here in the same database that holds the business data, then a separate
//! publisher job delivers them to the broker asynchronously. The write is
//! what the platform guarantees; delivery is at-least-once and retried across
//! process restarts.
//!
//! # Architecture
//!
//! - **OutboxService**: appends a [`events::DomainEvent`] as an
//!   `outbox_messages` row. Callers pass a closure producing the event so
//!   nothing is constructed when the subsystem is disabled.
//! - **MessagePublisher**: the broker seam. The default implementation only
//!   logs; [`publisher::HttpBrokerPublisher`] delivers through a broker's
//!   HTTP publish API using a configured exchange and routing key.
//! - **OutboxPoller**: scheduled job draining unpublished rows in creation
//!   order and stamping `published_on` after each successful delivery. A
//!   failed delivery leaves the row unpublished and backs the job off
//!   exponentially instead of hammering a down broker.
//! - **IdempotentMessageService**: the consumer-side dedup ledger that turns
//!   at-least-once delivery into exactly-once processing, with a scheduled
//!   retention sweep.
//!
//! A crash between "publish" and "stamp published_on" redelivers at most one
//! message on the next cycle; the dedup ledger absorbs the duplicate
//! downstream.

pub mod error;
pub mod idempotency;
pub mod poller;
pub mod publisher;
pub mod service;

pub use idempotency::{IdempotentMessageService, RetentionSweeper};
pub use poller::{OutboxPoller, PollerConfig};
pub use publisher::{HttpBrokerPublisher, LoggingMessagePublisher, MessagePublisher};
pub use service::OutboxService;
