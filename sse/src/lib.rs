//! Server-Sent Events (SSE) infrastructure for real-time updates.
//!
//! This crate provides the app-wide SSE relay that pushes domain events from
//! the backend to connected browser clients, with reconnect-safe queuing.
//!
//! # Architecture
//!
//! - **One live channel per subscription**: each subscription id owns at most
//!   one live channel at a time; a reconnect replaces the previous channel
//!   outright.
//! - **Backlog per subscription**: events arriving while a subscription has
//!   no live channel are queued in order and drained on the next reconnect,
//!   so a dropped connection loses nothing.
//! - **Broadcast fan-out**: every registered subscription receives every
//!   event; one dead client never affects delivery to the others.
//! - **Reactive disconnect detection**: a failed channel send is the signal
//!   that the client is gone. The failed frame is preserved for redelivery
//!   and the subscription reverts to queueing.
//!
//! # Message Flow
//!
//! 1. Frontend establishes the SSE connection via the `/sse` endpoint,
//!    passing its previous subscription id when reconnecting
//! 2. The Manager get-or-creates the SubscriberHandler for that id and binds
//!    a fresh channel to it, draining any backlog FIFO
//! 3. When a domain event is published on the event bus, the
//!    SseDomainEventHandler hands it to `Manager::notify_subscribers`
//! 4. Each handler either pushes the event down its live channel or appends
//!    it to its backlog
//! 5. An explicit unsubscribe removes the handler and drops its backlog
//!
//! # Modules
//!
//! - `subscriber`: the live-channel capability (`Subscriber`) and its
//!   tokio-mpsc-backed implementation, plus `SubscriptionId`
//! - `handler`: per-subscription state machine combining the optional live
//!   channel with the backlog queue
//! - `manager`: the subscription registry (subscribe / broadcast / remove)
//! - `message`: the wire-ready notification frame
//! - `domain_event_handler`: bridge from the in-process event bus

pub mod domain_event_handler;
pub mod handler;
pub mod manager;
pub mod message;
pub mod subscriber;

pub use manager::Manager;
pub use subscriber::SubscriptionId;
