//! SSE HTTP handlers for the web layer.
//!
//! This module contains only the Axum handlers for SSE endpoints.
//! The core SSE infrastructure (Manager, SubscriberHandler, Notification)
//! lives in the `sse` crate to avoid circular dependencies.

pub mod handler;
