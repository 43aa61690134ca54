use crate::params::subscription::SubscribeParams;
use crate::AppState;
use ::sse::SubscriptionId;
use async_stream::stream;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use futures::Stream;
use log::*;
use serde_json::json;
use std::convert::Infallible;

/// SSE handler that establishes a long-lived connection for real-time
/// updates. Reconnecting with the subscription id from a previous connection
/// resumes that subscription's backlog; connecting without one starts fresh.
pub(crate) async fn sse_handler(
    Query(params): Query<SubscribeParams>,
    State(app_state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let requested = params.subscription_id.map(SubscriptionId::from);
    let (subscription_id, mut rx) = app_state.sse_manager.subscribe(requested);

    debug!("Establishing SSE connection for subscription {subscription_id}");

    // Events arrive from the handler's channel; the first frame hands the
    // client its subscription id so it can reconnect to the same backlog.
    let stream = stream! {
        yield Ok(Event::default()
            .event("subscription")
            .data(json!({ "subscriptionId": subscription_id.as_str() }).to_string()));

        while let Some(event) = rx.recv().await {
            yield event;
        }

        // The client went away. The subscription stays registered so events
        // keep queueing until it reconnects or unsubscribes explicitly.
        debug!("SSE connection closed for subscription {subscription_id}");
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// DELETE handler tearing a subscription down entirely. Any undelivered
/// backlog is dropped with it; this is the explicit opt-out, not a disconnect.
pub(crate) async fn unsubscribe(
    Path(subscription_id): Path<String>,
    State(app_state): State<AppState>,
) -> impl IntoResponse {
    app_state
        .sse_manager
        .remove(&SubscriptionId::from(subscription_id));

    StatusCode::NO_CONTENT
}
