use crate::controller::ApiResponse;
use crate::extractors::compare_api_version::CompareApiVersion;
use crate::params::event::CreateParams;
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use service::config::ApiVersion;

use log::*;

/// POST publish a new Domain Event
///
/// The event is appended to the durable outbox first (the guarantee), then
/// fanned out live to connected SSE subscriptions (best effort).
#[utoipa::path(
    post,
    path = "/events",
    params(ApiVersion),
    request_body = CreateParams,
    responses(
        (status = 201, description = "Successfully Published a New Domain Event", body = CreateParams),
        (status = 422, description = "Unprocessable Entity"),
        (status = 405, description = "Method not allowed"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn create(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Json(params): Json<CreateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Publish a New Domain Event: {params:?}");

    let event = params.into_domain_event();

    app_state.outbox_service.send(|| event.clone()).await?;
    app_state.event_publisher.publish(event.clone()).await;

    debug!("Published Domain Event: {event:?}");

    Ok(Json(ApiResponse::new(StatusCode::CREATED.into(), event)))
}
