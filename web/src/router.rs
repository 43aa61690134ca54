use crate::controller::{event_controller, health_check_controller};
use crate::{params, sse, AppState};
use axum::http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use service::config::Config;
use tower_http::cors::{AllowOrigin, CorsLayer};

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Event Relay Platform API"
        ),
        paths(
            event_controller::create,
            health_check_controller::health_check,
        ),
        components(
            schemas(
                params::event::CreateParams,
            )
        ),
        tags(
            (name = "event_relay", description = "Durable outbox & real-time SSE relay API")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    let cors = cors_layer(app_state.config());

    Router::new()
        .merge(event_routes(app_state.clone()))
        .merge(sse_routes(app_state.clone()))
        .merge(health_routes())
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
        .layer(cors)
}

fn event_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/events", post(event_controller::create))
        .with_state(app_state)
}

fn sse_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/sse", get(sse::handler::sse_handler))
        .route("/sse/{subscription_id}", delete(sse::handler::unsubscribe))
        .with_state(app_state)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static("x-version")])
        .allow_credentials(true)
}
