use events::EventPublisher;
use log::info;
use outbox::OutboxService;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub(crate) mod controller;
pub mod error;
pub(crate) mod extractors;
pub(crate) mod params;
pub mod router;
pub(crate) mod sse;

pub use error::Error;

use ::sse::Manager as SseManager;

// Web-level state: infrastructure state plus the relay services the
// controllers and the SSE handler need.
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub service_state: service::AppState,
    pub sse_manager: Arc<SseManager>,
    pub event_publisher: EventPublisher,
    pub outbox_service: Arc<OutboxService>,
}

impl AppState {
    pub fn new(
        service_state: service::AppState,
        sse_manager: Arc<SseManager>,
        event_publisher: EventPublisher,
        outbox_service: Arc<OutboxService>,
    ) -> Self {
        Self {
            service_state,
            sse_manager,
            event_publisher,
            outbox_service,
        }
    }

    pub fn db_conn_ref(&self) -> &DatabaseConnection {
        self.service_state.db_conn_ref()
    }

    pub fn config(&self) -> &service::config::Config {
        &self.service_state.config
    }
}

pub async fn init_server(app_state: AppState) -> Result<(), std::io::Error> {
    let host = app_state
        .config()
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let listen_addr = format!("{}:{}", host, app_state.config().port);

    info!("Server starting... listening for requests on http://{listen_addr}");

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, router::define_routes(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C signal handler");
    info!("Shutdown signal received");
}
