use events::EventPublisher;
use log::{error, info};
use outbox::{
    HttpBrokerPublisher, IdempotentMessageService, LoggingMessagePublisher, MessagePublisher,
    OutboxPoller, OutboxService, PollerConfig, RetentionSweeper,
};
use service::{config::Config, logging::Logger};
use sse::domain_event_handler::SseDomainEventHandler;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!("Starting event relay [{}]", config.runtime_env());

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    let service_state = service::AppState::new(config.clone(), &db);

    // The SSE relay and the event bus feeding it.
    let sse_manager = Arc::new(sse::Manager::new());
    let event_publisher = EventPublisher::new()
        .with_handler(Arc::new(SseDomainEventHandler::new(sse_manager.clone())));

    // The durable outbox and its background jobs.
    let outbox_service = Arc::new(OutboxService::new(db.clone(), config.outbox_enabled));
    let message_publisher = match broker_publisher(&config) {
        Ok(publisher) => publisher,
        Err(e) => {
            error!("Failed to configure broker publisher: {e}");
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let poller = OutboxPoller::new(
        db.clone(),
        message_publisher,
        PollerConfig {
            poll_interval: Duration::from_secs(config.outbox_poll_interval_secs),
            batch_size: config.outbox_batch_size,
            retry_delay: Duration::from_secs(config.outbox_retry_delay_secs),
            max_retry_delay: Duration::from_secs(config.outbox_max_retry_delay_secs),
        },
    );
    tokio::spawn(poller.run(shutdown_rx.clone()));

    let sweeper = RetentionSweeper::new(
        IdempotentMessageService::new(db.clone()),
        Duration::from_secs(config.processed_message_sweep_interval_secs),
        chrono::Duration::days(config.processed_message_retention_days as i64),
    );
    tokio::spawn(sweeper.run(shutdown_rx));

    let app_state = web::AppState::new(
        service_state,
        sse_manager,
        event_publisher,
        outbox_service,
    );

    if let Err(e) = web::init_server(app_state).await {
        error!("Server failed: {e}");
    }

    // Stop the background jobs alongside the server.
    let _ = shutdown_tx.send(true);
}

fn broker_publisher(
    config: &Config,
) -> Result<Arc<dyn MessagePublisher>, outbox::error::PublishError> {
    match config.broker_api_url() {
        Some(api_url) => {
            info!(
                "Publishing outbox messages to exchange {} at {api_url}",
                config.broker_exchange
            );
            Ok(Arc::new(HttpBrokerPublisher::new(
                api_url,
                config.broker_exchange.clone(),
                config.broker_routing_key.clone(),
                Duration::from_secs(config.broker_delivery_timeout_secs),
            )?))
        }
        None => {
            info!("No broker configured, outbox messages will be logged");
            Ok(Arc::new(LoggingMessagePublisher))
        }
    }
}
