use crate::error::Error;
use entity_api::outbox_message;
use events::DomainEvent;
use log::debug;
use sea_orm::DatabaseConnection;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Records domain events as durable outbox messages.
///
/// `send` takes a closure rather than an event so producers pay nothing for
/// event construction while the subsystem is disabled. The enabled flag is
/// read on every call and can be flipped at runtime.
pub struct OutboxService {
    db: Arc<DatabaseConnection>,
    enabled: AtomicBool,
}

impl OutboxService {
    pub fn new(db: Arc<DatabaseConnection>, enabled: bool) -> Self {
        Self {
            db,
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Appends the produced event to the outbox. A no-op when disabled; the
    /// provider closure is not evaluated in that case. Persistence failures
    /// surface to the caller so the triggering operation can fail loudly.
    pub async fn send<F>(&self, event_provider: F) -> Result<(), Error>
    where
        F: FnOnce() -> DomainEvent,
    {
        if !self.is_enabled() {
            debug!("Outbox disabled, skipping event");
            return Ok(());
        }

        let event = event_provider();
        let payload = serde_json::to_value(&event)?;

        let message = outbox_message::create(self.db.as_ref(), event.event_type, payload).await?;
        debug!(
            "Appended outbox message {} [{}]",
            message.id, message.event_type
        );

        Ok(())
    }
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use entity::outbox_messages::Model;
    use entity::Id;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn stored_model() -> Model {
        Model {
            id: Id::new_v4(),
            event_type: "case.created".to_string(),
            payload: json!({"eventType": "case.created"}),
            created_on: chrono::Utc::now().into(),
            published_on: None,
        }
    }

    #[tokio::test]
    async fn send_appends_the_produced_event() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![stored_model()]])
            .into_connection();

        let service = OutboxService::new(Arc::new(db), true);
        let calls = AtomicUsize::new(0);

        service
            .send(|| {
                calls.fetch_add(1, Ordering::Relaxed);
                DomainEvent::new("case.created", json!({"id": "c-1"}))
            })
            .await?;

        assert_eq!(calls.load(Ordering::Relaxed), 1);
        Ok(())
    }

    #[tokio::test]
    async fn send_is_a_no_op_when_disabled() -> Result<(), Error> {
        // No query results appended: any database access would error.
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let service = OutboxService::new(Arc::new(db), false);
        let calls = AtomicUsize::new(0);

        service
            .send(|| {
                calls.fetch_add(1, Ordering::Relaxed);
                DomainEvent::new("case.created", json!({}))
            })
            .await?;

        // The provider closure is never evaluated while disabled.
        assert_eq!(calls.load(Ordering::Relaxed), 0);
        Ok(())
    }

    #[tokio::test]
    async fn enabled_flag_can_be_flipped_at_runtime() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![stored_model()]])
            .into_connection();

        let service = OutboxService::new(Arc::new(db), false);
        assert!(!service.is_enabled());

        service.set_enabled(true);
        service
            .send(|| DomainEvent::new("case.created", json!({})))
            .await?;

        Ok(())
    }
}
