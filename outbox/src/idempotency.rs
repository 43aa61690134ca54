use crate::error::Error;
use entity::Id;
use entity_api::processed_message;
use log::{info, warn};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

/// Consumer-side dedup ledger. Any at-least-once delivery (the outbox
/// publisher included) becomes exactly-once processing when consumers check
/// `is_processed` before handling and `store` after.
#[derive(Clone)]
pub struct IdempotentMessageService {
    db: Arc<DatabaseConnection>,
}

impl IdempotentMessageService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn is_processed(&self, consumer: &str, message_id: Id) -> Result<bool, Error> {
        Ok(processed_message::is_processed(self.db.as_ref(), consumer, message_id).await?)
    }

    pub async fn store(&self, consumer: &str, message_id: Id) -> Result<(), Error> {
        processed_message::store(self.db.as_ref(), consumer, message_id).await?;
        Ok(())
    }

    /// Deletes dedup entries older than `retention`. Returns the number of
    /// rows removed.
    pub async fn delete_expired(&self, retention: chrono::Duration) -> Result<u64, Error> {
        let cutoff = chrono::Utc::now() - retention;
        Ok(processed_message::delete_processed_before(self.db.as_ref(), cutoff).await?)
    }
}

/// Scheduled job purging dedup entries past the retention window. Runs until
/// the shutdown channel fires.
pub struct RetentionSweeper {
    service: IdempotentMessageService,
    sweep_interval: Duration,
    retention: chrono::Duration,
}

impl RetentionSweeper {
    pub fn new(
        service: IdempotentMessageService,
        sweep_interval: Duration,
        retention: chrono::Duration,
    ) -> Self {
        Self {
            service,
            sweep_interval,
            retention,
        }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Processed-message retention sweep started (interval {:?}, retention {} days)",
            self.sweep_interval,
            self.retention.num_days()
        );

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("Processed-message retention sweep stopping");
                    break;
                }
                _ = sleep(self.sweep_interval) => {}
            }

            match self.service.delete_expired(self.retention).await {
                Ok(0) => {}
                Ok(removed) => info!("Retention sweep removed {removed} processed-message entries"),
                Err(e) => warn!("Retention sweep failed: {e}"),
            }
        }
    }
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use entity::processed_messages::Model;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn is_processed_transitions_after_store() -> Result<(), Error> {
        let message_id = Id::new_v4();
        let stored = Model {
            consumer: "case-projector".to_string(),
            message_id,
            processed_on: chrono::Utc::now().into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // before store: no row
            .append_query_results::<Model, Vec<Model>, _>(vec![vec![]])
            // store: insert returning
            .append_query_results(vec![vec![stored.clone()]])
            // after store: row present
            .append_query_results(vec![vec![stored]])
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let service = IdempotentMessageService::new(Arc::new(db));

        assert!(!service.is_processed("case-projector", message_id).await?);
        service.store("case-projector", message_id).await?;
        assert!(service.is_processed("case-projector", message_id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn delete_expired_reports_removed_rows() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 7,
            }])
            .into_connection();

        let service = IdempotentMessageService::new(Arc::new(db));
        let removed = service.delete_expired(chrono::Duration::days(90)).await?;
        assert_eq!(removed, 7);
        Ok(())
    }
}
