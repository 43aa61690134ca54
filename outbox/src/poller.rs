use crate::error::Error;
use crate::publisher::MessagePublisher;
use entity_api::outbox_message;
use log::{debug, info, warn};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

/// Tuning for the outbox publisher job.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Delay between polling cycles while the broker is healthy
    pub poll_interval: Duration,
    /// Maximum number of unpublished messages fetched per cycle
    pub batch_size: u64,
    /// Backoff delay after the first failed cycle; doubles per consecutive failure
    pub retry_delay: Duration,
    /// Upper bound for the backoff delay
    pub max_retry_delay: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            batch_size: 50,
            retry_delay: Duration::from_secs(1),
            max_retry_delay: Duration::from_secs(60),
        }
    }
}

/// Scheduled job that drains unpublished outbox messages to the configured
/// publisher. Runs until the shutdown channel fires.
///
/// Delivery is at-least-once: a message is stamped `published_on` only after
/// the publisher reports success, so a crash between the two steps causes at
/// most one duplicate redelivery on the next cycle. Consecutive failed
/// cycles back off exponentially instead of retrying a down broker at full
/// poll rate.
pub struct OutboxPoller {
    db: Arc<DatabaseConnection>,
    publisher: Arc<dyn MessagePublisher>,
    config: PollerConfig,
}

impl OutboxPoller {
    pub fn new(
        db: Arc<DatabaseConnection>,
        publisher: Arc<dyn MessagePublisher>,
        config: PollerConfig,
    ) -> Self {
        Self {
            db,
            publisher,
            config,
        }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Outbox publisher job started (poll interval {:?}, batch size {})",
            self.config.poll_interval, self.config.batch_size
        );

        let mut consecutive_failures: u32 = 0;
        loop {
            let delay = self.next_delay(consecutive_failures);
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("Outbox publisher job stopping");
                    break;
                }
                _ = sleep(delay) => {}
            }

            match self.publish_pending().await {
                Ok(published) => {
                    if published > 0 {
                        debug!("Published {published} outbox message(s)");
                    }
                    consecutive_failures = 0;
                }
                Err(e) => {
                    consecutive_failures = consecutive_failures.saturating_add(1);
                    warn!("Outbox publish cycle failed (consecutive failures: {consecutive_failures}): {e}");
                }
            }
        }
    }

    /// One polling cycle: fetch the oldest unpublished messages and deliver
    /// them in creation order. Stops at the first failed delivery so the
    /// failed message and everything behind it stay in order for the next
    /// cycle.
    pub async fn publish_pending(&self) -> Result<usize, Error> {
        let pending =
            outbox_message::find_unpublished(self.db.as_ref(), self.config.batch_size).await?;

        let mut published = 0;
        for message in pending {
            self.publisher.publish(&message).await?;

            if !outbox_message::mark_published(self.db.as_ref(), message.id).await? {
                debug!("Outbox message {} was already marked published", message.id);
            }
            published += 1;
        }

        Ok(published)
    }

    /// Poll interval while healthy; after `n` consecutive failed cycles the
    /// retry delay doubled `n - 1` times, capped at `max_retry_delay`.
    fn next_delay(&self, consecutive_failures: u32) -> Duration {
        if consecutive_failures == 0 {
            return self.config.poll_interval;
        }

        let exponent = consecutive_failures.saturating_sub(1).min(16);
        let delay = self
            .config
            .retry_delay
            .saturating_mul(2u32.saturating_pow(exponent));
        delay.min(self.config.max_retry_delay)
    }
}
