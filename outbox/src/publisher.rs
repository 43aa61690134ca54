use crate::error::PublishError;
use async_trait::async_trait;
use entity::outbox_messages::Model;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The broker seam of the outbox. Implementations deliver one message and
/// report failure so the polling job can leave the row unpublished for the
/// next cycle. Swapping brokers never touches the OutboxService or the
/// poller.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, message: &Model) -> Result<(), PublishError>;
}

/// Default publisher used when no broker is configured: logs the message and
/// reports success, so local development drains the outbox without any
/// broker running.
pub struct LoggingMessagePublisher;

#[async_trait]
impl MessagePublisher for LoggingMessagePublisher {
    async fn publish(&self, message: &Model) -> Result<(), PublishError> {
        info!(
            "Publishing outbox message {} [{}] (no broker configured)",
            message.id, message.event_type
        );
        debug!("Outbox message payload: {}", message.payload);
        Ok(())
    }
}

/// Publishes outbox messages through a broker's HTTP publish API
/// (e.g. RabbitMQ's `POST /api/exchanges/{vhost}/{exchange}/publish`),
/// carrying the configured routing key. The HTTP client's request timeout is
/// the delivery timeout for a single attempt.
pub struct HttpBrokerPublisher {
    client: reqwest::Client,
    api_url: String,
    exchange: String,
    routing_key: String,
}

#[derive(Debug, Serialize)]
struct BrokerProperties {
    message_id: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize)]
struct BrokerPublishRequest {
    properties: BrokerProperties,
    routing_key: String,
    payload: String,
    payload_encoding: &'static str,
}

#[derive(Debug, Deserialize)]
struct BrokerPublishResponse {
    routed: bool,
}

impl HttpBrokerPublisher {
    pub fn new(
        api_url: String,
        exchange: String,
        routing_key: String,
        delivery_timeout: Duration,
    ) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .timeout(delivery_timeout)
            .build()
            .map_err(|e| PublishError::Other(Box::new(e)))?;

        Ok(Self {
            client,
            api_url,
            exchange,
            routing_key,
        })
    }

    fn publish_url(&self) -> String {
        // %2f is the default vhost ("/") in the broker management API path.
        format!(
            "{}/exchanges/%2f/{}/publish",
            self.api_url.trim_end_matches('/'),
            self.exchange
        )
    }
}

#[async_trait]
impl MessagePublisher for HttpBrokerPublisher {
    async fn publish(&self, message: &Model) -> Result<(), PublishError> {
        let request = BrokerPublishRequest {
            properties: BrokerProperties {
                message_id: message.id.to_string(),
                kind: message.event_type.clone(),
            },
            routing_key: self.routing_key.clone(),
            payload: message.payload.to_string(),
            payload_encoding: "string",
        };

        debug!(
            "Publishing outbox message {} to exchange {} with routing key {}",
            message.id, self.exchange, self.routing_key
        );

        let response = self
            .client
            .post(self.publish_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PublishError::Timeout
                } else {
                    PublishError::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(PublishError::Rejected(format!(
                "broker returned {}",
                response.status()
            )));
        }

        let parsed: BrokerPublishResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Network(e.to_string()))?;

        if parsed.routed {
            Ok(())
        } else {
            Err(PublishError::Rejected(
                "message was not routed to any queue".to_string(),
            ))
        }
    }
}
