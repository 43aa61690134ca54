use anyhow::Result;
use log::debug;
use serde_json::{json, Value};

/// Thin client for the relay's publish endpoint.
pub struct ApiClient {
    client: reqwest::Client,
    pub base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    pub async fn publish_event(&self, event_type: &str, result: Value) -> Result<Value> {
        let body = json!({
            "eventType": event_type,
            "result": result,
        });

        debug!("Publishing event {event_type}");

        let response = self
            .client
            .post(format!("{}/events", self.base_url))
            .header("x-version", "1.0.0-beta1")
            .json(&body)
            .send()
            .await?;

        anyhow::ensure!(
            response.status().is_success(),
            "publish failed with status {}",
            response.status()
        );

        Ok(response.json().await?)
    }
}
