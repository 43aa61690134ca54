use serde::Deserialize;
use utoipa::IntoParams;

/// Query parameters of `GET /sse`. A reconnecting client passes the
/// subscription id it was handed on its first connection to resume the same
/// backlog; a first-time client passes nothing.
#[derive(Debug, Deserialize, IntoParams)]
pub struct SubscribeParams {
    pub subscription_id: Option<String>,
}
