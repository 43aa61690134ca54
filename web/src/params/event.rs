use events::DomainEvent;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /events`: the occurrence to publish. The server stamps
/// `occurredOn`; everything else comes from the producer.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateParams {
    pub event_type: String,
    pub result_type: Option<String>,
    pub result_id: Option<String>,
    #[schema(value_type = Object)]
    pub result: serde_json::Value,
    pub user_id: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl CreateParams {
    pub(crate) fn into_domain_event(self) -> DomainEvent {
        DomainEvent {
            event_type: self.event_type,
            result_type: self.result_type,
            result_id: self.result_id,
            result: self.result,
            user_id: self.user_id,
            roles: self.roles,
            occurred_on: chrono::Utc::now(),
        }
    }
}
