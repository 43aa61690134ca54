use axum::response::sse::Event;
use events::DomainEvent;
use serde::Serialize;

/// A wire-ready notification frame: the SSE event name plus the serialized
/// event body. Serialization happens once, when the domain event enters the
/// relay, so a frame sitting in a backlog queue costs nothing more to
/// redeliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub event_type: String,
    pub data: String,
}

impl Notification {
    pub fn new(event_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            data: data.into(),
        }
    }

    pub fn to_sse_event(&self) -> Event {
        Event::default().event(&self.event_type).data(&self.data)
    }
}

impl TryFrom<&DomainEvent> for Notification {
    type Error = serde_json::Error;

    fn try_from(event: &DomainEvent) -> Result<Self, Self::Error> {
        Ok(Self {
            event_type: event.event_type.clone(),
            data: serde_json::to_string(event)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn carries_the_event_type_and_serialized_body() {
        let event = DomainEvent::new("document.created", json!({"name": "intake.pdf"}))
            .with_result_ref("com.case.Document", "d-1");

        let notification = Notification::try_from(&event).unwrap();
        assert_eq!(notification.event_type, "document.created");

        let body: serde_json::Value = serde_json::from_str(&notification.data).unwrap();
        assert_eq!(body["eventType"], "document.created");
        assert_eq!(body["result"]["name"], "intake.pdf");
    }
}
