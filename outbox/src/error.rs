//! Error types for the `outbox` layer.
use entity_api::error::Error as EntityApiError;
use std::error::Error as StdError;
use std::fmt;

/// Top-level outbox error type, following the layered error convention:
/// a root struct holding an `error_kind` enum plus the original lower-layer
/// error as `source`. Callers above (the web layer, the wiring binary)
/// translate kinds into their own vocabulary without reaching into
/// `entity_api` directly.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// The durable store rejected or could not perform the append. Surfaced
    /// to the producing caller: losing a domain event silently is not
    /// acceptable.
    Persistence,
    /// The domain event could not be serialized into a payload.
    Serialization,
    /// A broker delivery attempt failed; the message stays unpublished and
    /// is retried by the next polling cycle.
    Publish,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Outbox Error: {self:?}")
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<EntityApiError> for Error {
    fn from(err: EntityApiError) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Persistence,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Serialization,
        }
    }
}

impl From<PublishError> for Error {
    fn from(err: PublishError) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Publish,
        }
    }
}

/// Error type for broker publish operations.
#[derive(Debug)]
pub enum PublishError {
    /// Reaching the broker failed (connect/read error)
    Network(String),
    /// The broker answered but refused or could not route the message
    Rejected(String),
    /// Timeout waiting for the broker to acknowledge delivery
    Timeout,
    /// Other error
    Other(Box<dyn StdError + Send + Sync>),
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::Network(msg) => write!(f, "Broker unreachable: {}", msg),
            PublishError::Rejected(msg) => write!(f, "Message rejected: {}", msg),
            PublishError::Timeout => write!(f, "Publish timeout"),
            PublishError::Other(e) => write!(f, "Publish error: {}", e),
        }
    }
}

impl StdError for PublishError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            PublishError::Other(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_error_display_names_the_failure() {
        assert_eq!(
            PublishError::Network("connection refused".to_string()).to_string(),
            "Broker unreachable: connection refused"
        );
        assert_eq!(PublishError::Timeout.to_string(), "Publish timeout");
    }

    #[test]
    fn entity_api_errors_map_to_persistence_kind() {
        let err: Error = EntityApiError {
            source: None,
            error_kind: entity_api::error::EntityApiErrorKind::SystemError,
        }
        .into();
        assert_eq!(err.error_kind, ErrorKind::Persistence);
    }
}
