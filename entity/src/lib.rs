use uuid::Uuid;

pub mod prelude;

// Relay entities
pub mod outbox_messages;
pub mod processed_messages;

/// A type alias that represents any Entity's internal id field data type.
/// Aliased so that it's easy to change the underlying type if necessary.
pub type Id = Uuid;
