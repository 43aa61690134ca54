pub use super::outbox_messages::Entity as OutboxMessages;
pub use super::processed_messages::Entity as ProcessedMessages;
