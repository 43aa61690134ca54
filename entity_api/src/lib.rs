pub use entity::{outbox_messages, processed_messages, Id};

pub mod error;
pub mod outbox_message;
pub mod processed_message;
