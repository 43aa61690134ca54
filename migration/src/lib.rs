pub use sea_orm_migration::prelude::*;

mod m20250801_120000_create_schema_and_outbox_messages;
mod m20250801_121000_add_processed_messages;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250801_120000_create_schema_and_outbox_messages::Migration),
            Box::new(m20250801_121000_add_processed_messages::Migration),
        ]
    }
}
