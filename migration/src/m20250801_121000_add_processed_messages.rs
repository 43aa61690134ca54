use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Dedup ledger for downstream consumers: one row per
        // (consumer, message_id) pair already processed. The retention sweep
        // deletes rows past the configured window.
        let create_table_sql = r#"
            CREATE TABLE IF NOT EXISTS event_relay.processed_messages (
                consumer VARCHAR(255) NOT NULL,
                message_id UUID NOT NULL,

                processed_on TIMESTAMPTZ NOT NULL DEFAULT NOW(),

                PRIMARY KEY (consumer, message_id)
            )
        "#;

        manager
            .get_connection()
            .execute_unprepared(create_table_sql)
            .await?;

        manager
            .get_connection()
            .execute_unprepared("ALTER TABLE event_relay.processed_messages OWNER TO relay")
            .await?;

        // The retention sweep filters on processed_on.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX IF NOT EXISTS idx_processed_messages_processed_on
                 ON event_relay.processed_messages(processed_on)",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS event_relay.processed_messages")
            .await?;

        Ok(())
    }
}
