use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("CREATE SCHEMA IF NOT EXISTS event_relay")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("ALTER SCHEMA event_relay OWNER TO relay")
            .await?;

        // Append-only outbox. event_type and payload are immutable after
        // insert; published_on transitions NULL -> timestamp exactly once,
        // stamped by the publisher job. Rows are never deleted here.
        let create_table_sql = r#"
            CREATE TABLE IF NOT EXISTS event_relay.outbox_messages (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),

                event_type VARCHAR(255) NOT NULL,
                payload JSONB NOT NULL,

                created_on TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                published_on TIMESTAMPTZ
            )
        "#;

        manager
            .get_connection()
            .execute_unprepared(create_table_sql)
            .await?;

        manager
            .get_connection()
            .execute_unprepared("ALTER TABLE event_relay.outbox_messages OWNER TO relay")
            .await?;

        // The publisher job polls for unpublished rows in creation order.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX IF NOT EXISTS idx_outbox_messages_unpublished
                 ON event_relay.outbox_messages(created_on) WHERE published_on IS NULL",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS event_relay.outbox_messages")
            .await?;

        Ok(())
    }
}
