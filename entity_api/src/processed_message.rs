use super::error::Error;
use entity::processed_messages::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::debug;
use sea_orm::{entity::prelude::*, ActiveValue::Set, DatabaseConnection};

/// Returns whether `consumer` has already processed the message.
pub async fn is_processed(
    db: &DatabaseConnection,
    consumer: &str,
    message_id: Id,
) -> Result<bool, Error> {
    Ok(Entity::find_by_id((consumer.to_string(), message_id))
        .one(db)
        .await?
        .is_some())
}

/// Records that `consumer` has processed the message. The `(consumer,
/// message_id)` pair is the primary key, so a duplicate store surfaces as a
/// database error rather than silently overwriting the original timestamp.
pub async fn store(db: &DatabaseConnection, consumer: &str, message_id: Id) -> Result<Model, Error> {
    debug!("Recording processed message {message_id} for consumer {consumer}");

    let now = chrono::Utc::now();

    let active_model = ActiveModel {
        consumer: Set(consumer.to_string()),
        message_id: Set(message_id),
        processed_on: Set(now.into()),
    };

    Ok(active_model.insert(db).await?)
}

/// Deletes dedup entries processed before `cutoff`. Returns the number of
/// rows removed. Called by the scheduled retention sweep.
pub async fn delete_processed_before(
    db: &DatabaseConnection,
    cutoff: chrono::DateTime<chrono::Utc>,
) -> Result<u64, Error> {
    let result = Entity::delete_many()
        .filter(Column::ProcessedOn.lt(DateTimeWithTimeZone::from(cutoff)))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_model() -> Model {
        Model {
            consumer: "case-projector".to_string(),
            message_id: Id::new_v4(),
            processed_on: chrono::Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn is_processed_returns_false_before_store() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results::<Model, Vec<Model>, _>(vec![vec![]])
            .into_connection();

        assert!(!is_processed(&db, "case-projector", Id::new_v4()).await?);
        Ok(())
    }

    #[tokio::test]
    async fn is_processed_returns_true_once_stored() -> Result<(), Error> {
        let model = test_model();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model.clone()]])
            .into_connection();

        assert!(is_processed(&db, &model.consumer, model.message_id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn store_returns_the_recorded_entry() -> Result<(), Error> {
        let model = test_model();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results(vec![vec![model.clone()]])
            .into_connection();

        let result = store(&db, &model.consumer, model.message_id).await?;
        assert_eq!(result.consumer, model.consumer);
        assert_eq!(result.message_id, model.message_id);
        Ok(())
    }

    #[tokio::test]
    async fn delete_processed_before_reports_removed_rows() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 3,
            }])
            .into_connection();

        let removed = delete_processed_before(&db, chrono::Utc::now()).await?;
        assert_eq!(removed, 3);
        Ok(())
    }
}
