use super::error::Error;
use entity::outbox_messages::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::debug;
use sea_orm::sea_query::Expr;
use sea_orm::{
    entity::prelude::*, ActiveValue::Set, DatabaseConnection, QueryOrder, QuerySelect,
    TryIntoModel,
};

/// Appends a new outbox message. The payload and event type are never
/// modified after this point; only `published_on` is stamped later by the
/// publisher job.
pub async fn create(
    db: &DatabaseConnection,
    event_type: String,
    payload: serde_json::Value,
) -> Result<Model, Error> {
    debug!("Appending outbox message with event_type: {event_type}");

    let now = chrono::Utc::now();

    let active_model = ActiveModel {
        event_type: Set(event_type),
        payload: Set(payload),
        created_on: Set(now.into()),
        published_on: Set(None),
        ..Default::default()
    };

    Ok(active_model.save(db).await?.try_into_model()?)
}

/// Returns the oldest unpublished messages, in creation order, bounded by
/// `batch_size`. The publisher job walks this list head-first.
pub async fn find_unpublished(
    db: &DatabaseConnection,
    batch_size: u64,
) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::PublishedOn.is_null())
        .order_by_asc(Column::CreatedOn)
        .limit(batch_size)
        .all(db)
        .await?)
}

/// Stamps `published_on` on a message, guarded so the transition happens at
/// most once. Returns `true` when this call performed the stamp and `false`
/// when the message was already published (a duplicate mark is a no-op).
pub async fn mark_published(db: &DatabaseConnection, id: Id) -> Result<bool, Error> {
    let now = chrono::Utc::now();

    let result = Entity::update_many()
        .col_expr(
            Column::PublishedOn,
            Expr::value(DateTimeWithTimeZone::from(now)),
        )
        .filter(Column::Id.eq(id))
        .filter(Column::PublishedOn.is_null())
        .exec(db)
        .await?;

    Ok(result.rows_affected == 1)
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;

    fn test_model() -> Model {
        let now = chrono::Utc::now();
        Model {
            id: Id::new_v4(),
            event_type: "case.created".to_string(),
            payload: json!({"eventType": "case.created", "result": {"id": "c-1"}}),
            created_on: now.into(),
            published_on: None,
        }
    }

    #[tokio::test]
    async fn create_returns_the_appended_message() -> Result<(), Error> {
        let model = test_model();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model.clone()]])
            .into_connection();

        let result = create(&db, model.event_type.clone(), model.payload.clone()).await?;

        assert_eq!(result.event_type, "case.created");
        assert_eq!(result.payload, model.payload);
        assert!(result.published_on.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn find_unpublished_returns_pending_messages() -> Result<(), Error> {
        let model = test_model();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model.clone()]])
            .into_connection();

        let result = find_unpublished(&db, 50).await?;
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, model.id);
        Ok(())
    }

    #[tokio::test]
    async fn mark_published_stamps_an_unpublished_message() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        assert!(mark_published(&db, Id::new_v4()).await?);
        Ok(())
    }

    #[tokio::test]
    async fn mark_published_is_a_no_op_when_already_stamped() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        assert!(!mark_published(&db, Id::new_v4()).await?);
        Ok(())
    }
}
