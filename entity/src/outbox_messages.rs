use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A durable record of a domain occurrence awaiting publication to the
/// external broker. Rows are append-only: `event_type` and `payload` never
/// change after creation, and only the polling publisher stamps
/// `published_on` once delivery succeeds.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize, ToSchema)]
#[sea_orm(schema_name = "event_relay", table_name = "outbox_messages")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,
    pub event_type: String,
    #[schema(value_type = Object)]
    pub payload: Json,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_on: DateTimeWithTimeZone,
    #[serde(skip_deserializing)]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub published_on: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
