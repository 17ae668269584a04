use crate::aggregation::{Month, Subscription};
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub service_name: String,
    /// Monthly price in minor currency units
    pub price: i32,
    /// Canonical hyphenated UUID of the owning user
    pub user_id: String,
    /// Always the first day of the month
    pub start_date: Date,
    /// Always the first day of the month; `None` while the subscription is open-ended
    pub end_date: Option<Date>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn start_month(&self) -> Month {
        Month::from_date(self.start_date)
    }

    pub fn end_month(&self) -> Option<Month> {
        self.end_date.map(Month::from_date)
    }
}

impl From<Model> for Subscription {
    fn from(model: Model) -> Self {
        Subscription {
            id: model.id,
            start: model.start_month(),
            end: model.end_month(),
            service_name: model.service_name,
            price: model.price,
            user_id: model.user_id,
        }
    }
}
