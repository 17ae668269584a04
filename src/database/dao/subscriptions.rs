use crate::aggregation::{
    AggregateFilter, Month, Subscription, SubscriptionSource, Window, service_name_matches,
};
use crate::database::entities::{SubscriptionRecord, subscriptions};
use crate::database::{DatabaseError, DatabaseResult};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, LikeExpr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, ConnectionTrait, DatabaseBackend,
    DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

/// Validated fields of a subscription, used for both create and update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub service_name: String,
    pub price: i32,
    pub user_id: String,
    pub start: Month,
    pub end: Option<Month>,
}

/// Subscription list parameters
#[derive(Debug, Clone)]
pub struct SubscriptionListQuery {
    pub user_id: Option<String>,
    /// Case-insensitive substring of the service name
    pub service_name: Option<String>,
    pub limit: u64,
    pub offset: u64,
}

impl Default for SubscriptionListQuery {
    fn default() -> Self {
        Self {
            user_id: None,
            service_name: None,
            limit: 50,
            offset: 0,
        }
    }
}

/// Subscriptions DAO for database operations
#[derive(Clone)]
pub struct SubscriptionsDao {
    db: DatabaseConnection,
}

impl SubscriptionsDao {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// PostgreSQL folds case with `ILIKE`. SQLite's `LOWER` and `LIKE` only fold
    /// ASCII, so there the service-name filter runs after the fetch.
    fn service_filter_in_sql(&self) -> bool {
        self.db.get_database_backend() == DatabaseBackend::Postgres
    }

    /// Store a new subscription; the id is assigned here
    pub async fn create(&self, subscription: &NewSubscription) -> DatabaseResult<SubscriptionRecord> {
        let now = Utc::now();
        let active_model = subscriptions::ActiveModel {
            id: Set(Uuid::new_v4()),
            service_name: Set(subscription.service_name.clone()),
            price: Set(subscription.price),
            user_id: Set(subscription.user_id.clone()),
            start_date: Set(subscription.start.first_day()),
            end_date: Set(subscription.end.map(|m| m.first_day())),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let record = active_model
            .insert(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(record)
    }

    /// Find subscription by ID
    pub async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<SubscriptionRecord>> {
        let record = subscriptions::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(record)
    }

    /// List subscriptions, most recent start first
    pub async fn list(&self, query: &SubscriptionListQuery) -> DatabaseResult<Vec<SubscriptionRecord>> {
        let mut select =
            subscriptions::Entity::find().order_by_desc(subscriptions::Column::StartDate);

        if let Some(ref user_id) = query.user_id {
            select = select.filter(subscriptions::Column::UserId.eq(user_id));
        }

        let service_name = match query.service_name.as_deref() {
            Some(needle) if self.service_filter_in_sql() => {
                select = select.filter(service_name_ilike(needle));
                None
            }
            other => other,
        };

        let Some(needle) = service_name else {
            return select
                .limit(query.limit)
                .offset(query.offset)
                .all(&self.db)
                .await
                .map_err(|e| DatabaseError::Database(e.to_string()));
        };

        // Paging has to follow the in-memory filter
        let records = select
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(records
            .into_iter()
            .filter(|record| service_name_matches(&record.service_name, needle))
            .skip(usize::try_from(query.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(query.limit).unwrap_or(usize::MAX))
            .collect())
    }

    /// Replace every mutable field of an existing subscription
    pub async fn update(
        &self,
        id: Uuid,
        subscription: &NewSubscription,
    ) -> DatabaseResult<SubscriptionRecord> {
        let active_model = subscriptions::ActiveModel {
            id: Set(id),
            service_name: Set(subscription.service_name.clone()),
            price: Set(subscription.price),
            user_id: Set(subscription.user_id.clone()),
            start_date: Set(subscription.start.first_day()),
            end_date: Set(subscription.end.map(|m| m.first_day())),
            created_at: ActiveValue::NotSet,
            updated_at: Set(Utc::now()),
        };

        match active_model.update(&self.db).await {
            Ok(record) => Ok(record),
            Err(DbErr::RecordNotUpdated) | Err(DbErr::RecordNotFound(_)) => {
                Err(DatabaseError::NotFound)
            }
            Err(e) => Err(DatabaseError::Database(e.to_string())),
        }
    }

    /// Delete a subscription
    pub async fn delete(&self, id: Uuid) -> DatabaseResult<()> {
        let result = subscriptions::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(DatabaseError::NotFound);
        }

        Ok(())
    }
}

#[async_trait]
impl SubscriptionSource for SubscriptionsDao {
    async fn find_overlapping(
        &self,
        window: &Window,
        filter: &AggregateFilter,
    ) -> DatabaseResult<Vec<Subscription>> {
        let mut select = subscriptions::Entity::find()
            .filter(subscriptions::Column::StartDate.lte(window.to().first_day()))
            .filter(
                Condition::any()
                    .add(subscriptions::Column::EndDate.is_null())
                    .add(subscriptions::Column::EndDate.gte(window.from().first_day())),
            );

        if let Some(ref user_id) = filter.user_id {
            select = select.filter(subscriptions::Column::UserId.eq(user_id));
        }
        let in_sql = self.service_filter_in_sql();
        if let Some(ref service_name) = filter.service_name {
            if in_sql {
                select = select.filter(service_name_ilike(service_name));
            }
        }

        let records = select
            .order_by_asc(subscriptions::Column::ServiceName)
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(records
            .into_iter()
            .map(Subscription::from)
            .filter(|sub| in_sql || filter.matches(sub))
            .collect())
    }
}

/// `service_name ILIKE '%needle%'` with the needle's own wildcards escaped
fn service_name_ilike(needle: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(needle));
    Expr::col(subscriptions::Column::ServiceName).ilike(LikeExpr::new(pattern).escape('\\'))
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
