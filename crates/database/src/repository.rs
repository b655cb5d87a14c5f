use crate::DbError;
use analytics::{DailyAggregate, PeriodAggregate, TimeWindow, TopProduct};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use core_types::{OrderStatus, Store, StoreSettings};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::types::Json;
use sqlx::{FromRow, Row};
use uuid::Uuid;

/// Data access required by the reseller endpoints.
///
/// The aggregate methods only ever count orders whose status is `completed`.
#[async_trait]
pub trait ResellerRepository: Send + Sync {
    /// The store owned by the reseller, if one has been provisioned.
    async fn find_store_by_reseller(&self, reseller_id: Uuid) -> Result<Option<Store>, DbError>;

    /// Replaces the settings document of a store in a single write and returns the stored result.
    async fn update_store_settings(
        &self,
        store_id: Uuid,
        settings: &StoreSettings,
    ) -> Result<Store, DbError>;

    /// Completed-order totals per UTC day, ascending by date.
    async fn daily_sales(
        &self,
        reseller_id: Uuid,
        window: &TimeWindow,
    ) -> Result<Vec<DailyAggregate>, DbError>;

    /// Completed-order totals for the whole window.
    async fn period_sales(
        &self,
        reseller_id: Uuid,
        window: &TimeWindow,
    ) -> Result<PeriodAggregate, DbError>;

    /// Best-selling catalog products by line-item revenue, descending.
    async fn top_products(
        &self,
        reseller_id: Uuid,
        window: &TimeWindow,
        limit: usize,
    ) -> Result<Vec<TopProduct>, DbError>;
}

/// PostgreSQL implementation of [`ResellerRepository`].
///
/// Grouping, joining, sorting and limiting all run inside the database.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

/// Represents a row from the `stores` table.
#[derive(Debug, Clone, FromRow)]
struct DbStore {
    id: Uuid,
    reseller_id: Uuid,
    name: String,
    settings: Json<StoreSettings>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DbStore> for Store {
    fn from(row: DbStore) -> Self {
        Store {
            id: row.id,
            reseller_id: row.reseller_id,
            name: row.name,
            settings: row.settings.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn end_operator(window: &TimeWindow) -> &'static str {
    if window.end_inclusive { "<=" } else { "<" }
}

fn count(row: &PgRow, column: &str) -> Result<u64, DbError> {
    let value: i64 = row.try_get(column)?;
    u64::try_from(value).map_err(|_| DbError::CorruptRow(format!("negative {column}: {value}")))
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResellerRepository for DbRepository {
    async fn find_store_by_reseller(&self, reseller_id: Uuid) -> Result<Option<Store>, DbError> {
        let row = sqlx::query_as::<_, DbStore>(
            "SELECT id, reseller_id, name, settings, created_at, updated_at FROM stores WHERE reseller_id = $1",
        )
        .bind(reseller_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Store::from))
    }

    async fn update_store_settings(
        &self,
        store_id: Uuid,
        settings: &StoreSettings,
    ) -> Result<Store, DbError> {
        let row = sqlx::query_as::<_, DbStore>(
            r#"
            UPDATE stores
            SET settings = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, reseller_id, name, settings, created_at, updated_at
            "#,
        )
        .bind(store_id)
        .bind(Json(settings))
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(row.into())
    }

    async fn daily_sales(
        &self,
        reseller_id: Uuid,
        window: &TimeWindow,
    ) -> Result<Vec<DailyAggregate>, DbError> {
        let query = format!(
            r#"
            SELECT
                (created_at AT TIME ZONE 'UTC')::date AS day,
                COALESCE(SUM(total), 0) AS revenue,
                COALESCE(SUM(cost), 0) AS cost,
                COUNT(*) AS orders,
                COUNT(DISTINCT customer_id) AS customers
            FROM orders
            WHERE reseller_id = $1 AND status = $2 AND created_at >= $3 AND created_at {} $4
            GROUP BY day
            ORDER BY day ASC
            "#,
            end_operator(window)
        );

        let rows = sqlx::query(&query)
            .bind(reseller_id)
            .bind(OrderStatus::Completed.as_str())
            .bind(window.start)
            .bind(window.end)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok::<_, DbError>(DailyAggregate {
                    date: row.try_get::<NaiveDate, _>("day")?,
                    revenue: row.try_get::<Decimal, _>("revenue")?,
                    cost: row.try_get::<Decimal, _>("cost")?,
                    orders: count(row, "orders")?,
                    customers: count(row, "customers")?,
                })
            })
            .collect()
    }

    async fn period_sales(
        &self,
        reseller_id: Uuid,
        window: &TimeWindow,
    ) -> Result<PeriodAggregate, DbError> {
        let query = format!(
            r#"
            SELECT
                COALESCE(SUM(total), 0) AS revenue,
                COALESCE(SUM(cost), 0) AS cost,
                COUNT(*) AS orders,
                COUNT(DISTINCT customer_id) AS customers
            FROM orders
            WHERE reseller_id = $1 AND status = $2 AND created_at >= $3 AND created_at {} $4
            "#,
            end_operator(window)
        );

        let row = sqlx::query(&query)
            .bind(reseller_id)
            .bind(OrderStatus::Completed.as_str())
            .bind(window.start)
            .bind(window.end)
            .fetch_one(&self.pool)
            .await?;

        Ok(PeriodAggregate {
            revenue: row.try_get("revenue")?,
            cost: row.try_get("cost")?,
            orders: count(&row, "orders")?,
            customers: count(&row, "customers")?,
        })
    }

    async fn top_products(
        &self,
        reseller_id: Uuid,
        window: &TimeWindow,
        limit: usize,
    ) -> Result<Vec<TopProduct>, DbError> {
        let query = format!(
            r#"
            SELECT
                oi.product_id,
                p.title,
                SUM(oi.quantity)::BIGINT AS total_sales,
                SUM(oi.price * oi.quantity) AS revenue
            FROM order_items AS oi
            JOIN orders AS o ON o.id = oi.order_id
            JOIN products AS p ON p.id = oi.product_id
            WHERE o.reseller_id = $1 AND o.status = $2 AND o.created_at >= $3 AND o.created_at {} $4
            GROUP BY oi.product_id, p.title
            ORDER BY revenue DESC, p.title ASC
            LIMIT $5
            "#,
            end_operator(window)
        );

        let limit = i64::try_from(limit)
            .map_err(|_| DbError::InvalidArgument(format!("limit too large: {limit}")))?;

        let rows = sqlx::query(&query)
            .bind(reseller_id)
            .bind(OrderStatus::Completed.as_str())
            .bind(window.start)
            .bind(window.end)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok::<_, DbError>(TopProduct {
                    product_id: row.try_get("product_id")?,
                    title: row.try_get("title")?,
                    total_sales: count(row, "total_sales")?,
                    revenue: row.try_get("revenue")?,
                })
            })
            .collect()
    }
}
