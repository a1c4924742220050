use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::buyers::history::append_history;
use crate::buyers::validation::BuyerInput;
use crate::models::buyer::{Buyer, BuyerStatus};
use crate::models::history::HistoryAction;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    CreatedAt,
    UpdatedAt,
    Name,
}

impl SortBy {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "createdAt" => Some(SortBy::CreatedAt),
            "updatedAt" => Some(SortBy::UpdatedAt),
            "name" => Some(SortBy::Name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Filter, sort and page for a buyer listing.
#[derive(Debug, Clone, PartialEq)]
pub struct BuyerFilter {
    pub status: Option<BuyerStatus>,
    pub search: Option<String>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub page: u32,
    pub limit: u32,
}

impl Default for BuyerFilter {
    fn default() -> Self {
        Self {
            status: None,
            search: None,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl BuyerFilter {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }

    /// Column list for ORDER BY. Only whitelisted column names are produced.
    pub fn order_clause(&self) -> &'static str {
        match (self.sort_by, self.sort_order) {
            (SortBy::CreatedAt, SortOrder::Asc) => "created_at ASC",
            (SortBy::CreatedAt, SortOrder::Desc) => "created_at DESC",
            (SortBy::UpdatedAt, SortOrder::Asc) => "updated_at ASC",
            (SortBy::UpdatedAt, SortOrder::Desc) => "updated_at DESC",
            (SortBy::Name, SortOrder::Asc) => "first_name ASC, last_name ASC",
            (SortBy::Name, SortOrder::Desc) => "first_name DESC, last_name DESC",
        }
    }

    fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut joiner = " WHERE ";
        if let Some(status) = self.status {
            qb.push(joiner).push("status = ").push_bind(status);
            joiner = " AND ";
        }
        if let Some(search) = &self.search {
            qb.push(joiner)
                .push("(first_name || ' ' || last_name || ' ' || email) ILIKE ")
                .push_bind(format!("%{search}%"));
        }
    }
}

pub async fn list_buyers(pool: &PgPool, filter: &BuyerFilter) -> Result<Vec<Buyer>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM buyers");
    filter.push_where(&mut qb);
    qb.push(" ORDER BY ")
        .push(filter.order_clause())
        .push(", id LIMIT ")
        .push_bind(i64::from(filter.limit))
        .push(" OFFSET ")
        .push_bind(filter.offset());
    qb.build_query_as::<Buyer>().fetch_all(pool).await
}

/// Number of buyers matching the filter, ignoring paging.
pub async fn count_buyers(pool: &PgPool, filter: &BuyerFilter) -> Result<i64, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM buyers");
    filter.push_where(&mut qb);
    qb.build_query_scalar::<i64>().fetch_one(pool).await
}

pub async fn get_buyer(pool: &PgPool, id: Uuid) -> Result<Option<Buyer>, sqlx::Error> {
    sqlx::query_as::<_, Buyer>("SELECT * FROM buyers WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

fn history_details(input: &BuyerInput, user_id: Option<Uuid>) -> Value {
    let mut details = serde_json::to_value(input).unwrap_or_default();
    if let (Some(map), Some(user_id)) = (details.as_object_mut(), user_id) {
        map.insert("userId".into(), Value::String(user_id.to_string()));
    }
    details
}

/// Inserts a buyer and records a `created` history entry.
pub async fn create_buyer(
    pool: &PgPool,
    input: &BuyerInput,
    user_id: Option<Uuid>,
) -> Result<Buyer, sqlx::Error> {
    let buyer = sqlx::query_as::<_, Buyer>(
        r#"
        INSERT INTO buyers
            (id, first_name, last_name, email, phone, status, priority,
             budget, location, notes, tags, assigned_to)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&input.first_name)
    .bind(&input.last_name)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(input.status)
    .bind(input.priority)
    .bind(input.budget)
    .bind(&input.location)
    .bind(&input.notes)
    .bind(Json(&input.tags))
    .bind(input.assigned_to)
    .fetch_one(pool)
    .await?;

    append_history(
        pool,
        buyer.id,
        user_id,
        HistoryAction::Created,
        &history_details(input, user_id),
    )
    .await?;

    info!("Created buyer {}", buyer.id);
    Ok(buyer)
}

/// Replaces a buyer's fields (last write wins). `None` if the buyer does not exist.
pub async fn update_buyer(
    pool: &PgPool,
    id: Uuid,
    input: &BuyerInput,
    user_id: Option<Uuid>,
) -> Result<Option<Buyer>, sqlx::Error> {
    let buyer = sqlx::query_as::<_, Buyer>(
        r#"
        UPDATE buyers SET
            first_name = $2, last_name = $3, email = $4, phone = $5,
            status = $6, priority = $7, budget = $8, location = $9,
            notes = $10, tags = $11, assigned_to = $12, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&input.first_name)
    .bind(&input.last_name)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(input.status)
    .bind(input.priority)
    .bind(input.budget)
    .bind(&input.location)
    .bind(&input.notes)
    .bind(Json(&input.tags))
    .bind(input.assigned_to)
    .fetch_optional(pool)
    .await?;

    if let Some(buyer) = &buyer {
        append_history(
            pool,
            buyer.id,
            user_id,
            HistoryAction::Updated,
            &history_details(input, user_id),
        )
        .await?;
        info!("Updated buyer {}", buyer.id);
    }
    Ok(buyer)
}

/// Records a `deleted` history entry, then deletes the buyer.
///
/// The history row references the buyer, so it has to be written first; the
/// cascade then removes it together with the rest of the buyer's trail.
pub async fn delete_buyer(pool: &PgPool, id: Uuid, user_id: Option<Uuid>) -> Result<bool, sqlx::Error> {
    if get_buyer(pool, id).await?.is_none() {
        return Ok(false);
    }

    append_history(pool, id, user_id, HistoryAction::Deleted, &Value::Object(Default::default()))
        .await?;

    let result = sqlx::query("DELETE FROM buyers WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    info!("Deleted buyer {id}");
    Ok(result.rows_affected() > 0)
}
