use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::history::{BuyerHistoryItem, HistoryAction, HistoryEntryRow, RecentActivityItem};

pub async fn append_history(
    pool: &PgPool,
    buyer_id: Uuid,
    user_id: Option<Uuid>,
    action: HistoryAction,
    details: &Value,
) -> Result<HistoryEntryRow, sqlx::Error> {
    sqlx::query_as::<_, HistoryEntryRow>(
        r#"
        INSERT INTO buyer_history (id, buyer_id, user_id, action, details)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(buyer_id)
    .bind(user_id)
    .bind(action.as_str())
    .bind(details)
    .fetch_one(pool)
    .await
}

/// A buyer's audit trail, newest first.
pub async fn buyer_history(pool: &PgPool, buyer_id: Uuid) -> Result<Vec<BuyerHistoryItem>, sqlx::Error> {
    sqlx::query_as::<_, BuyerHistoryItem>(
        r#"
        SELECT h.id, h.action, h.details, h.created_at, h.user_id,
               u.name AS user_name, u.email AS user_email
        FROM buyer_history h
        LEFT JOIN users u ON u.id = h.user_id
        WHERE h.buyer_id = $1
        ORDER BY h.created_at DESC
        "#,
    )
    .bind(buyer_id)
    .fetch_all(pool)
    .await
}

/// The latest history entries across all buyers.
pub async fn recent_activity(pool: &PgPool, limit: i64) -> Result<Vec<RecentActivityItem>, sqlx::Error> {
    sqlx::query_as::<_, RecentActivityItem>(
        r#"
        SELECT h.id, h.action, h.details, h.created_at, h.buyer_id, h.user_id,
               u.name AS user_name, u.email AS user_email,
               b.first_name AS buyer_first_name, b.last_name AS buyer_last_name
        FROM buyer_history h
        LEFT JOIN users u ON u.id = h.user_id
        LEFT JOIN buyers b ON b.id = h.buyer_id
        ORDER BY h.created_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}
