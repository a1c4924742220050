use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    Created,
    Updated,
    Deleted,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Created => "created",
            HistoryAction::Updated => "updated",
            HistoryAction::Deleted => "deleted",
        }
    }
}

/// One audit row per buyer mutation. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryRow {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub details: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// A history entry joined with the acting user, for a single buyer's trail.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BuyerHistoryItem {
    pub id: Uuid,
    pub action: String,
    pub details: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub user_id: Option<Uuid>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

/// A history entry across all buyers, joined with the user and the buyer's name.
/// Buyer name columns are null once the buyer has been deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivityItem {
    pub id: Uuid,
    pub action: String,
    pub details: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub buyer_id: Uuid,
    pub user_id: Option<Uuid>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub buyer_first_name: Option<String>,
    pub buyer_last_name: Option<String>,
}
