use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "buyer_status", rename_all = "lowercase")]
pub enum BuyerStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Negotiating,
    Closed,
    Lost,
}

impl BuyerStatus {
    pub const ALL: [BuyerStatus; 6] = [
        BuyerStatus::New,
        BuyerStatus::Contacted,
        BuyerStatus::Qualified,
        BuyerStatus::Negotiating,
        BuyerStatus::Closed,
        BuyerStatus::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuyerStatus::New => "new",
            BuyerStatus::Contacted => "contacted",
            BuyerStatus::Qualified => "qualified",
            BuyerStatus::Negotiating => "negotiating",
            BuyerStatus::Closed => "closed",
            BuyerStatus::Lost => "lost",
        }
    }

    /// Leads still moving through the pipeline.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            BuyerStatus::New
                | BuyerStatus::Contacted
                | BuyerStatus::Qualified
                | BuyerStatus::Negotiating
        )
    }
}

impl FromStr for BuyerStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|v| v.as_str() == s).ok_or(())
    }
}

impl fmt::Display for BuyerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "buyer_priority", rename_all = "lowercase")]
pub enum BuyerPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl BuyerPriority {
    pub const ALL: [BuyerPriority; 3] = [BuyerPriority::Low, BuyerPriority::Medium, BuyerPriority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuyerPriority::Low => "low",
            BuyerPriority::Medium => "medium",
            BuyerPriority::High => "high",
        }
    }
}

impl FromStr for BuyerPriority {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|v| v.as_str() == s).ok_or(())
    }
}

impl fmt::Display for BuyerPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Buyer {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub status: BuyerStatus,
    pub priority: BuyerPriority,
    pub budget: Option<i64>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub tags: Json<Vec<String>>,
    pub assigned_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
