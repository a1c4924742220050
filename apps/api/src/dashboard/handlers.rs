use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use crate::auth::session::CurrentUser;
use crate::buyers::history::recent_activity;
use crate::dashboard::stats::{fetch_dashboard_stats, DashboardStats};
use crate::errors::AppError;
use crate::models::history::RecentActivityItem;
use crate::state::AppState;

const RECENT_ACTIVITY_LIMIT: i64 = 5;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub stats: DashboardStats,
    pub recent_activity: Vec<RecentActivityItem>,
}

/// GET /api/dashboard
pub async fn handle_dashboard(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<DashboardResponse>, AppError> {
    let stats = fetch_dashboard_stats(&state.db, Utc::now()).await?;
    let recent_activity = recent_activity(&state.db, RECENT_ACTIVITY_LIMIT).await?;
    Ok(Json(DashboardResponse {
        stats,
        recent_activity,
    }))
}
