use chrono::{DateTime, Months, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::models::buyer::BuyerStatus;

/// Headline numbers for the dashboard. Rates are whole percentages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_buyers: i64,
    pub active_leads: i64,
    pub conversion_rate: i64,
    pub growth_rate: i64,
}

#[derive(Debug, Default, sqlx::FromRow)]
struct StatCounts {
    total: i64,
    active: i64,
    closed: i64,
    current_month: i64,
    previous_month: i64,
}

/// Share of all buyers that closed, 0 when there are none.
pub fn conversion_rate(closed: i64, total: i64) -> i64 {
    if total == 0 {
        return 0;
    }
    (closed as f64 / total as f64 * 100.0).round() as i64
}

/// Change in new buyers between two windows, 0 when the earlier one is empty.
pub fn growth_rate(current: i64, previous: i64) -> i64 {
    if previous == 0 {
        return 0;
    }
    ((current - previous) as f64 / previous as f64 * 100.0).round() as i64
}

/// Boundaries of the last month and the month before it, relative to `now`.
pub fn month_windows(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let one_month_ago = now.checked_sub_months(Months::new(1)).unwrap_or(now);
    let two_months_ago = now.checked_sub_months(Months::new(2)).unwrap_or(one_month_ago);
    (one_month_ago, two_months_ago)
}

/// Status literals counted as active leads.
pub fn active_statuses() -> Vec<&'static str> {
    BuyerStatus::ALL
        .iter()
        .filter(|s| s.is_active())
        .map(|s| s.as_str())
        .collect()
}

pub async fn fetch_dashboard_stats(
    pool: &PgPool,
    now: DateTime<Utc>,
) -> Result<DashboardStats, sqlx::Error> {
    let (one_month_ago, two_months_ago) = month_windows(now);

    let counts = sqlx::query_as::<_, StatCounts>(
        r#"
        SELECT
            COUNT(*) AS total,
            COUNT(*) FILTER (WHERE status::text = ANY($3)) AS active,
            COUNT(*) FILTER (WHERE status = 'closed') AS closed,
            COUNT(*) FILTER (WHERE created_at >= $1) AS current_month,
            COUNT(*) FILTER (WHERE created_at >= $2 AND created_at < $1) AS previous_month
        FROM buyers
        "#,
    )
    .bind(one_month_ago)
    .bind(two_months_ago)
    .bind(active_statuses())
    .fetch_one(pool)
    .await?;

    Ok(DashboardStats {
        total_buyers: counts.total,
        active_leads: counts.active,
        conversion_rate: conversion_rate(counts.closed, counts.total),
        growth_rate: growth_rate(counts.current_month, counts.previous_month),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_conversion_rate() {
        assert_eq!(conversion_rate(0, 0), 0);
        assert_eq!(conversion_rate(1, 3), 33);
        assert_eq!(conversion_rate(2, 3), 67);
        assert_eq!(conversion_rate(5, 5), 100);
    }

    #[test]
    fn test_active_statuses_exclude_closed_and_lost() {
        assert_eq!(
            active_statuses(),
            vec!["new", "contacted", "qualified", "negotiating"]
        );
    }

    #[test]
    fn test_growth_rate() {
        assert_eq!(growth_rate(10, 0), 0);
        assert_eq!(growth_rate(15, 10), 50);
        assert_eq!(growth_rate(5, 10), -50);
        assert_eq!(growth_rate(10, 10), 0);
        assert_eq!(growth_rate(1, 3), -67);
    }

    #[test]
    fn test_month_windows_clamp_to_month_end() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        let (one, two) = month_windows(now);
        assert_eq!(one, Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap());
        assert_eq!(two, Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let stats = DashboardStats {
            total_buyers: 3,
            active_leads: 2,
            conversion_rate: 33,
            growth_rate: 0,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalBuyers"], 3);
        assert_eq!(json["activeLeads"], 2);
        assert_eq!(json["conversionRate"], 33);
        assert_eq!(json["growthRate"], 0);
    }
}
