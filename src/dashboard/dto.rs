use std::collections::BTreeMap;

use serde::Serialize;
use sqlx::FromRow;

/// Aggregate payload for GET /dashboard/stats.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_today: i64,
    pub total_week: i64,
    pub productivity: i64,
    pub average_productivity: i64,
    /// 1-based position in the weekly leaderboard; 0 when absent.
    pub ranking: i64,
    pub weekly_data: Vec<WeeklyPoint>,
    pub by_category: BTreeMap<String, i64>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct WeeklyPoint {
    pub day: &'static str,
    pub hours: i64,
}

/// One leaderboard row, joined with the owner's public profile.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RankingEntry {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    #[serde(rename = "totalTempo")]
    pub total_tempo: i64,
}
