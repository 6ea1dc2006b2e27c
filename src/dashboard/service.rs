use std::collections::BTreeMap;

use sqlx::{FromRow, SqlitePool};
use time::{Date, Duration, OffsetDateTime};

use crate::dashboard::dto::{DashboardStats, RankingEntry, WeeklyPoint};
use crate::error::ApiError;

/// Daily goal in minutes (8 hours) backing the productivity percentage.
pub const DAILY_GOAL_MINUTES: i64 = 480;

/// Day labels indexed by day-of-week number, Sunday = 0.
const WEEK_DAY_LABELS: [&str; 7] = ["Seg", "Ter", "Qua", "Qui", "Sex", "Sab", "Dom"];

/// Leaderboard windows selectable on GET /ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Semana,
    Mes,
    Ano,
}

impl Period {
    /// Unknown values fall back to the weekly window.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("mês") => Self::Mes,
            Some("ano") => Self::Ano,
            _ => Self::Semana,
        }
    }

    pub fn days(self) -> i64 {
        match self {
            Self::Semana => 7,
            Self::Mes => 30,
            Self::Ano => 365,
        }
    }

    pub fn start(self, now: OffsetDateTime) -> Date {
        (now - Duration::days(self.days())).date()
    }
}

#[derive(Debug, FromRow)]
struct DayTotal {
    day: Date,
    total: i64,
}

#[derive(Debug, FromRow)]
struct CategoryTotal {
    categoria: String,
    total: i64,
}

#[derive(Debug, FromRow)]
struct UserTotal {
    id: i64,
    total: i64,
}

fn round_div(total: i64, divisor: f64) -> i64 {
    (total as f64 / divisor).round() as i64
}

pub async fn dashboard_stats(
    db: &SqlitePool,
    user_id: i64,
    now: OffsetDateTime,
) -> Result<DashboardStats, ApiError> {
    let today = now.date();
    let week_ago = Period::Semana.start(now);

    let total_today: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(tempo), 0) FROM demandas WHERE user_id = ? AND DATE(data) = ?",
    )
    .bind(user_id)
    .bind(today)
    .fetch_one(db)
    .await?;

    let total_week: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(tempo), 0) FROM demandas WHERE user_id = ? AND DATE(data) >= ?",
    )
    .bind(user_id)
    .bind(week_ago)
    .fetch_one(db)
    .await?;

    let day_totals = sqlx::query_as::<_, DayTotal>(
        "SELECT DATE(data) AS day, SUM(tempo) AS total
         FROM demandas
         WHERE user_id = ? AND DATE(data) >= ?
         GROUP BY DATE(data)
         ORDER BY day ASC",
    )
    .bind(user_id)
    .bind(week_ago)
    .fetch_all(db)
    .await?;
    let weekly_data = day_totals
        .into_iter()
        .map(|row| WeeklyPoint {
            day: WEEK_DAY_LABELS[row.day.weekday().number_days_from_sunday() as usize],
            hours: round_div(row.total, 60.0),
        })
        .collect();

    let category_totals = sqlx::query_as::<_, CategoryTotal>(
        "SELECT categoria, SUM(tempo) AS total FROM demandas WHERE user_id = ? GROUP BY categoria",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    let by_category: BTreeMap<String, i64> = category_totals
        .into_iter()
        .map(|row| (row.categoria, row.total))
        .collect();

    // Global per-item average, rounded. Intentionally a different unit than
    // the requester's percentage.
    let average: Option<f64> = sqlx::query_scalar("SELECT AVG(tempo) FROM demandas")
        .fetch_one(db)
        .await?;

    let ranking = weekly_totals(db, week_ago)
        .await?
        .iter()
        .position(|row| row.id == user_id)
        .map(|index| index as i64 + 1)
        .unwrap_or(0);

    Ok(DashboardStats {
        total_today,
        total_week,
        productivity: round_div(total_today * 100, DAILY_GOAL_MINUTES as f64),
        average_productivity: average.unwrap_or(0.0).round() as i64,
        ranking,
        weekly_data,
        by_category,
    })
}

/// Weekly minutes per user, descending; ties broken by ascending user id so
/// the order is deterministic.
async fn weekly_totals(db: &SqlitePool, since: Date) -> Result<Vec<UserTotal>, ApiError> {
    let rows = sqlx::query_as::<_, UserTotal>(
        "SELECT user_id AS id, SUM(tempo) AS total
         FROM demandas
         WHERE DATE(data) >= ?
         GROUP BY user_id
         ORDER BY total DESC, id ASC",
    )
    .bind(since)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Full leaderboard for a period, joined with each owner's public profile.
/// No pagination: the whole set is returned.
pub async fn leaderboard(db: &SqlitePool, since: Date) -> Result<Vec<RankingEntry>, ApiError> {
    let rows = sqlx::query_as::<_, RankingEntry>(
        "SELECT u.id, u.name, u.email, u.avatar, SUM(d.tempo) AS total_tempo
         FROM demandas d
         JOIN users u ON u.id = d.user_id
         WHERE DATE(d.data) >= ?
         GROUP BY u.id
         ORDER BY total_tempo DESC, u.id ASC",
    )
    .bind(since)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
