use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::instrument;

use crate::{
    auth::jwt::AuthUser,
    dashboard::{
        dto::{DashboardStats, RankingEntry},
        service::{self, Period},
    },
    error::ApiError,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RankingQuery {
    pub period: Option<String>,
}

#[instrument(skip(state))]
pub async fn stats(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<DashboardStats>, ApiError> {
    let stats = service::dashboard_stats(&state.db, identity.id, OffsetDateTime::now_utc()).await?;
    Ok(Json(stats))
}

#[instrument(skip(state))]
pub async fn ranking(
    State(state): State<AppState>,
    AuthUser(_identity): AuthUser,
    Query(query): Query<RankingQuery>,
) -> Result<Json<Vec<RankingEntry>>, ApiError> {
    let period = Period::parse(query.period.as_deref());
    let since = period.start(OffsetDateTime::now_utc());
    let board = service::leaderboard(&state.db, since).await?;
    Ok(Json(board))
}
