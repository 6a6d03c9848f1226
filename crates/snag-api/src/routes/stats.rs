//! Reporting routes.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};

use snag_query::{RawStatsFilter, StatsSummary, StatusCount};

use crate::error::AppError;
use crate::extract::Identity;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats/summary", get(summary))
        .route("/stats/status-distribution", get(status_distribution))
}

async fn summary(
    State(state): State<AppState>,
    _caller: Identity,
    Query(filter): Query<RawStatsFilter>,
) -> Result<Json<StatsSummary>, AppError> {
    Ok(Json(state.services.defects.stats_summary(&filter).await?))
}

async fn status_distribution(
    State(state): State<AppState>,
    _caller: Identity,
    Query(filter): Query<RawStatsFilter>,
) -> Result<Json<Vec<StatusCount>>, AppError> {
    Ok(Json(
        state.services.defects.status_distribution(&filter).await?,
    ))
}
