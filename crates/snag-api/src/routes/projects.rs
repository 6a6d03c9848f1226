//! Project and stage routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use snag_core::{Project, ProjectId, Stage};
use snag_query::Paged;
use snag_service::CreateProjectInput;

use crate::error::AppError;
use crate::extract::Identity;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list).post(create))
        .route("/projects/{id}/stages", get(list_stages))
}

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    q: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
}

async fn list(
    State(state): State<AppState>,
    _caller: Identity,
    Query(params): Query<ListParams>,
) -> Result<Json<Paged<Project>>, AppError> {
    Ok(Json(
        state
            .services
            .projects
            .list(
                params.q.as_deref(),
                params.limit.as_deref(),
                params.offset.as_deref(),
            )
            .await?,
    ))
}

async fn create(
    State(state): State<AppState>,
    _caller: Identity,
    Json(input): Json<CreateProjectInput>,
) -> Result<(StatusCode, Json<Project>), AppError> {
    let project = state.services.projects.create(input).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn list_stages(
    State(state): State<AppState>,
    _caller: Identity,
    Path(id): Path<Uuid>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paged<Stage>>, AppError> {
    Ok(Json(
        state
            .services
            .projects
            .list_stages(
                ProjectId::from(id),
                params.limit.as_deref(),
                params.offset.as_deref(),
            )
            .await?,
    ))
}
