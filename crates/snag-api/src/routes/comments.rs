//! Comment routes, nested under defects for listing and creation.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use snag_core::{Comment, CommentId, DefectId};
use snag_query::Paged;
use snag_service::CreateCommentInput;

use crate::error::AppError;
use crate::extract::Identity;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/defects/{id}/comments", get(list).post(create))
        .route("/comments/{id}", delete(remove))
}

#[derive(Debug, Default, Deserialize)]
struct PageParams {
    limit: Option<String>,
    offset: Option<String>,
}

async fn list(
    State(state): State<AppState>,
    _caller: Identity,
    Path(id): Path<Uuid>,
    Query(page): Query<PageParams>,
) -> Result<Json<Paged<Comment>>, AppError> {
    Ok(Json(
        state
            .services
            .comments
            .list(
                DefectId::from(id),
                page.limit.as_deref(),
                page.offset.as_deref(),
            )
            .await?,
    ))
}

async fn create(
    State(state): State<AppState>,
    Identity(caller): Identity,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateCommentInput>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let comment_id = state
        .services
        .comments
        .create(DefectId::from(id), &caller, input)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": comment_id })),
    ))
}

async fn remove(
    State(state): State<AppState>,
    Identity(caller): Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .services
        .comments
        .delete(CommentId::from(id), &caller)
        .await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
