//! User administration routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use uuid::Uuid;

use snag_core::{User, UserId};
use snag_service::CreateUserInput;

use crate::error::AppError;
use crate::extract::Identity;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list).post(create))
        .route("/users/{id}", delete(remove))
}

async fn list(
    State(state): State<AppState>,
    Identity(caller): Identity,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.services.users.list(&caller).await?))
}

async fn create(
    State(state): State<AppState>,
    Identity(caller): Identity,
    Json(input): Json<CreateUserInput>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state.services.users.create(input, &caller).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn remove(
    State(state): State<AppState>,
    Identity(caller): Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .services
        .users
        .delete(UserId::from(id), &caller)
        .await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
