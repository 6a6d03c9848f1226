//! Defect routes: listing, creation, field updates, deletion, the status
//! transition, and the filtered export.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use snag_core::{Defect, DefectId};
use snag_query::{Paged, RawDefectFilter};
use snag_service::{CreateDefectInput, ListDefectsParams, UpdateDefectInput};

use crate::error::AppError;
use crate::extract::Identity;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/defects", get(list).post(create))
        .route("/defects/export", get(export))
        .route(
            "/defects/{id}",
            get(get_one).patch(update).delete(remove),
        )
        .route("/defects/{id}/status", patch(change_status))
}

async fn list(
    State(state): State<AppState>,
    _caller: Identity,
    Query(params): Query<ListDefectsParams>,
) -> Result<Json<Paged<Defect>>, AppError> {
    Ok(Json(state.services.defects.list(&params).await?))
}

async fn get_one(
    State(state): State<AppState>,
    _caller: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Defect>, AppError> {
    Ok(Json(state.services.defects.get(DefectId::from(id)).await?))
}

async fn create(
    State(state): State<AppState>,
    _caller: Identity,
    Json(input): Json<CreateDefectInput>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let id = state.services.defects.create(input).await?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

async fn update(
    State(state): State<AppState>,
    _caller: Identity,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateDefectInput>,
) -> Result<Json<Defect>, AppError> {
    Ok(Json(
        state
            .services
            .defects
            .update_fields(DefectId::from(id), input)
            .await?,
    ))
}

async fn remove(
    State(state): State<AppState>,
    Identity(caller): Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .services
        .defects
        .delete(DefectId::from(id), &caller)
        .await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: String,
}

async fn change_status(
    State(state): State<AppState>,
    Identity(caller): Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Defect>, AppError> {
    Ok(Json(
        state
            .services
            .defects
            .transition(DefectId::from(id), &body.status, &caller)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
struct ExportParams {
    #[serde(flatten)]
    filter: RawDefectFilter,
    sort: Option<String>,
}

/// The full filtered, ordered set; the JSON body is the export payload
/// handed to whatever renderer the client applies.
async fn export(
    State(state): State<AppState>,
    Identity(caller): Identity,
    Query(params): Query<ExportParams>,
) -> Result<Json<Vec<Defect>>, AppError> {
    Ok(Json(
        state
            .services
            .defects
            .export(&params.filter, params.sort.as_deref(), &caller)
            .await?,
    ))
}
