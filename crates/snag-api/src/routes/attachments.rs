//! Attachment routes: raw-body upload, listing, moderated deletion, and
//! download by locator.

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use snag_core::{Attachment, AttachmentId, DefectId};
use snag_service::attachments::MAX_UPLOAD_BYTES;
use snag_service::{AttachmentDeletion, AttachmentUpload};

use crate::error::AppError;
use crate::extract::Identity;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/defects/{id}/attachments", get(list).post(upload))
        .route("/attachments/{id}", delete(remove))
        .route("/attachments/{id}/download", get(download))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

async fn list(
    State(state): State<AppState>,
    _caller: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Attachment>>, AppError> {
    Ok(Json(
        state.services.attachments.list(DefectId::from(id)).await?,
    ))
}

#[derive(Debug, Deserialize)]
struct UploadParams {
    file_name: String,
}

/// Upload is the raw request body; the content type comes from the
/// Content-Type header and the name from the `file_name` query parameter.
async fn upload(
    State(state): State<AppState>,
    Identity(caller): Identity,
    Path(id): Path<Uuid>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Attachment>), AppError> {
    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let attachment = state
        .services
        .attachments
        .create(
            DefectId::from(id),
            &caller,
            AttachmentUpload {
                file_name: params.file_name,
                mime_type,
                data: body.to_vec(),
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(attachment)))
}

async fn remove(
    State(state): State<AppState>,
    Identity(caller): Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<AttachmentDeletion>, AppError> {
    Ok(Json(
        state
            .services
            .attachments
            .delete(AttachmentId::from(id), &caller)
            .await?,
    ))
}

async fn download(
    State(state): State<AppState>,
    _caller: Identity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let (attachment, data) = state
        .services
        .attachments
        .download(AttachmentId::from(id))
        .await?;

    let content_type = HeaderValue::from_str(&attachment.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        attachment.file_name.replace(['"', '\r', '\n'], "_")
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    ))
}
