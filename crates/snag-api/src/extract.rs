//! Caller extraction.
//!
//! Every authenticated route takes an [`Identity`]: the resolved caller
//! with its normalized role set. A bearer credential goes through the
//! configured identity resolver; when development auth is enabled, the
//! X-User-Id / X-Roles header pair is accepted instead. A missing roles
//! header yields the empty set, never a default role.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::RequestPartsExt;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use uuid::Uuid;

use snag_core::{Caller, Error, RawRoles, RoleSet, UserId};

use crate::error::AppError;
use crate::state::AppState;

/// The authenticated caller of the current request.
pub struct Identity(pub Caller);

impl FromRequestParts<AppState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Ok(TypedHeader(auth)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
        {
            let caller = state.services.identity.resolve(auth.token()).await?;
            return Ok(Identity(caller));
        }

        if state.dev_auth {
            if let Some(caller) = dev_header_caller(parts)? {
                return Ok(Identity(caller));
            }
        }

        Err(AppError(Error::Unauthorized(
            "missing credentials".to_string(),
        )))
    }
}

fn dev_header_caller(parts: &Parts) -> Result<Option<Caller>, AppError> {
    let Some(user_id) = parts.headers.get("x-user-id") else {
        return Ok(None);
    };
    let user_id = user_id
        .to_str()
        .ok()
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .ok_or_else(|| AppError(Error::Unauthorized("malformed X-User-Id".to_string())))?;

    let roles = match parts.headers.get("x-roles").and_then(|v| v.to_str().ok()) {
        Some(raw) => RoleSet::normalize(&RawRoles::One(raw.to_string())),
        None => RoleSet::empty(),
    };
    Ok(Some(Caller::new(UserId::from(user_id), roles)))
}
