use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::models::user;
use crate::services::user_service;
use crate::state::AppState;

/// Authenticated caller, resolved from `Authorization: Token <key>`
pub struct CurrentUser(pub user::Model);

/// Caller on read endpoints. Anonymous when no token is sent; a token that
/// is sent must still be valid.
pub struct MaybeUser(pub Option<user::Model>);

fn token_from(parts: &Parts) -> Result<Option<&str>, AppError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| AppError::Unauthorized)?;
    value
        .strip_prefix("Token ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(Some)
        .ok_or(AppError::Unauthorized)
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = token_from(parts)?.ok_or(AppError::Unauthorized)?;
        let user = user_service::authenticate(&state.db, token).await?;
        Ok(CurrentUser(user))
    }
}

impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        match token_from(parts)? {
            Some(token) => Ok(MaybeUser(Some(user_service::authenticate(&state.db, token).await?))),
            None => Ok(MaybeUser(None)),
        }
    }
}
