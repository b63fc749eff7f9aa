use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use log::info;
use serde_json::json;

use crate::dtos::user_dto::{
    AvatarDTO, LoginDTO, SetPasswordDTO, TokenDTO, UserCreateDTO, UserCreatedDTO,
};
use crate::error::{AppError, AppResult};
use crate::http::auth::{CurrentUser, MaybeUser};
use crate::http::{AppJson, page_request, param};
use crate::models::page::Page;
use crate::services::{image_service, membership_service, user_service};
use crate::state::AppState;
use crate::utils::media_url;

pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<UserCreateDTO>,
) -> AppResult<impl IntoResponse> {
    let user = user_service::register(&state.db, payload).await?;
    Ok((StatusCode::CREATED, Json(UserCreatedDTO::from(user))))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    Query(params): Query<Vec<(String, String)>>,
) -> AppResult<impl IntoResponse> {
    let request = page_request(&params, &state.config);
    let (users, count) = user_service::list_users(&state.db, request).await?;
    let results = user_service::to_user_dtos(&state.db, &users, viewer.as_ref()).await?;

    let base_url = format!("{}/api/users/", state.config.public_url);
    Ok(Json(Page::new(results, count, request, &base_url)))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let dto = user_service::to_user_dto(&state.db, &user, Some(&user)).await?;
    Ok(Json(dto))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let user = user_service::get_user(&state.db, id).await?;
    let dto = user_service::to_user_dto(&state.db, &user, viewer.as_ref()).await?;
    Ok(Json(dto))
}

pub async fn set_password(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<SetPasswordDTO>,
) -> AppResult<StatusCode> {
    user_service::set_password(&state.db, &user, &payload.current_password, &payload.new_password).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn put_avatar(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<AvatarDTO>,
) -> AppResult<impl IntoResponse> {
    let data = payload
        .avatar
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| AppError::validation("avatar", "This field is required."))?;

    let media_root = &state.config.media_root;
    let stored = image_service::store_data_uri(media_root, "users", "avatar", &data).await?;

    let (updated, previous) = match user_service::set_avatar(&state.db, &user, Some(stored.clone())).await {
        Ok(result) => result,
        Err(e) => {
            image_service::discard(media_root, &stored).await;
            return Err(e);
        }
    };
    if let Some(previous) = previous {
        image_service::discard(media_root, &previous).await;
    }

    Ok(Json(json!({ "avatar": updated.avatar.as_deref().map(media_url) })))
}

pub async fn delete_avatar(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> AppResult<StatusCode> {
    let (_, previous) = user_service::set_avatar(&state.db, &user, None).await?;
    if let Some(previous) = previous {
        image_service::discard(&state.config.media_root, &previous).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Values past `u32` are treated like no limit at all
fn recipes_limit(params: &[(String, String)]) -> Option<u64> {
    param(params, "recipes_limit")
        .and_then(|v| v.parse::<u32>().ok())
        .map(u64::from)
}

pub async fn subscriptions(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<Vec<(String, String)>>,
) -> AppResult<impl IntoResponse> {
    let request = page_request(&params, &state.config);
    let limit = recipes_limit(&params);
    let (cards, count) = membership_service::subscriptions(&state.db, &user, request, limit).await?;

    let mut base_url = format!("{}/api/users/subscriptions/", state.config.public_url);
    if let Some(limit) = limit {
        base_url.push_str(&format!("?recipes_limit={limit}"));
    }
    Ok(Json(Page::new(cards, count, request, &base_url)))
}

pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Query(params): Query<Vec<(String, String)>>,
) -> AppResult<impl IntoResponse> {
    let author = membership_service::follow_author(&state.db, &user, id).await?;
    let card = membership_service::subscription_card(&state.db, &author, true, recipes_limit(&params)).await?;
    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    membership_service::unfollow_author(&state.db, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<LoginDTO>,
) -> AppResult<impl IntoResponse> {
    let auth_token = user_service::login(&state.db, &payload.email, &payload.password).await?;
    Ok(Json(TokenDTO { auth_token }))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> AppResult<StatusCode> {
    user_service::logout(&state.db, &user).await?;
    info!("User {} logged out", user.id);
    Ok(StatusCode::NO_CONTENT)
}
