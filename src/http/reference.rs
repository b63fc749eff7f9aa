use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;

use crate::dtos::ingredient_dto::IngredientDTO;
use crate::dtos::tag_dto::TagDTO;
use crate::error::AppResult;
use crate::http::param;
use crate::services::{ingredient_service, tag_service};
use crate::state::AppState;

pub async fn list_tags(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let tags: Vec<TagDTO> = tag_service::find_all(&state.db)
        .await?
        .into_iter()
        .map(TagDTO::from)
        .collect();
    Ok(Json(tags))
}

pub async fn get_tag(State(state): State<Arc<AppState>>, Path(id): Path<i32>) -> AppResult<impl IntoResponse> {
    let tag = tag_service::find_by_id(&state.db, id).await?;
    Ok(Json(TagDTO::from(tag)))
}

/// `?name=` narrows the list to ingredients starting with that prefix
pub async fn list_ingredients(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> AppResult<impl IntoResponse> {
    let ingredients: Vec<IngredientDTO> = ingredient_service::find_all(&state.db, param(&params, "name"))
        .await?
        .into_iter()
        .map(IngredientDTO::from)
        .collect();
    Ok(Json(ingredients))
}

pub async fn get_ingredient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let ingredient = ingredient_service::find_by_id(&state.db, id).await?;
    Ok(Json(IngredientDTO::from(ingredient)))
}
