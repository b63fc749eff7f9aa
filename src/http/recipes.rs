use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Redirect};
use log::debug;

use crate::dtos::recipe_dto::{RecipePayload, RecipeShortDTO, ShortLinkDTO, to_write_model};
use crate::error::AppResult;
use crate::http::auth::{CurrentUser, MaybeUser};
use crate::http::{AppJson, page_request, param};
use crate::models::filter::RecipeFilter;
use crate::models::page::Page;
use crate::services::membership_service::{self, RecipeCollection};
use crate::services::{image_service, recipe_service, shopping_list_service};
use crate::state::AppState;

const RECIPE_IMAGES: &str = "recipes";

fn is_set(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true"))
}

fn recipe_filter(params: &[(String, String)]) -> RecipeFilter {
    RecipeFilter {
        author: param(params, "author").and_then(|v| v.parse().ok()),
        tags: params
            .iter()
            .filter(|(key, value)| key == "tags" && !value.is_empty())
            .map(|(_, value)| value.clone())
            .collect(),
        is_favorited: is_set(param(params, "is_favorited")),
        is_in_shopping_cart: is_set(param(params, "is_in_shopping_cart")),
    }
}

/// Stores the uploaded image, if any. Returns the reference handed to the
/// writer and the file to discard should the write fail. A blank upload is
/// passed on as an empty reference so the writer rejects it.
async fn store_upload(state: &AppState, image: Option<&str>) -> AppResult<(Option<String>, Option<String>)> {
    match image {
        Some(data) if !data.trim().is_empty() => {
            let stored =
                image_service::store_data_uri(&state.config.media_root, RECIPE_IMAGES, "image", data).await?;
            Ok((Some(stored.clone()), Some(stored)))
        }
        Some(_) => Ok((Some(String::new()), None)),
        None => Ok((None, None)),
    }
}

pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    Query(params): Query<Vec<(String, String)>>,
) -> AppResult<impl IntoResponse> {
    let filter = recipe_filter(&params);
    let request = page_request(&params, &state.config);

    let (recipes, count) = recipe_service::find_all(&state.db, &filter, request, viewer.as_ref()).await?;
    let results = recipe_service::to_read_models(&state.db, &recipes, viewer.as_ref()).await?;

    let mut base_url = format!("{}/api/recipes/", state.config.public_url);
    let query = filter.to_query();
    if !query.is_empty() {
        base_url.push('?');
        base_url.push_str(&query);
    }
    Ok(Json(Page::new(results, count, request, &base_url)))
}

pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let recipe = recipe_service::find_by_id(&state.db, id).await?;
    let dto = recipe_service::to_read_model_one(&state.db, &recipe, viewer.as_ref()).await?;
    Ok(Json(dto))
}

pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<RecipePayload>,
) -> AppResult<impl IntoResponse> {
    let (image, uploaded) = store_upload(&state, payload.image.as_deref()).await?;

    let recipe = match recipe_service::create_recipe(&state.db, &user, to_write_model(payload, image)).await {
        Ok(recipe) => recipe,
        Err(e) => {
            if let Some(uploaded) = uploaded {
                image_service::discard(&state.config.media_root, &uploaded).await;
            }
            return Err(e);
        }
    };

    let dto = recipe_service::to_read_model_one(&state.db, &recipe, Some(&user)).await?;
    Ok((StatusCode::CREATED, Json(dto)))
}

pub async fn update_recipe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<RecipePayload>,
) -> AppResult<impl IntoResponse> {
    let previous_image = recipe_service::find_by_id(&state.db, id).await?.image;
    let (image, uploaded) = store_upload(&state, payload.image.as_deref()).await?;

    let recipe = match recipe_service::update_recipe(&state.db, id, &user, to_write_model(payload, image)).await {
        Ok(recipe) => recipe,
        Err(e) => {
            if let Some(uploaded) = uploaded {
                image_service::discard(&state.config.media_root, &uploaded).await;
            }
            return Err(e);
        }
    };

    if let Some(previous) = previous_image.filter(|p| recipe.image.as_ref() != Some(p)) {
        image_service::discard(&state.config.media_root, &previous).await;
    }

    let dto = recipe_service::to_read_model_one(&state.db, &recipe, Some(&user)).await?;
    Ok(Json(dto))
}

pub async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let deleted = recipe_service::delete_recipe(&state.db, id, &user).await?;
    if let Some(image) = deleted.image {
        image_service::discard(&state.config.media_root, &image).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn add_to(
    state: &AppState,
    collection: RecipeCollection,
    user_id: i32,
    id: i32,
) -> AppResult<(StatusCode, Json<RecipeShortDTO>)> {
    let recipe = membership_service::add_recipe(&state.db, collection, user_id, id).await?;
    Ok((StatusCode::CREATED, Json(RecipeShortDTO::from(&recipe))))
}

async fn remove_from(state: &AppState, collection: RecipeCollection, user_id: i32, id: i32) -> AppResult<StatusCode> {
    membership_service::remove_recipe(&state.db, collection, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    add_to(&state, RecipeCollection::Favorites, user.id, id).await
}

pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    remove_from(&state, RecipeCollection::Favorites, user.id, id).await
}

pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    add_to(&state, RecipeCollection::ShoppingCart, user.id, id).await
}

pub async fn remove_from_cart(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    remove_from(&state, RecipeCollection::ShoppingCart, user.id, id).await
}

pub async fn download_shopping_cart(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let text = shopping_list_service::render_shopping_list(&state.db, user.id).await?;
    debug!("Shopping list for user {} rendered ({} bytes)", user.id, text.len());

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"shopping_cart.txt\""),
        ],
        text,
    ))
}

pub async fn get_link(State(state): State<Arc<AppState>>, Path(id): Path<i32>) -> AppResult<impl IntoResponse> {
    let recipe = recipe_service::find_by_id(&state.db, id).await?;
    Ok(Json(ShortLinkDTO {
        short_link: format!("{}/s/{}/", state.config.public_url, recipe.id),
    }))
}

pub async fn short_link_redirect(Path(id): Path<i32>) -> Redirect {
    Redirect::to(&format!("/recipes/{id}/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn filter_collects_repeated_tags_and_flags() {
        let filter = recipe_filter(&pairs(&[
            ("tags", "lunch"),
            ("tags", "dinner"),
            ("author", "3"),
            ("is_favorited", "1"),
            ("is_in_shopping_cart", "0"),
        ]));

        assert_eq!(filter.tags, vec!["lunch", "dinner"]);
        assert_eq!(filter.author, Some(3));
        assert!(filter.is_favorited);
        assert!(!filter.is_in_shopping_cart);
    }

    #[test]
    fn unparsable_author_is_ignored() {
        let filter = recipe_filter(&pairs(&[("author", "me")]));
        assert_eq!(filter.author, None);
    }
}
