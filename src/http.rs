pub mod auth;
pub mod recipes;
pub mod reference;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::FromRequest;
use axum::http::Method;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::AppError;
use crate::models::page::PageRequest;
use crate::state::AppState;

/// JSON request body whose rejections come back as field errors
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// First value of `key` in a query string kept as ordered pairs
pub(crate) fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// `page` and `limit` from the query string; unparsable values fall back
/// to the defaults
pub(crate) fn page_request(params: &[(String, String)], config: &Config) -> PageRequest {
    PageRequest::new(
        param(params, "page").and_then(|v| v.parse().ok()),
        param(params, "limit").and_then(|v| v.parse().ok()),
        config.page_size,
        config.max_page_size,
    )
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let api = Router::new()
        .route("/users/", get(users::list_users).post(users::register))
        .route("/users/me/", get(users::me))
        .route("/users/me/avatar/", put(users::put_avatar).delete(users::delete_avatar))
        .route("/users/set_password/", post(users::set_password))
        .route("/users/subscriptions/", get(users::subscriptions))
        .route("/users/{id}/", get(users::get_user))
        .route("/users/{id}/subscribe/", post(users::subscribe).delete(users::unsubscribe))
        .route("/auth/token/login/", post(users::login))
        .route("/auth/token/logout/", post(users::logout))
        .route("/tags/", get(reference::list_tags))
        .route("/tags/{id}/", get(reference::get_tag))
        .route("/ingredients/", get(reference::list_ingredients))
        .route("/ingredients/{id}/", get(reference::get_ingredient))
        .route("/recipes/", get(recipes::list_recipes).post(recipes::create_recipe))
        .route("/recipes/download_shopping_cart/", get(recipes::download_shopping_cart))
        .route(
            "/recipes/{id}/",
            get(recipes::get_recipe)
                .patch(recipes::update_recipe)
                .delete(recipes::delete_recipe),
        )
        .route(
            "/recipes/{id}/favorite/",
            post(recipes::add_favorite).delete(recipes::remove_favorite),
        )
        .route(
            "/recipes/{id}/shopping_cart/",
            post(recipes::add_to_cart).delete(recipes::remove_from_cart),
        )
        .route("/recipes/{id}/get-link/", get(recipes::get_link));

    Router::new()
        .nest("/api", api)
        .route("/s/{id}/", get(recipes::short_link_redirect))
        .nest_service("/media", ServeDir::new(&state.config.media_root))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
