use axum::{routing::delete, routing::get, routing::patch, routing::post, Router};

use crate::http::{compat, handlers};
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::config_info))
}

pub fn auth() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handlers::login))
        .route("/auth/refresh", post(handlers::refresh_token))
        .route("/auth/revoke", post(handlers::revoke_token))
        .route("/auth/me", get(handlers::get_current_user))
}

pub fn users() -> Router<AppState> {
    Router::new()
        .route("/users", post(handlers::create_user))
        .route("/users/:id", get(handlers::get_user))
        .route("/users/:id", patch(handlers::update_profile))
        .route("/users/:id/locations", get(handlers::list_user_locations))
        .route("/users/:id/posts", get(handlers::list_user_posts))
        .route("/account", delete(handlers::delete_account))
}

pub fn locations() -> Router<AppState> {
    Router::new()
        .route("/locations", post(handlers::create_location))
        .route("/locations/nearby", get(handlers::nearby_locations))
        .route("/locations/:id", get(handlers::get_location))
        .route("/locations/:id", patch(handlers::update_location))
        .route("/locations/:id", delete(handlers::delete_location))
}

pub fn posts() -> Router<AppState> {
    Router::new()
        .route("/posts", post(handlers::create_post))
        .route("/posts", get(handlers::list_posts))
        .route("/posts/nearby", get(handlers::nearby_posts))
        .route("/posts/at", get(handlers::posts_at_point))
        .route("/posts/:id", get(handlers::get_post))
        .route("/posts/:id", patch(handlers::update_post))
        .route("/posts/:id", delete(handlers::delete_post))
}

pub fn diary() -> Router<AppState> {
    Router::new()
        .route("/diary/draft", post(handlers::save_draft))
        .route("/diary/publish", post(handlers::publish_entry))
}

pub fn search() -> Router<AppState> {
    Router::new()
        .route("/search/area", post(handlers::search_area))
        .route("/search/results", get(handlers::search_results))
}

/// Wire-compatible endpoints for the original map frontend.
pub fn legacy_api() -> Router<AppState> {
    Router::new()
        .route("/api/store_item", get(compat::store_item))
        .route("/api/get_items_in_radius", get(compat::get_items_in_radius))
}
