use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::app::auth::AuthService;
use crate::app::diary::DiaryService;
use crate::app::locations::LocationService;
use crate::app::posts::PostService;
use crate::app::users::UserService;
use crate::domain::geo::GeoPoint;
use crate::domain::location::Location;
use crate::domain::post::Post;
use crate::http::error::map_integrity_error;
use crate::http::{AppError, AuthUser, SessionId};
use crate::AppState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct ItemsResponse<T> {
    pub items: Vec<T>,
}

#[derive(Deserialize)]
pub struct CoordinateQuery {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Deserialize)]
pub struct RadiusQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius: f64,
}

fn checked_point(lat: f64, lng: f64) -> Result<GeoPoint, AppError> {
    let point = GeoPoint::new(lat, lng);
    if !point.in_range() {
        return Err(AppError::bad_request(
            "lat must be in [-90, 90] and lng in [-180, 180]",
        ));
    }
    Ok(point)
}

fn checked_radius(radius: f64) -> Result<f64, AppError> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(AppError::bad_request("radius must be a non-negative number"));
    }
    Ok(radius)
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db = state.db.ping().await.is_ok();
    let redis = state.sessions.ping().await.is_ok();
    let status = if db && redis { "ok" } else { "degraded" };

    Json(HealthResponse { status })
}

#[derive(Serialize)]
pub struct ConfigResponse {
    pub map_key: String,
}

/// The map frontend fetches its provider key from here. An unset key
/// comes back as the visible placeholder rather than an error.
pub async fn config_info(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        map_key: state.map_api_key.clone(),
    })
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub access_expires_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub refresh_expires_at: OffsetDateTime,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthTokenResponse>, AppError> {
    const MAX_PASSWORD_LEN: usize = 128;

    if payload.identifier.trim().is_empty() || payload.password.trim().is_empty() {
        return Err(AppError::bad_request("identifier and password are required"));
    }
    if payload.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request("password must be at most 128 characters"));
    }

    let service = auth_service(&state);
    let tokens = service
        .login(&payload.identifier, &payload.password)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to login");
            AppError::internal("failed to login")
        })?;

    match tokens {
        Some(tokens) => Ok(Json(AuthTokenResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            access_expires_at: tokens.access_expires_at,
            refresh_expires_at: tokens.refresh_expires_at,
        })),
        None => Err(AppError::unauthorized("invalid credentials")),
    }
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthTokenResponse>, AppError> {
    if payload.refresh_token.trim().is_empty() {
        return Err(AppError::bad_request("refresh_token is required"));
    }

    let service = auth_service(&state);
    let tokens = service.refresh(&payload.refresh_token).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to refresh token");
        AppError::internal("failed to refresh token")
    })?;

    match tokens {
        Some(tokens) => Ok(Json(AuthTokenResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            access_expires_at: tokens.access_expires_at,
            refresh_expires_at: tokens.refresh_expires_at,
        })),
        None => Err(AppError::unauthorized("invalid refresh token")),
    }
}

#[derive(Deserialize)]
pub struct RevokeRequest {
    pub refresh_token: String,
}

pub async fn revoke_token(
    State(state): State<AppState>,
    Json(payload): Json<RevokeRequest>,
) -> Result<StatusCode, AppError> {
    if payload.refresh_token.trim().is_empty() {
        return Err(AppError::bad_request("refresh_token is required"));
    }

    let service = auth_service(&state);
    let revoked = service
        .revoke_refresh_token(&payload.refresh_token)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to revoke token");
            AppError::internal("failed to revoke token")
        })?;

    let _ = revoked;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_current_user(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<crate::domain::user::User>, AppError> {
    let service = UserService::new(state.db.clone());
    let user = service.get_user(auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %auth.user_id, "failed to fetch current user");
        AppError::internal("failed to fetch current user")
    })?;

    match user {
        Some(user) => Ok(Json(user)),
        None => Err(AppError::not_found("user not found")),
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<crate::domain::user::User>, AppError> {
    const MAX_PASSWORD_LEN: usize = 128;

    let name = payload.name.trim();
    if name.len() < 2 || name.len() > 200 {
        return Err(AppError::bad_request("name must be 2 to 200 characters"));
    }
    let email = payload.email.trim();
    if email.is_empty() || !email.contains('@') || email.len() > 120 {
        return Err(AppError::bad_request("a valid email is required"));
    }
    if payload.password.trim().len() < 8 {
        return Err(AppError::bad_request("password must be at least 8 characters"));
    }
    if payload.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request("password must be at most 128 characters"));
    }

    let service = auth_service(&state);
    let user = service
        .signup(name.to_string(), email.to_string(), payload.password)
        .await
        .map_err(|err| map_integrity_error(err, "failed to create user"))?;

    Ok(Json(user))
}

pub async fn get_user(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<crate::domain::user::User>, AppError> {
    let service = UserService::new(state.db.clone());
    let user = service.get_user(id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %id, "failed to fetch user");
        AppError::internal("failed to fetch user")
    })?;

    match user {
        Some(user) => Ok(Json(user)),
        None => Err(AppError::not_found("user not found")),
    }
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
}

pub async fn update_profile(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<crate::domain::user::User>, AppError> {
    if auth.user_id != id {
        return Err(AppError::not_found("user not found"));
    }

    if let Some(name) = &payload.name {
        let name = name.trim();
        if name.len() < 2 || name.len() > 200 {
            return Err(AppError::bad_request("name must be 2 to 200 characters"));
        }
    }

    let service = UserService::new(state.db.clone());
    let user = service
        .update_profile(id, payload.name)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = %id, "failed to update profile");
            AppError::internal("failed to update profile")
        })?;

    match user {
        Some(user) => Ok(Json(user)),
        None => Err(AppError::not_found("user not found")),
    }
}

pub async fn delete_account(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = UserService::new(state.db.clone());
    let deleted = service.delete_account(auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %auth.user_id, "failed to delete account");
        AppError::internal("failed to delete account")
    })?;

    if deleted {
        tracing::info!(user_id = %auth.user_id, "account deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("user not found"))
    }
}

pub async fn list_user_locations(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<ItemsResponse<Location>>, AppError> {
    let service = LocationService::new(state.db.clone());
    let items = service.list_by_user(id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %id, "failed to list user locations");
        AppError::internal("failed to list user locations")
    })?;

    Ok(Json(ItemsResponse { items }))
}

pub async fn list_user_posts(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<ItemsResponse<Post>>, AppError> {
    let service = PostService::new(state.db.clone());
    let items = service.list_by_user(id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %id, "failed to list user posts");
        AppError::internal("failed to list user posts")
    })?;

    Ok(Json(ItemsResponse { items }))
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CreateLocationRequest {
    pub description: String,
    pub lat: f64,
    pub lng: f64,
}

pub async fn create_location(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateLocationRequest>,
) -> Result<Json<Location>, AppError> {
    let description = payload.description.trim();
    if description.is_empty() || description.len() > 80 {
        return Err(AppError::bad_request("description must be 1 to 80 characters"));
    }
    let point = checked_point(payload.lat, payload.lng)?;

    let service = LocationService::new(state.db.clone());
    let location = service
        .create(auth.user_id, description.to_string(), point)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to create location");
            AppError::internal("failed to create location")
        })?;

    Ok(Json(location))
}

pub async fn get_location(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Location>, AppError> {
    let service = LocationService::new(state.db.clone());
    let location = service.get(id).await.map_err(|err| {
        tracing::error!(error = ?err, location_id = %id, "failed to fetch location");
        AppError::internal("failed to fetch location")
    })?;

    match location {
        Some(location) => Ok(Json(location)),
        None => Err(AppError::not_found("location not found")),
    }
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub description: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

pub async fn update_location(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<Location>, AppError> {
    if let Some(description) = &payload.description {
        let description = description.trim();
        if description.is_empty() || description.len() > 80 {
            return Err(AppError::bad_request("description must be 1 to 80 characters"));
        }
    }
    let point = optional_point(payload.lat, payload.lng)?;

    let service = LocationService::new(state.db.clone());
    let location = service
        .update(
            id,
            auth.user_id,
            payload.description.map(|d| d.trim().to_string()),
            point,
        )
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, location_id = %id, "failed to update location");
            AppError::internal("failed to update location")
        })?;

    // Ownership enforced in SQL; a non-owner sees 404.
    match location {
        Some(location) => Ok(Json(location)),
        None => Err(AppError::not_found("location not found")),
    }
}

pub async fn delete_location(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = LocationService::new(state.db.clone());
    let deleted = service.delete(id, auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, location_id = %id, "failed to delete location");
        AppError::internal("failed to delete location")
    })?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("location not found"))
    }
}

pub async fn nearby_locations(
    State(state): State<AppState>,
    Query(query): Query<RadiusQuery>,
) -> Result<Json<ItemsResponse<Location>>, AppError> {
    let center = checked_point(query.lat, query.lng)?;
    let radius = checked_radius(query.radius)?;

    let service = LocationService::new(state.db.clone());
    let items = service.within_radius(center, radius).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to run location radius query");
        AppError::internal("failed to run radius query")
    })?;

    Ok(Json(ItemsResponse { items }))
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
    #[serde(default)]
    pub description: String,
    pub lat: f64,
    pub lng: f64,
}

pub async fn create_post(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<Json<Post>, AppError> {
    if payload.content.trim().is_empty() {
        return Err(AppError::bad_request("content cannot be empty"));
    }
    if payload.description.len() > 200 {
        return Err(AppError::bad_request("description must be at most 200 characters"));
    }
    let point = checked_point(payload.lat, payload.lng)?;

    let service = PostService::new(state.db.clone());
    let post = service
        .create(auth.user_id, payload.content, payload.description, point)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to create post");
            AppError::internal("failed to create post")
        })?;

    Ok(Json(post))
}

pub async fn get_post(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Post>, AppError> {
    let service = PostService::new(state.db.clone());
    let post = service.get(id).await.map_err(|err| {
        tracing::error!(error = ?err, post_id = %id, "failed to fetch post");
        AppError::internal("failed to fetch post")
    })?;

    match post {
        Some(post) => Ok(Json(post)),
        None => Err(AppError::not_found("post not found")),
    }
}

#[derive(Deserialize)]
pub struct UpdatePostRequest {
    pub content: Option<String>,
    pub description: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

pub async fn update_post(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<Post>, AppError> {
    if let Some(content) = &payload.content {
        if content.trim().is_empty() {
            return Err(AppError::bad_request("content cannot be empty"));
        }
    }
    if let Some(description) = &payload.description {
        if description.len() > 200 {
            return Err(AppError::bad_request("description must be at most 200 characters"));
        }
    }
    let point = optional_point(payload.lat, payload.lng)?;

    let service = PostService::new(state.db.clone());
    let post = service
        .update(id, auth.user_id, payload.content, payload.description, point)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id = %id, "failed to update post");
            AppError::internal("failed to update post")
        })?;

    // Ownership enforced in SQL; a non-owner sees 404.
    match post {
        Some(post) => Ok(Json(post)),
        None => Err(AppError::not_found("post not found")),
    }
}

pub async fn delete_post(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = PostService::new(state.db.clone());
    let deleted = service.delete(id, auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, post_id = %id, "failed to delete post");
        AppError::internal("failed to delete post")
    })?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("post not found"))
    }
}

pub async fn nearby_posts(
    State(state): State<AppState>,
    Query(query): Query<RadiusQuery>,
) -> Result<Json<ItemsResponse<Post>>, AppError> {
    let center = checked_point(query.lat, query.lng)?;
    let radius = checked_radius(query.radius)?;

    let service = PostService::new(state.db.clone());
    let items = service.within_radius(center, radius).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to run post radius query");
        AppError::internal("failed to run radius query")
    })?;

    Ok(Json(ItemsResponse { items }))
}

pub async fn posts_at_point(
    State(state): State<AppState>,
    Query(query): Query<CoordinateQuery>,
) -> Result<Json<ItemsResponse<Post>>, AppError> {
    let point = checked_point(query.lat, query.lng)?;

    let service = PostService::new(state.db.clone());
    let items = service.at_point(point).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to fetch posts at point");
        AppError::internal("failed to fetch posts at point")
    })?;

    Ok(Json(ItemsResponse { items }))
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ItemsResponse<Post>>, AppError> {
    let limit = query.limit.unwrap_or(30);
    if !(1..=200).contains(&limit) {
        return Err(AppError::bad_request("limit must be between 1 and 200"));
    }

    let service = PostService::new(state.db.clone());
    let items = service.list_all(limit).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to list posts");
        AppError::internal("failed to list posts")
    })?;

    Ok(Json(ItemsResponse { items }))
}

// ---------------------------------------------------------------------------
// Diary flow: draft in the session store, then publish with a location
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct DraftRequest {
    pub content: String,
}

#[derive(Serialize)]
pub struct DraftResponse {
    pub session_id: String,
    pub content: String,
}

pub async fn save_draft(
    _auth: AuthUser,
    session: SessionId,
    State(state): State<AppState>,
    Json(payload): Json<DraftRequest>,
) -> Result<Json<DraftResponse>, AppError> {
    let content = payload.content.trim().to_string();
    if content.len() < 2 {
        return Err(AppError::bad_request("your entry is too short"));
    }
    if content.len() > 240 {
        return Err(AppError::bad_request("your entry is too long"));
    }

    state
        .sessions
        .put_draft(&session.0, &content)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to store draft");
            AppError::internal("failed to store draft")
        })?;

    Ok(Json(DraftResponse {
        session_id: session.0,
        content,
    }))
}

#[derive(Deserialize)]
pub struct PublishRequest {
    pub description: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Serialize)]
pub struct PublishResponse {
    pub session_id: String,
    pub location: Location,
    pub post: Post,
}

pub async fn publish_entry(
    auth: AuthUser,
    session: SessionId,
    State(state): State<AppState>,
    Json(payload): Json<PublishRequest>,
) -> Result<Json<PublishResponse>, AppError> {
    let description = payload.description.trim();
    if description.is_empty() || description.len() > 80 {
        return Err(AppError::bad_request("description must be 1 to 80 characters"));
    }
    let point = checked_point(payload.lat, payload.lng)?;

    let content = state
        .sessions
        .take_draft(&session.0)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to read draft");
            AppError::internal("failed to read draft")
        })?
        .ok_or_else(|| AppError::bad_request("no draft entry to publish"))?;

    let service = DiaryService::new(state.db.clone());
    let (location, post) = service
        .publish(auth.user_id, content, description.to_string(), point)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to publish entry");
            AppError::internal("failed to publish entry")
        })?;

    Ok(Json(PublishResponse {
        session_id: session.0,
        location,
        post,
    }))
}

// ---------------------------------------------------------------------------
// Area search: run, remember per session, browse later
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct AreaSearchRequest {
    pub lat: f64,
    pub lng: f64,
    pub radius: f64,
}

#[derive(Serialize)]
pub struct AreaSearchResponse {
    pub session_id: String,
    pub items: Vec<Post>,
}

pub async fn search_area(
    session: SessionId,
    State(state): State<AppState>,
    Json(payload): Json<AreaSearchRequest>,
) -> Result<Json<AreaSearchResponse>, AppError> {
    let center = checked_point(payload.lat, payload.lng)?;
    let radius = checked_radius(payload.radius)?;

    let service = PostService::new(state.db.clone());
    let items = service.within_radius(center, radius).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to run area search");
        AppError::internal("failed to run area search")
    })?;

    let serialized = serde_json::to_string(&items).map_err(|err| {
        tracing::error!(error = ?err, "failed to serialize area results");
        AppError::internal("failed to store area results")
    })?;
    state
        .sessions
        .put_area_results(&session.0, &serialized)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to store area results");
            AppError::internal("failed to store area results")
        })?;

    Ok(Json(AreaSearchResponse {
        session_id: session.0,
        items,
    }))
}

#[derive(Serialize)]
pub struct BrowseResponse {
    pub session_id: String,
    pub items: serde_json::Value,
}

/// Returns whatever the last area search for this session produced;
/// an empty list when nothing was searched yet or the entry expired.
pub async fn search_results(
    session: SessionId,
    State(state): State<AppState>,
) -> Result<Json<BrowseResponse>, AppError> {
    let stored = state.sessions.area_results(&session.0).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to read area results");
        AppError::internal("failed to read area results")
    })?;

    let items = match stored {
        Some(json) => serde_json::from_str(&json).map_err(|err| {
            tracing::error!(error = ?err, "corrupt area results in session store");
            AppError::internal("failed to read area results")
        })?,
        None => serde_json::Value::Array(Vec::new()),
    };

    Ok(Json(BrowseResponse {
        session_id: session.0,
        items,
    }))
}

// ---------------------------------------------------------------------------

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(
        state.db.clone(),
        state.paseto_access_key,
        state.paseto_refresh_key,
        state.access_ttl_minutes,
        state.refresh_ttl_days,
    )
}

fn optional_point(lat: Option<f64>, lng: Option<f64>) -> Result<Option<GeoPoint>, AppError> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Ok(Some(checked_point(lat, lng)?)),
        (None, None) => Ok(None),
        _ => Err(AppError::bad_request("lat and lng must be given together")),
    }
}
