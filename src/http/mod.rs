use axum::Router;

use crate::AppState;

mod auth;
mod compat;
mod error;
mod handlers;
mod routes;

pub use auth::{AuthUser, SessionId};
pub use error::AppError;

pub fn router(state: AppState) -> Router {
    let v1 = Router::new()
        .merge(routes::auth())
        .merge(routes::users())
        .merge(routes::locations())
        .merge(routes::posts())
        .merge(routes::diary())
        .merge(routes::search());

    Router::new()
        .merge(routes::health())
        .merge(routes::legacy_api())
        .nest("/v1", v1)
        .with_state(state)
}
