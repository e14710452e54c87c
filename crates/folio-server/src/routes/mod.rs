pub mod profile;
pub mod sessions;

use axum::Router;

use crate::state::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(profile::router())
        .nest("/sessions", sessions::router())
}
