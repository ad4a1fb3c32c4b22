pub mod auth;
pub mod error;
pub mod feed;
pub mod messaging;
pub mod profile;
pub mod search;
pub mod state;
mod util;

pub use error::ApiError;
pub use state::{AppState, AppStateInner};
pub use util::extract_hashtags;

use axum::Router;
use axum::routing::{get, post};

/// The five request handlers. CORS and tracing layers are attached by the
/// server binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth", post(auth::handle))
        .route("/profile", post(profile::handle))
        .route("/search", get(search::handle))
        .route("/posts", get(feed::handle_get).post(feed::handle_post))
        .route(
            "/messages",
            get(messaging::handle_get).post(messaging::handle_post),
        )
        .with_state(state)
}
