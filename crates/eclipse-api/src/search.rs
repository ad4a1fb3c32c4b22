use axum::Json;
use axum::extract::{Query, State};

use eclipse_types::api::{SearchQuery, UserListResponse};

use crate::error::ApiError;
use crate::state::{AppState, run_db};
use crate::util::user_summaries;

const SEARCH_LIMIT: u32 = 20;

pub async fn handle(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<UserListResponse>, ApiError> {
    let q = query
        .q
        .unwrap_or_default()
        .trim()
        .trim_start_matches('@')
        .to_lowercase();

    let rows = run_db(&state, move |db| db.search_users(&q, SEARCH_LIMIT)).await?;
    Ok(Json(UserListResponse {
        users: user_summaries(rows),
    }))
}
