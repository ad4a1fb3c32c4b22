use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use eclipse_db::ProfileChanges;
use eclipse_db::models::UserRow;
use eclipse_types::api::{
    ChangePasswordRequest, OkResponse, ProfileGetRequest, ProfileResponse, ProfileUpdateRequest,
    ProfileUser,
};

use crate::auth::hash_password;
use crate::error::ApiError;
use crate::state::{AppState, run_db};
use crate::util::{action_of, at_handle, from_body, parse_uuid};

pub async fn handle(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let action = action_of(&body)?;
    match action.as_str() {
        "get" => get(state, from_body(body)?).await,
        "update" => update(state, from_body(body)?).await,
        "change_password" => change_password(state, from_body(body)?).await,
        _ => Err(ApiError::UnknownAction),
    }
}

async fn get(state: AppState, req: ProfileGetRequest) -> Result<Response, ApiError> {
    let user = run_db(&state, move |db| db.get_user(&req.user_id.to_string()))
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(ProfileResponse {
        user: profile_user(user),
    })
    .into_response())
}

async fn update(state: AppState, req: ProfileUpdateRequest) -> Result<Response, ApiError> {
    let changes = ProfileChanges {
        name: req.name.map(|v| v.trim().to_string()),
        handle: req
            .handle
            .map(|v| v.trim().trim_start_matches('@').to_string()),
        email: req.email.map(|v| v.trim().to_lowercase()),
        bio: req.bio,
        avatar: req.avatar,
        banner: req.banner,
    };
    if changes.is_empty() {
        return Err(ApiError::Validation("Nothing to update".into()));
    }

    let user_id = req.user_id.to_string();
    let user = run_db(&state, move |db| db.update_profile(&user_id, &changes)).await?;
    Ok(Json(ProfileResponse {
        user: profile_user(user),
    })
    .into_response())
}

async fn change_password(state: AppState, req: ChangePasswordRequest) -> Result<Response, ApiError> {
    let old_hash = hash_password(&req.old_password);
    let new_hash = hash_password(&req.new_password);
    let user_id = req.user_id.to_string();

    let changed = run_db(&state, move |db| {
        db.change_password(&user_id, &old_hash, &new_hash)
    })
    .await?;
    if !changed {
        return Err(ApiError::Authentication("Wrong current password".into()));
    }
    Ok(Json(OkResponse::ok()).into_response())
}

fn profile_user(user: UserRow) -> ProfileUser {
    ProfileUser {
        id: parse_uuid(&user.id),
        name: user.name,
        handle: at_handle(&user.handle),
        email: user.email,
        avatar: user.avatar.unwrap_or_default(),
        bio: user.bio.unwrap_or_default(),
        banner: user.banner.unwrap_or_default(),
    }
}
