use axum::Json;
use axum::extract::State;
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use eclipse_types::api::{AuthResponse, AuthUser, LoginRequest, RegisterRequest};

use crate::error::ApiError;
use crate::state::{AppState, run_db};
use crate::util::{action_of, at_handle, from_body, parse_uuid};

pub async fn handle(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<AuthResponse>, ApiError> {
    let action = action_of(&body)?;
    match action.as_str() {
        "register" => register(state, from_body(body)?).await,
        "login" => login(state, from_body(body)?).await,
        _ => Err(ApiError::UnknownAction),
    }
}

async fn register(state: AppState, req: RegisterRequest) -> Result<Json<AuthResponse>, ApiError> {
    let name = req.name.trim().to_string();
    let email = req.email.trim().to_lowercase();
    if name.is_empty() {
        return Err(ApiError::Validation("Empty name".into()));
    }

    let handle = generate_handle(&name);
    let password_hash = hash_password(&req.password);
    let user_id = Uuid::new_v4();

    let user = run_db(&state, move |db| {
        db.register_user(&user_id.to_string(), &name, &handle, &email, &password_hash)
    })
    .await?;

    Ok(Json(AuthResponse {
        user: AuthUser {
            id: parse_uuid(&user.id),
            name: user.name,
            handle: at_handle(&user.handle),
            avatar: user.avatar.unwrap_or_default(),
            token: issue_token(),
        },
    }))
}

async fn login(state: AppState, req: LoginRequest) -> Result<Json<AuthResponse>, ApiError> {
    let email = req.email.trim().to_lowercase();
    let password_hash = hash_password(&req.password);

    let user = run_db(&state, move |db| db.find_by_credentials(&email, &password_hash))
        .await?
        .ok_or_else(|| ApiError::Authentication("Invalid email or password".into()))?;

    Ok(Json(AuthResponse {
        user: AuthUser {
            id: parse_uuid(&user.id),
            name: user.name,
            handle: at_handle(&user.handle),
            avatar: user.avatar.unwrap_or_default(),
            token: issue_token(),
        },
    }))
}

/// SHA-256 of the raw password bytes, hex-encoded. Login does an exact
/// (email, hash) match against the stored value.
pub(crate) fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Derive a handle from the display name: lowercased, spaces and hyphens
/// stripped, truncated to 12 chars, with a random hex suffix so uniqueness
/// holds without a retry loop.
fn generate_handle(name: &str) -> String {
    let base: String = name
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .take(12)
        .collect();
    format!("{}{}", base, random_hex(3))
}

/// Opaque session token returned by register/login.
fn issue_token() -> String {
    random_hex(32)
}

fn random_hex(bytes: usize) -> String {
    use rand::RngCore;
    let mut buf = vec![0u8; bytes];
    rand::rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_is_deterministic_sha256() {
        assert_eq!(hash_password("secret"), hash_password("secret"));
        assert_ne!(hash_password("secret"), hash_password("Secret"));
        // sha256("abc")
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn handle_strips_spaces_and_hyphens() {
        let handle = generate_handle("Ada Lovelace-Byron");
        assert!(handle.starts_with("adalovelaceb"));
        // 12-char base plus 3-byte hex suffix
        assert_eq!(handle.len(), 12 + 6);
    }

    #[test]
    fn tokens_are_unique_and_64_hex_chars() {
        let a = issue_token();
        let b = issue_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
