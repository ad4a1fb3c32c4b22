use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use eclipse_types::api::UserSummary;

use crate::error::ApiError;

/// Read the `action` discriminator out of a request body.
pub(crate) fn action_of(body: &Value) -> Result<String, ApiError> {
    body.get("action")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ApiError::UnknownAction)
}

/// Parse an action payload out of the request body. Missing or mistyped
/// fields surface as a validation error.
pub(crate) fn from_body<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::Validation(e.to_string()))
}

pub(crate) fn parse_uuid(raw: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{}': {}", raw, e);
        Uuid::default()
    })
}

/// Timestamps are written as RFC 3339, but SQLite defaults fall back to
/// "YYYY-MM-DD HH:MM:SS" without a timezone; parse both.
pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

/// Relative time label for feeds and notification lists.
pub(crate) fn time_ago(raw: &str) -> String {
    let then = parse_timestamp(raw);
    let seconds = (Utc::now() - then).num_seconds();
    if seconds < 60 {
        "just now".to_string()
    } else if seconds < 3600 {
        format!("{}m ago", seconds / 60)
    } else if seconds < 86400 {
        format!("{}h ago", seconds / 3600)
    } else {
        format!("{}d ago", seconds / 86400)
    }
}

/// Wall-clock label used for chat messages.
pub(crate) fn clock_time(raw: &str) -> String {
    parse_timestamp(raw).format("%H:%M").to_string()
}

/// Extract `#word` tokens: word characters only, lowercased, de-duplicated
/// in order of first appearance.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut seen = HashSet::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '#' {
            continue;
        }
        let mut tag = String::new();
        while let Some(&next) = chars.peek() {
            if next.is_alphanumeric() || next == '_' {
                tag.push(next);
                chars.next();
            } else {
                break;
            }
        }
        if !tag.is_empty() {
            let tag = tag.to_lowercase();
            if seen.insert(tag.clone()) {
                tags.push(tag);
            }
        }
    }

    tags
}

/// Up to two uppercased initials for avatar placeholders.
pub(crate) fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .collect::<String>()
        .to_uppercase()
}

/// Chat-list preview: media messages map to a type label, text is truncated.
pub(crate) fn message_label(msg_type: Option<&str>, text: Option<&str>) -> String {
    let Some(text) = text else {
        return String::new();
    };
    match msg_type {
        Some("voice") => "🎤 Voice message".to_string(),
        Some("image") => "🖼 Photo".to_string(),
        Some("file") => "📎 File".to_string(),
        _ => text.chars().take(60).collect(),
    }
}

pub(crate) fn at_handle(handle: &str) -> String {
    format!("@{handle}")
}

pub(crate) fn user_summaries(rows: Vec<eclipse_db::models::UserLiteRow>) -> Vec<UserSummary> {
    rows.into_iter()
        .map(|row| UserSummary {
            id: parse_uuid(&row.id),
            name: row.name,
            handle: at_handle(&row.handle),
            avatar: row.avatar.unwrap_or_default(),
            bio: row.bio.unwrap_or_default(),
        })
        .collect()
}
