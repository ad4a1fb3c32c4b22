use axum::Json;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use eclipse_types::api::{
    ChatIdResponse, ChatListResponse, ChatSummary, CountsResponse, CreateGroupRequest,
    CreateGroupResponse, DeleteChatRequest, GetOrCreateChatRequest, GetWallpaperRequest,
    GroupHistoryResponse, GroupMessageView, GroupSummary, HistoryResponse, LikedPostView,
    LikedPostsResponse, MarkNotificationsReadRequest, MarkReadRequest, MessageView,
    MessagesQuery, NotificationView, NotificationsResponse, OkResponse, SaveWallpaperRequest,
    SendGroupMessageRequest, SendMessageRequest, SendResponse, ToggleFollowRequest,
    ToggleFollowResponse, UserListResponse, WallpaperResponse,
};

use crate::error::ApiError;
use crate::state::{AppState, run_db};
use crate::util::{
    action_of, at_handle, clock_time, from_body, message_label, parse_uuid, time_ago,
    user_summaries,
};

/// Media message types that carry an uploaded payload.
const MEDIA_TYPES: [&str; 3] = ["image", "file", "voice"];

pub async fn handle_get(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> Result<Response, ApiError> {
    match query.action.as_str() {
        "list" => list(state, require_user(&query)?).await,
        "history" => {
            let chat_id = query
                .chat_id
                .ok_or_else(|| ApiError::Validation("Missing chat_id".into()))?;
            history(state, chat_id, require_user(&query)?).await
        }
        "group_history" => {
            let group_id = query
                .group_id
                .ok_or_else(|| ApiError::Validation("Missing group_id".into()))?;
            group_history(state, group_id, require_user(&query)?).await
        }
        "notifications" => notifications(state, require_user(&query)?).await,
        "following" => {
            let user_id = require_user(&query)?.to_string();
            let rows = run_db(&state, move |db| db.following(&user_id)).await?;
            Ok(Json(UserListResponse {
                users: user_summaries(rows),
            })
            .into_response())
        }
        "followers" => {
            let user_id = require_user(&query)?.to_string();
            let rows = run_db(&state, move |db| db.followers(&user_id)).await?;
            Ok(Json(UserListResponse {
                users: user_summaries(rows),
            })
            .into_response())
        }
        "counts" => counts(state, &query).await,
        "liked_posts" => liked_posts(state, require_user(&query)?).await,
        _ => Err(ApiError::UnknownAction),
    }
}

pub async fn handle_post(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let action = action_of(&body)?;
    match action.as_str() {
        "get_or_create_chat" => get_or_create_chat(state, from_body(body)?).await,
        "send" => send(state, from_body(body)?).await,
        "send_group" => send_group(state, from_body(body)?).await,
        "mark_read" => mark_read(state, from_body(body)?).await,
        "delete_chat" => delete_chat(state, from_body(body)?).await,
        "create_group" => create_group(state, from_body(body)?).await,
        "save_wallpaper" => save_wallpaper(state, from_body(body)?).await,
        "get_wallpaper" => get_wallpaper(state, from_body(body)?).await,
        "toggle_follow" => toggle_follow(state, from_body(body)?).await,
        "mark_notifications_read" => mark_notifications_read(state, from_body(body)?).await,
        _ => Err(ApiError::UnknownAction),
    }
}

fn require_user(query: &MessagesQuery) -> Result<Uuid, ApiError> {
    query
        .user_id
        .ok_or_else(|| ApiError::Validation("Missing user_id".into()))
}

// -- GET actions --

async fn list(state: AppState, user_id: Uuid) -> Result<Response, ApiError> {
    let uid = user_id.to_string();
    let chats = {
        let uid = uid.clone();
        run_db(&state, move |db| db.list_chats(&uid)).await?
    };
    let groups = run_db(&state, move |db| db.list_groups(&uid)).await?;

    let chats = chats
        .into_iter()
        .map(|row| ChatSummary {
            chat_id: parse_uuid(&row.chat_id),
            partner_id: parse_uuid(&row.partner_id),
            partner_name: row.partner_name,
            partner_handle: at_handle(&row.partner_handle),
            partner_avatar: row.partner_avatar.unwrap_or_default(),
            last_msg: message_label(row.last_type.as_deref(), row.last_text.as_deref()),
            last_time: row.last_time.as_deref().map(time_ago).unwrap_or_default(),
            unread: row.unread,
            is_mine: row.last_sender_id.as_deref() == Some(user_id.to_string().as_str()),
        })
        .collect();

    let groups = groups
        .into_iter()
        .map(|row| GroupSummary {
            group_id: parse_uuid(&row.group_id),
            name: row.name,
            avatar: row.avatar.unwrap_or_default(),
            last_msg: message_label(row.last_type.as_deref(), row.last_text.as_deref()),
            last_time: row.last_time.as_deref().map(time_ago).unwrap_or_default(),
            member_count: row.member_count,
            is_group: true,
        })
        .collect();

    Ok(Json(ChatListResponse { chats, groups }).into_response())
}

async fn history(state: AppState, chat_id: Uuid, user_id: Uuid) -> Result<Response, ApiError> {
    let uid = user_id.to_string();
    let rows = run_db(&state, move |db| {
        db.chat_history(&chat_id.to_string(), &uid)
    })
    .await?;

    let messages = rows
        .into_iter()
        .map(|row| MessageView {
            id: parse_uuid(&row.id),
            from_me: row.sender_id == user_id.to_string(),
            sender_id: parse_uuid(&row.sender_id),
            text: row.text,
            msg_type: row.msg_type,
            file_url: row.file_url,
            file_name: row.file_name,
            duration: row.duration,
            time: clock_time(&row.created_at),
            is_read: row.is_read,
        })
        .collect();

    Ok(Json(HistoryResponse { messages }).into_response())
}

async fn group_history(state: AppState, group_id: Uuid, user_id: Uuid) -> Result<Response, ApiError> {
    let rows = run_db(&state, move |db| db.group_history(&group_id.to_string())).await?;

    let messages = rows
        .into_iter()
        .map(|row| GroupMessageView {
            id: parse_uuid(&row.id),
            from_me: row.sender_id == user_id.to_string(),
            sender_id: parse_uuid(&row.sender_id),
            sender_name: row.sender_name,
            sender_avatar: row.sender_avatar.unwrap_or_default(),
            text: row.text,
            msg_type: row.msg_type,
            file_url: row.file_url,
            file_name: row.file_name,
            duration: row.duration,
            time: clock_time(&row.created_at),
        })
        .collect();

    Ok(Json(GroupHistoryResponse { messages }).into_response())
}

async fn notifications(state: AppState, user_id: Uuid) -> Result<Response, ApiError> {
    let uid = user_id.to_string();
    let rows = {
        let uid = uid.clone();
        run_db(&state, move |db| db.notifications(&uid)).await?
    };
    let unread_msg_count = run_db(&state, move |db| db.unread_message_count(&uid)).await?;

    let unread_count = rows.iter().filter(|n| !n.is_read).count() as i64;
    let notifications = rows
        .into_iter()
        .map(|row| NotificationView {
            id: parse_uuid(&row.id),
            kind: row.kind,
            message: row.message,
            is_read: row.is_read,
            time: time_ago(&row.created_at),
            from_id: row.from_id.as_deref().map(parse_uuid),
            from_name: row.from_name,
            from_handle: row
                .from_handle
                .as_deref()
                .map(at_handle)
                .unwrap_or_default(),
            from_avatar: row.from_avatar.unwrap_or_default(),
            post_id: row.post_id.as_deref().map(parse_uuid),
        })
        .collect();

    Ok(Json(NotificationsResponse {
        notifications,
        unread_count,
        unread_msg_count,
    })
    .into_response())
}

async fn counts(state: AppState, query: &MessagesQuery) -> Result<Response, ApiError> {
    let target = query
        .target_id
        .or(query.user_id)
        .ok_or_else(|| ApiError::Validation("Missing target_id".into()))?
        .to_string();
    let viewer = query.user_id.map(|id| id.to_string()).unwrap_or_default();

    let row = run_db(&state, move |db| db.counts(&viewer, &target)).await?;
    Ok(Json(CountsResponse {
        following_count: row.following,
        followers_count: row.followers,
        posts_count: row.posts,
        is_following: row.is_following,
    })
    .into_response())
}

async fn liked_posts(state: AppState, user_id: Uuid) -> Result<Response, ApiError> {
    let rows = run_db(&state, move |db| db.liked_posts(&user_id.to_string())).await?;
    let posts = rows
        .into_iter()
        .map(|row| LikedPostView {
            id: parse_uuid(&row.id),
            text: row.text,
            likes: row.likes_count,
            media_url: row.media_url,
            media_type: row.media_type,
            user_id: parse_uuid(&row.author_id),
            author: row.author_name,
            handle: at_handle(&row.author_handle),
            avatar: row.author_avatar.unwrap_or_default(),
        })
        .collect();
    Ok(Json(LikedPostsResponse { posts }).into_response())
}

// -- POST actions --

async fn get_or_create_chat(
    state: AppState,
    req: GetOrCreateChatRequest,
) -> Result<Response, ApiError> {
    let candidate = Uuid::new_v4();
    let chat_id = run_db(&state, move |db| {
        db.get_or_create_chat(
            &candidate.to_string(),
            &req.user_id.to_string(),
            &req.partner_id.to_string(),
        )
    })
    .await?;
    Ok(Json(ChatIdResponse {
        chat_id: parse_uuid(&chat_id),
    })
    .into_response())
}

async fn send(state: AppState, req: SendMessageRequest) -> Result<Response, ApiError> {
    let file_url = if MEDIA_TYPES.contains(&req.msg_type.as_str()) {
        match &req.file_data {
            Some(data) => {
                let raw = B64
                    .decode(data)
                    .map_err(|_| ApiError::Validation("Invalid file payload".into()))?;
                let mut key = format!(
                    "chat/{}/{}_{}",
                    req.chat_id,
                    req.sender_id,
                    Utc::now().timestamp_millis()
                );
                if let Some(name) = &req.file_name {
                    key.push('_');
                    key.push_str(name);
                }
                Some(state.media.put(&key, &raw).await?)
            }
            None => None,
        }
    } else {
        None
    };

    let message_id = Uuid::new_v4();
    let stored_url = file_url.clone();
    let created_at = run_db(&state, move |db| {
        db.send_chat_message(
            &message_id.to_string(),
            &req.chat_id.to_string(),
            &req.sender_id.to_string(),
            &req.text,
            &req.msg_type,
            stored_url.as_deref(),
            req.file_name.as_deref(),
            req.duration,
        )
    })
    .await?;

    Ok(Json(SendResponse {
        id: message_id,
        time: clock_time(&created_at),
        file_url,
    })
    .into_response())
}

async fn send_group(state: AppState, req: SendGroupMessageRequest) -> Result<Response, ApiError> {
    let file_url = if MEDIA_TYPES.contains(&req.msg_type.as_str()) {
        match &req.file_data {
            Some(data) => {
                let raw = B64
                    .decode(data)
                    .map_err(|_| ApiError::Validation("Invalid file payload".into()))?;
                let key = format!(
                    "group/{}/{}_{}",
                    req.group_id,
                    req.sender_id,
                    Utc::now().timestamp_millis()
                );
                Some(state.media.put(&key, &raw).await?)
            }
            None => None,
        }
    } else {
        None
    };

    let message_id = Uuid::new_v4();
    let stored_url = file_url.clone();
    let created_at = run_db(&state, move |db| {
        db.send_group_message(
            &message_id.to_string(),
            &req.group_id.to_string(),
            &req.sender_id.to_string(),
            &req.text,
            &req.msg_type,
            stored_url.as_deref(),
            req.file_name.as_deref(),
            req.duration,
        )
    })
    .await?;

    Ok(Json(SendResponse {
        id: message_id,
        time: clock_time(&created_at),
        file_url,
    })
    .into_response())
}

async fn mark_read(state: AppState, req: MarkReadRequest) -> Result<Response, ApiError> {
    run_db(&state, move |db| {
        db.mark_read(&req.chat_id.to_string(), &req.user_id.to_string())
    })
    .await?;
    Ok(Json(OkResponse::ok()).into_response())
}

async fn delete_chat(state: AppState, req: DeleteChatRequest) -> Result<Response, ApiError> {
    run_db(&state, move |db| {
        db.delete_chat_messages(&req.chat_id.to_string(), &req.user_id.to_string())
    })
    .await?;
    Ok(Json(OkResponse::ok()).into_response())
}

async fn create_group(state: AppState, req: CreateGroupRequest) -> Result<Response, ApiError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::Validation("Empty group name".into()));
    }

    let group_id = Uuid::new_v4();
    let members: Vec<String> = req.member_ids.iter().map(|id| id.to_string()).collect();
    run_db(&state, move |db| {
        db.create_group(
            &group_id.to_string(),
            &req.creator_id.to_string(),
            &name,
            &members,
        )
    })
    .await?;

    Ok(Json(CreateGroupResponse { group_id }).into_response())
}

async fn save_wallpaper(state: AppState, req: SaveWallpaperRequest) -> Result<Response, ApiError> {
    run_db(&state, move |db| {
        db.save_wallpaper(&req.user_id.to_string(), &req.chat_key, &req.wallpaper)
    })
    .await?;
    Ok(Json(OkResponse::ok()).into_response())
}

async fn get_wallpaper(state: AppState, req: GetWallpaperRequest) -> Result<Response, ApiError> {
    let wallpaper = run_db(&state, move |db| {
        db.get_wallpaper(&req.user_id.to_string(), &req.chat_key)
    })
    .await?
    .unwrap_or_else(|| "none".to_string());
    Ok(Json(WallpaperResponse { wallpaper }).into_response())
}

async fn toggle_follow(state: AppState, req: ToggleFollowRequest) -> Result<Response, ApiError> {
    let (followed, followers_count) = run_db(&state, move |db| {
        db.toggle_follow(
            &req.follower_id.to_string(),
            &req.following_id.to_string(),
        )
    })
    .await?;
    Ok(Json(ToggleFollowResponse {
        followed,
        followers_count,
    })
    .into_response())
}

async fn mark_notifications_read(
    state: AppState,
    req: MarkNotificationsReadRequest,
) -> Result<Response, ApiError> {
    run_db(&state, move |db| {
        db.mark_notifications_read(
            &req.user_id.to_string(),
            req.notif_id.map(|id| id.to_string()).as_deref(),
        )
    })
    .await?;
    Ok(Json(OkResponse::ok()).into_response())
}
