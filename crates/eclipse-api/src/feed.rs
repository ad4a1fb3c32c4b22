use std::collections::HashMap;

use axum::Json;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use eclipse_db::models::{CommentRow, PostRow};
use eclipse_types::api::{
    CommentRequest, CommentResponse, CommentView, CreatePostRequest, CreatePostResponse,
    DeletePostRequest, FeedQuery, FeedResponse, HashtagFeedResponse, LikeCommentRequest,
    LikePostRequest, LikeResponse, OkResponse, PostView, TrendingResponse, TrendingTag,
};

use crate::error::ApiError;
use crate::state::{AppState, run_db};
use crate::util::{
    action_of, at_handle, extract_hashtags, from_body, initials, parse_uuid, time_ago,
};

const TRENDING_LIMIT: u32 = 10;

pub async fn handle_get(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Response, ApiError> {
    let viewer = query.user_id.map(|id| id.to_string()).unwrap_or_default();

    match query.action.as_str() {
        "feed" => {
            let posts = {
                let viewer = viewer.clone();
                run_db(&state, move |db| db.feed_posts(&viewer)).await?
            };
            let post_ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();
            let comments =
                run_db(&state, move |db| db.comments_for_posts(&viewer, &post_ids)).await?;
            Ok(Json(FeedResponse {
                posts: assemble_posts(posts, comments),
            })
            .into_response())
        }
        "user_posts" => {
            let target = query
                .target_id
                .or(query.user_id)
                .ok_or_else(|| ApiError::Validation("Missing target_id".into()))?
                .to_string();
            let posts =
                run_db(&state, move |db| db.user_posts(&viewer, &target)).await?;
            Ok(Json(FeedResponse {
                posts: assemble_posts(posts, vec![]),
            })
            .into_response())
        }
        "hashtag" => {
            let tag = query
                .tag
                .as_deref()
                .unwrap_or("")
                .trim()
                .trim_start_matches('#')
                .to_lowercase();
            if tag.is_empty() {
                return Err(ApiError::Validation("Missing tag".into()));
            }
            let posts = {
                let tag = tag.clone();
                run_db(&state, move |db| db.hashtag_posts(&viewer, &tag)).await?
            };
            Ok(Json(HashtagFeedResponse {
                posts: assemble_posts(posts, vec![]),
                tag,
            })
            .into_response())
        }
        "trending" => {
            let tags = run_db(&state, |db| db.trending(TRENDING_LIMIT)).await?;
            Ok(Json(TrendingResponse {
                tags: tags
                    .into_iter()
                    .map(|(tag, count)| TrendingTag { tag, count })
                    .collect(),
            })
            .into_response())
        }
        _ => Err(ApiError::UnknownAction),
    }
}

pub async fn handle_post(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let action = action_of(&body)?;
    match action.as_str() {
        "create" => create(state, from_body(body)?).await,
        "delete" => delete(state, from_body(body)?).await,
        "like" => like(state, from_body(body)?).await,
        "like_comment" => like_comment(state, from_body(body)?).await,
        "comment" => comment(state, from_body(body)?).await,
        _ => Err(ApiError::UnknownAction),
    }
}

async fn create(state: AppState, req: CreatePostRequest) -> Result<Response, ApiError> {
    let text = req.text.trim().to_string();
    if text.is_empty() {
        return Err(ApiError::Validation("Empty post".into()));
    }

    let mut media_url = None;
    let mut media_kind = None;

    if let (Some(data), Some(content_type)) = (&req.media_data, &req.media_type) {
        let raw = B64
            .decode(data)
            .map_err(|_| ApiError::Validation("Invalid media payload".into()))?;
        let ext = if content_type.contains("image") { "jpg" } else { "mp4" };
        let key = format!(
            "posts/{}/{}.{}",
            req.user_id,
            Utc::now().timestamp_millis(),
            ext
        );
        media_url = Some(state.media.put(&key, &raw).await?);
        media_kind = content_type.split('/').next().map(str::to_string);
    }

    let post_id = Uuid::new_v4();
    let tags = extract_hashtags(&text);
    let stored_url = media_url.clone();
    run_db(&state, move |db| {
        db.create_post(
            &post_id.to_string(),
            &req.user_id.to_string(),
            &text,
            stored_url.as_deref(),
            media_kind.as_deref(),
            &tags,
        )
    })
    .await?;

    Ok(Json(CreatePostResponse {
        id: post_id,
        media_url,
    })
    .into_response())
}

async fn delete(state: AppState, req: DeletePostRequest) -> Result<Response, ApiError> {
    run_db(&state, move |db| {
        db.delete_post(&req.user_id.to_string(), &req.post_id.to_string())
    })
    .await?;
    Ok(Json(OkResponse::ok()).into_response())
}

async fn like(state: AppState, req: LikePostRequest) -> Result<Response, ApiError> {
    let (liked, likes) = run_db(&state, move |db| {
        db.toggle_post_like(&req.user_id.to_string(), &req.post_id.to_string())
    })
    .await?;
    Ok(Json(LikeResponse { liked, likes }).into_response())
}

async fn like_comment(state: AppState, req: LikeCommentRequest) -> Result<Response, ApiError> {
    let (liked, likes) = run_db(&state, move |db| {
        db.toggle_comment_like(&req.user_id.to_string(), &req.comment_id.to_string())
    })
    .await?;
    Ok(Json(LikeResponse { liked, likes }).into_response())
}

async fn comment(state: AppState, req: CommentRequest) -> Result<Response, ApiError> {
    let text = req.text.trim().to_string();
    if text.is_empty() {
        return Err(ApiError::Validation("Empty comment".into()));
    }

    let comment_id = Uuid::new_v4();
    let row = run_db(&state, move |db| {
        db.create_comment(
            &comment_id.to_string(),
            &req.user_id.to_string(),
            &req.post_id.to_string(),
            &text,
        )
    })
    .await?;

    Ok(Json(CommentResponse {
        comment: comment_view(row),
    })
    .into_response())
}

/// Join posts with their batch-fetched comments, shaping both for the API.
fn assemble_posts(posts: Vec<PostRow>, comments: Vec<CommentRow>) -> Vec<PostView> {
    let mut comments_map: HashMap<String, Vec<CommentView>> = HashMap::new();
    for row in comments {
        comments_map
            .entry(row.post_id.clone())
            .or_default()
            .push(comment_view(row));
    }

    posts
        .into_iter()
        .map(|row| {
            let comments = comments_map.remove(&row.id).unwrap_or_default();
            PostView {
                id: parse_uuid(&row.id),
                text: row.text,
                likes: row.likes_count,
                time: time_ago(&row.created_at),
                media_url: row.media_url,
                media_type: row.media_type,
                user_id: parse_uuid(&row.author_id),
                author: row.author_name.clone(),
                handle: at_handle(&row.author_handle),
                avatar: row.author_avatar.unwrap_or_default(),
                initials: initials(&row.author_name),
                liked: row.liked,
                comments,
            }
        })
        .collect()
}

fn comment_view(row: CommentRow) -> CommentView {
    CommentView {
        id: parse_uuid(&row.id),
        text: row.text,
        likes: row.likes_count,
        author: row.author_name,
        handle: at_handle(&row.author_handle),
        avatar: row.author_avatar.unwrap_or_default(),
        user_id: parse_uuid(&row.author_id),
        liked: row.liked,
    }
}
