use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public user shape returned by register/login, session token included.
#[derive(Debug, Serialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub handle: String,
    pub avatar: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: AuthUser,
}

// -- Profile --

#[derive(Debug, Deserialize)]
pub struct ProfileGetRequest {
    pub user_id: Uuid,
}

/// Partial update: only fields present in the request are applied.
#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub handle: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub banner: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileUser {
    pub id: Uuid,
    pub name: String,
    pub handle: String,
    pub email: String,
    pub avatar: String,
    pub bio: String,
    pub banner: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: ProfileUser,
}

// -- Search / user listings --

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub handle: String,
    pub avatar: String,
    pub bio: String,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserSummary>,
}

// -- Feed --

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    #[serde(default = "default_feed_action")]
    pub action: String,
    pub user_id: Option<Uuid>,
    pub target_id: Option<Uuid>,
    pub tag: Option<String>,
}

fn default_feed_action() -> String {
    "feed".into()
}

#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: Uuid,
    pub text: String,
    pub likes: i64,
    pub author: String,
    pub handle: String,
    pub avatar: String,
    pub user_id: Uuid,
    pub liked: bool,
}

#[derive(Debug, Serialize)]
pub struct PostView {
    pub id: Uuid,
    pub text: String,
    pub likes: i64,
    pub time: String,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub user_id: Uuid,
    pub author: String,
    pub handle: String,
    pub avatar: String,
    pub initials: String,
    pub liked: bool,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub posts: Vec<PostView>,
}

#[derive(Debug, Serialize)]
pub struct HashtagFeedResponse {
    pub posts: Vec<PostView>,
    pub tag: String,
}

#[derive(Debug, Serialize)]
pub struct TrendingTag {
    pub tag: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct TrendingResponse {
    pub tags: Vec<TrendingTag>,
}

/// Posts the user liked; a leaner shape than the feed (no comments,
/// no viewer like-state).
#[derive(Debug, Serialize)]
pub struct LikedPostView {
    pub id: Uuid,
    pub text: String,
    pub likes: i64,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub user_id: Uuid,
    pub author: String,
    pub handle: String,
    pub avatar: String,
}

#[derive(Debug, Serialize)]
pub struct LikedPostsResponse {
    pub posts: Vec<LikedPostView>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub user_id: Uuid,
    pub text: String,
    pub media_data: Option<String>,
    pub media_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatePostResponse {
    pub id: Uuid,
    pub media_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeletePostRequest {
    pub user_id: Uuid,
    pub post_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct LikePostRequest {
    pub user_id: Uuid,
    pub post_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct LikeCommentRequest {
    pub user_id: Uuid,
    pub comment_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub likes: i64,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub comment: CommentView,
}

// -- Messaging --

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    #[serde(default = "default_messages_action")]
    pub action: String,
    pub user_id: Option<Uuid>,
    pub chat_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub target_id: Option<Uuid>,
}

fn default_messages_action() -> String {
    "list".into()
}

#[derive(Debug, Serialize)]
pub struct ChatSummary {
    pub chat_id: Uuid,
    pub partner_id: Uuid,
    pub partner_name: String,
    pub partner_handle: String,
    pub partner_avatar: String,
    pub last_msg: String,
    pub last_time: String,
    pub unread: i64,
    pub is_mine: bool,
}

#[derive(Debug, Serialize)]
pub struct GroupSummary {
    pub group_id: Uuid,
    pub name: String,
    pub avatar: String,
    pub last_msg: String,
    pub last_time: String,
    pub member_count: i64,
    pub is_group: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatListResponse {
    pub chats: Vec<ChatSummary>,
    pub groups: Vec<GroupSummary>,
}

#[derive(Debug, Serialize)]
pub struct MessageView {
    pub id: Uuid,
    pub from_me: bool,
    pub sender_id: Uuid,
    pub text: String,
    #[serde(rename = "type")]
    pub msg_type: String,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub duration: Option<i64>,
    pub time: String,
    pub is_read: bool,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub messages: Vec<MessageView>,
}

#[derive(Debug, Serialize)]
pub struct GroupMessageView {
    pub id: Uuid,
    pub from_me: bool,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub sender_avatar: String,
    pub text: String,
    #[serde(rename = "type")]
    pub msg_type: String,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub duration: Option<i64>,
    pub time: String,
}

#[derive(Debug, Serialize)]
pub struct GroupHistoryResponse {
    pub messages: Vec<GroupMessageView>,
}

#[derive(Debug, Deserialize)]
pub struct GetOrCreateChatRequest {
    pub user_id: Uuid,
    pub partner_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ChatIdResponse {
    pub chat_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type", default = "default_msg_type")]
    pub msg_type: String,
    pub file_name: Option<String>,
    pub duration: Option<i64>,
    pub file_data: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendGroupMessageRequest {
    pub group_id: Uuid,
    pub sender_id: Uuid,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type", default = "default_msg_type")]
    pub msg_type: String,
    pub file_name: Option<String>,
    pub duration: Option<i64>,
    pub file_data: Option<String>,
    pub content_type: Option<String>,
}

fn default_msg_type() -> String {
    "text".into()
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub id: Uuid,
    pub time: String,
    pub file_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub chat_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct DeleteChatRequest {
    pub chat_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub creator_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CreateGroupResponse {
    pub group_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SaveWallpaperRequest {
    pub user_id: Uuid,
    pub chat_key: String,
    pub wallpaper: String,
}

#[derive(Debug, Deserialize)]
pub struct GetWallpaperRequest {
    pub user_id: Uuid,
    pub chat_key: String,
}

#[derive(Debug, Serialize)]
pub struct WallpaperResponse {
    pub wallpaper: String,
}

// -- Follows / notifications --

#[derive(Debug, Deserialize)]
pub struct ToggleFollowRequest {
    pub follower_id: Uuid,
    pub following_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ToggleFollowResponse {
    pub followed: bool,
    pub followers_count: i64,
}

#[derive(Debug, Serialize)]
pub struct NotificationView {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub is_read: bool,
    pub time: String,
    pub from_id: Option<Uuid>,
    pub from_name: Option<String>,
    pub from_handle: String,
    pub from_avatar: String,
    pub post_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<NotificationView>,
    pub unread_count: i64,
    pub unread_msg_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct MarkNotificationsReadRequest {
    pub user_id: Uuid,
    pub notif_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CountsResponse {
    pub following_count: i64,
    pub followers_count: i64,
    pub posts_count: i64,
    pub is_following: bool,
}

// -- Generic --

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}
