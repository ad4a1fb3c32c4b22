//! Database row types — these map directly to SQLite rows.
//! Distinct from the eclipse-types API models to keep the DB layer
//! independent of the HTTP surface.

#[derive(Debug)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub handle: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub banner: Option<String>,
}

/// Public user fields, as joined into search results and follow lists.
pub struct UserLiteRow {
    pub id: String,
    pub name: String,
    pub handle: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
}

pub struct PostRow {
    pub id: String,
    pub text: String,
    pub likes_count: i64,
    pub created_at: String,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub author_id: String,
    pub author_name: String,
    pub author_handle: String,
    pub author_avatar: Option<String>,
    pub liked: bool,
}

pub struct CommentRow {
    pub id: String,
    pub post_id: String,
    pub text: String,
    pub likes_count: i64,
    pub created_at: String,
    pub author_id: String,
    pub author_name: String,
    pub author_handle: String,
    pub author_avatar: Option<String>,
    pub liked: bool,
}

pub struct ChatSummaryRow {
    pub chat_id: String,
    pub partner_id: String,
    pub partner_name: String,
    pub partner_handle: String,
    pub partner_avatar: Option<String>,
    pub last_text: Option<String>,
    pub last_type: Option<String>,
    pub last_time: Option<String>,
    pub last_sender_id: Option<String>,
    pub unread: i64,
}

pub struct GroupSummaryRow {
    pub group_id: String,
    pub name: String,
    pub avatar: Option<String>,
    pub last_text: Option<String>,
    pub last_type: Option<String>,
    pub last_time: Option<String>,
    pub member_count: i64,
}

pub struct ChatMessageRow {
    pub id: String,
    pub sender_id: String,
    pub text: String,
    pub msg_type: String,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub duration: Option<i64>,
    pub created_at: String,
    pub is_read: bool,
}

pub struct GroupMessageRow {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_avatar: Option<String>,
    pub text: String,
    pub msg_type: String,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub duration: Option<i64>,
    pub created_at: String,
}

pub struct NotificationRow {
    pub id: String,
    pub kind: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: String,
    pub from_id: Option<String>,
    pub from_name: Option<String>,
    pub from_handle: Option<String>,
    pub from_avatar: Option<String>,
    pub post_id: Option<String>,
}

pub struct CountsRow {
    pub following: i64,
    pub followers: i64,
    pub posts: i64,
    pub is_following: bool,
}
