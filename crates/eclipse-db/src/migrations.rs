use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            name            TEXT NOT NULL,
            handle          TEXT NOT NULL UNIQUE,
            email           TEXT NOT NULL UNIQUE,
            password_hash   TEXT NOT NULL,
            avatar          TEXT,
            bio             TEXT,
            banner          TEXT,
            created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        );

        CREATE TABLE IF NOT EXISTS posts (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id),
            text        TEXT NOT NULL,
            media_url   TEXT,
            media_type  TEXT,
            likes_count INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        );

        CREATE INDEX IF NOT EXISTS idx_posts_user
            ON posts(user_id, created_at);

        CREATE TABLE IF NOT EXISTS comments (
            id          TEXT PRIMARY KEY,
            post_id     TEXT NOT NULL REFERENCES posts(id),
            user_id     TEXT NOT NULL REFERENCES users(id),
            text        TEXT NOT NULL,
            likes_count INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        );

        CREATE INDEX IF NOT EXISTS idx_comments_post
            ON comments(post_id, created_at);

        CREATE TABLE IF NOT EXISTS post_likes (
            user_id     TEXT NOT NULL REFERENCES users(id),
            post_id     TEXT NOT NULL REFERENCES posts(id),
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
            PRIMARY KEY (user_id, post_id)
        );

        CREATE TABLE IF NOT EXISTS comment_likes (
            user_id     TEXT NOT NULL REFERENCES users(id),
            comment_id  TEXT NOT NULL REFERENCES comments(id),
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
            PRIMARY KEY (user_id, comment_id)
        );

        CREATE TABLE IF NOT EXISTS hashtags (
            id      TEXT PRIMARY KEY,
            tag     TEXT NOT NULL UNIQUE,
            count   INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS post_hashtags (
            post_id     TEXT NOT NULL REFERENCES posts(id),
            hashtag_id  TEXT NOT NULL REFERENCES hashtags(id),
            PRIMARY KEY (post_id, hashtag_id)
        );

        -- Direct chats: participant pair stored canonicalized (user1_id < user2_id)
        -- so there is at most one chat per unordered pair.
        CREATE TABLE IF NOT EXISTS chats (
            id          TEXT PRIMARY KEY,
            user1_id    TEXT NOT NULL REFERENCES users(id),
            user2_id    TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
            UNIQUE (user1_id, user2_id)
        );

        CREATE TABLE IF NOT EXISTS chat_messages (
            id          TEXT PRIMARY KEY,
            chat_id     TEXT NOT NULL REFERENCES chats(id),
            sender_id   TEXT NOT NULL REFERENCES users(id),
            text        TEXT NOT NULL DEFAULT '',
            msg_type    TEXT NOT NULL DEFAULT 'text',
            file_url    TEXT,
            file_name   TEXT,
            duration    INTEGER,
            is_read     INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        );

        CREATE INDEX IF NOT EXISTS idx_chat_messages_chat
            ON chat_messages(chat_id, created_at);

        CREATE TABLE IF NOT EXISTS group_chats (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            creator_id  TEXT NOT NULL REFERENCES users(id),
            avatar      TEXT,
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        );

        CREATE TABLE IF NOT EXISTS group_chat_members (
            group_id    TEXT NOT NULL REFERENCES group_chats(id),
            user_id     TEXT NOT NULL REFERENCES users(id),
            PRIMARY KEY (group_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS group_messages (
            id          TEXT PRIMARY KEY,
            group_id    TEXT NOT NULL REFERENCES group_chats(id),
            sender_id   TEXT NOT NULL REFERENCES users(id),
            text        TEXT NOT NULL DEFAULT '',
            msg_type    TEXT NOT NULL DEFAULT 'text',
            file_url    TEXT,
            file_name   TEXT,
            duration    INTEGER,
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        );

        CREATE INDEX IF NOT EXISTS idx_group_messages_group
            ON group_messages(group_id, created_at);

        CREATE TABLE IF NOT EXISTS follows (
            follower_id     TEXT NOT NULL REFERENCES users(id),
            following_id    TEXT NOT NULL REFERENCES users(id),
            created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
            PRIMARY KEY (follower_id, following_id)
        );

        CREATE TABLE IF NOT EXISTS notifications (
            id              TEXT PRIMARY KEY,
            user_id         TEXT NOT NULL REFERENCES users(id),
            from_user_id    TEXT REFERENCES users(id),
            type            TEXT NOT NULL,
            message         TEXT NOT NULL,
            post_id         TEXT,
            is_read         INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_user
            ON notifications(user_id, created_at);

        CREATE TABLE IF NOT EXISTS chat_wallpapers (
            user_id     TEXT NOT NULL REFERENCES users(id),
            chat_key    TEXT NOT NULL,
            wallpaper   TEXT NOT NULL,
            PRIMARY KEY (user_id, chat_key)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
