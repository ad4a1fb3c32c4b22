use rusqlite::{OptionalExtension, params};
use uuid::Uuid;

use crate::models::{CountsRow, NotificationRow, UserLiteRow};
use crate::users::map_user_lite;
use crate::{Database, Result};

impl Database {
    /// Idempotent follow flip. Following (not unfollowing) notifies the
    /// target. Returns the new state and the target's follower count.
    pub fn toggle_follow(&self, follower_id: &str, following_id: &str) -> Result<(bool, i64)> {
        self.with_tx(|tx| {
            let existing: Option<i64> = tx
                .query_row(
                    "SELECT 1 FROM follows WHERE follower_id = ?1 AND following_id = ?2",
                    params![follower_id, following_id],
                    |row| row.get(0),
                )
                .optional()?;

            let followed = if existing.is_some() {
                tx.execute(
                    "DELETE FROM follows WHERE follower_id = ?1 AND following_id = ?2",
                    params![follower_id, following_id],
                )?;
                false
            } else {
                tx.execute(
                    "INSERT INTO follows (follower_id, following_id, created_at) VALUES (?1, ?2, ?3)",
                    params![follower_id, following_id, crate::now()],
                )?;
                tx.execute(
                    "INSERT INTO notifications (id, user_id, from_user_id, type, message, created_at)
                     VALUES (?1, ?2, ?3, 'follow', 'followed you', ?4)",
                    params![
                        Uuid::new_v4().to_string(),
                        following_id,
                        follower_id,
                        crate::now()
                    ],
                )?;
                true
            };

            let followers: i64 = tx.query_row(
                "SELECT COUNT(*) FROM follows WHERE following_id = ?1",
                [following_id],
                |row| row.get(0),
            )?;
            Ok((followed, followers))
        })
    }

    pub fn following(&self, user_id: &str) -> Result<Vec<UserLiteRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.name, u.handle, u.avatar, u.bio
                 FROM follows f
                 JOIN users u ON u.id = f.following_id
                 WHERE f.follower_id = ?1
                 ORDER BY f.created_at DESC, f.rowid DESC",
            )?;
            let rows = stmt
                .query_map([user_id], map_user_lite)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn followers(&self, user_id: &str) -> Result<Vec<UserLiteRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.name, u.handle, u.avatar, u.bio
                 FROM follows f
                 JOIN users u ON u.id = f.follower_id
                 WHERE f.following_id = ?1
                 ORDER BY f.created_at DESC, f.rowid DESC",
            )?;
            let rows = stmt
                .query_map([user_id], map_user_lite)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Follow/follower/post counts for a profile page, plus whether the
    /// viewer follows the target.
    pub fn counts(&self, viewer_id: &str, target_id: &str) -> Result<CountsRow> {
        self.with_conn(|conn| {
            let following: i64 = conn.query_row(
                "SELECT COUNT(*) FROM follows WHERE follower_id = ?1",
                [target_id],
                |row| row.get(0),
            )?;
            let followers: i64 = conn.query_row(
                "SELECT COUNT(*) FROM follows WHERE following_id = ?1",
                [target_id],
                |row| row.get(0),
            )?;
            let posts: i64 = conn.query_row(
                "SELECT COUNT(*) FROM posts WHERE user_id = ?1",
                [target_id],
                |row| row.get(0),
            )?;

            let is_following = if !viewer_id.is_empty() && viewer_id != target_id {
                conn.query_row(
                    "SELECT 1 FROM follows WHERE follower_id = ?1 AND following_id = ?2",
                    params![viewer_id, target_id],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?
                .is_some()
            } else {
                false
            };

            Ok(CountsRow {
                following,
                followers,
                posts,
                is_following,
            })
        })
    }

    /// Last 50 notifications, newest first, joined with the originating
    /// user's public fields.
    pub fn notifications(&self, user_id: &str) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT n.id, n.type, n.message, n.is_read, n.created_at,
                        u.id, u.name, u.handle, u.avatar, n.post_id
                 FROM notifications n
                 LEFT JOIN users u ON u.id = n.from_user_id
                 WHERE n.user_id = ?1
                 ORDER BY n.created_at DESC, n.rowid DESC
                 LIMIT 50",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(NotificationRow {
                        id: row.get(0)?,
                        kind: row.get(1)?,
                        message: row.get(2)?,
                        is_read: row.get(3)?,
                        created_at: row.get(4)?,
                        from_id: row.get(5)?,
                        from_name: row.get(6)?,
                        from_handle: row.get(7)?,
                        from_avatar: row.get(8)?,
                        post_id: row.get(9)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Unread direct messages across all of the user's chats.
    pub fn unread_message_count(&self, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM chat_messages cm
                 JOIN chats c ON c.id = cm.chat_id
                 WHERE (c.user1_id = ?1 OR c.user2_id = ?1)
                   AND cm.sender_id != ?1 AND cm.is_read = 0",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// Mark one notification read, or all of them when `notif_id` is None.
    pub fn mark_notifications_read(&self, user_id: &str, notif_id: Option<&str>) -> Result<()> {
        self.with_conn(|conn| {
            match notif_id {
                Some(id) => conn.execute(
                    "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
                    params![id, user_id],
                )?,
                None => conn.execute(
                    "UPDATE notifications SET is_read = 1 WHERE user_id = ?1",
                    [user_id],
                )?,
            };
            Ok(())
        })
    }
}
