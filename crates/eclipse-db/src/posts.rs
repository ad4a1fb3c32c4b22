use rusqlite::{OptionalExtension, ToSql, params};
use uuid::Uuid;

use crate::models::{CommentRow, PostRow};
use crate::{Database, Result, StoreError};

/// Tombstone written over the text of a deleted post. The row itself is kept
/// so comments and likes stay referentially intact.
pub const DELETED_POST_TEXT: &str = "[deleted]";

/// Char-safe truncation for previews and notification messages.
pub(crate) fn preview(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

impl Database {
    /// The 50 most recent posts, each annotated with whether `viewer_id`
    /// liked it. Comments are fetched separately via [`Database::comments_for_posts`].
    pub fn feed_posts(&self, viewer_id: &str) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.text, p.likes_count, p.created_at, p.media_url, p.media_type,
                        u.id, u.name, u.handle, u.avatar,
                        pl.user_id IS NOT NULL
                 FROM posts p
                 JOIN users u ON u.id = p.user_id
                 LEFT JOIN post_likes pl ON pl.post_id = p.id AND pl.user_id = ?1
                 ORDER BY p.created_at DESC, p.rowid DESC
                 LIMIT 50",
            )?;
            let rows = stmt
                .query_map([viewer_id], map_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn user_posts(&self, viewer_id: &str, target_id: &str) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.text, p.likes_count, p.created_at, p.media_url, p.media_type,
                        u.id, u.name, u.handle, u.avatar,
                        pl.user_id IS NOT NULL
                 FROM posts p
                 JOIN users u ON u.id = p.user_id
                 LEFT JOIN post_likes pl ON pl.post_id = p.id AND pl.user_id = ?1
                 WHERE p.user_id = ?2
                 ORDER BY p.created_at DESC, p.rowid DESC
                 LIMIT 50",
            )?;
            let rows = stmt
                .query_map([viewer_id, target_id], map_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn hashtag_posts(&self, viewer_id: &str, tag: &str) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.text, p.likes_count, p.created_at, p.media_url, p.media_type,
                        u.id, u.name, u.handle, u.avatar,
                        pl.user_id IS NOT NULL
                 FROM posts p
                 JOIN users u ON u.id = p.user_id
                 JOIN post_hashtags ph ON ph.post_id = p.id
                 JOIN hashtags h ON h.id = ph.hashtag_id
                 LEFT JOIN post_likes pl ON pl.post_id = p.id AND pl.user_id = ?1
                 WHERE h.tag = ?2
                 ORDER BY p.created_at DESC, p.rowid DESC
                 LIMIT 50",
            )?;
            let rows = stmt
                .query_map([viewer_id, tag], map_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Batch-fetch comments for a set of post IDs, annotated with the
    /// viewer's like state. One query for the whole post set.
    pub fn comments_for_posts(
        &self,
        viewer_id: &str,
        post_ids: &[String],
    ) -> Result<Vec<CommentRow>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (0..post_ids.len()).map(|i| format!("?{}", i + 2)).collect();
            let sql = format!(
                "SELECT c.id, c.post_id, c.text, c.likes_count, c.created_at,
                        u.id, u.name, u.handle, u.avatar,
                        cl.user_id IS NOT NULL
                 FROM comments c
                 JOIN users u ON u.id = c.user_id
                 LEFT JOIN comment_likes cl ON cl.comment_id = c.id AND cl.user_id = ?1
                 WHERE c.post_id IN ({})
                 ORDER BY c.created_at ASC, c.rowid ASC",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let mut bind: Vec<&dyn ToSql> = vec![&viewer_id];
            for id in post_ids {
                bind.push(id);
            }

            let rows = stmt
                .query_map(bind.as_slice(), map_comment)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn trending(&self, limit: u32) -> Result<Vec<(String, i64)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT tag, count FROM hashtags ORDER BY count DESC, tag ASC LIMIT ?1",
            )?;
            let rows = stmt
                .query_map([limit], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Last 50 posts the user liked. No comment expansion.
    pub fn liked_posts(&self, user_id: &str) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.text, p.likes_count, p.created_at, p.media_url, p.media_type,
                        u.id, u.name, u.handle, u.avatar, 1
                 FROM post_likes pl
                 JOIN posts p ON p.id = pl.post_id
                 JOIN users u ON u.id = p.user_id
                 WHERE pl.user_id = ?1
                 ORDER BY pl.created_at DESC, pl.rowid DESC
                 LIMIT 50",
            )?;
            let rows = stmt
                .query_map([user_id], map_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Insert a post and upsert its hashtags in one transaction. `tags` must
    /// already be lowercased and de-duplicated; each listed tag has its
    /// running count incremented by exactly one.
    pub fn create_post(
        &self,
        post_id: &str,
        user_id: &str,
        text: &str,
        media_url: Option<&str>,
        media_type: Option<&str>,
        tags: &[String],
    ) -> Result<()> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO posts (id, user_id, text, media_url, media_type, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![post_id, user_id, text, media_url, media_type, crate::now()],
            )?;

            for tag in tags {
                let existing: Option<String> = tx
                    .query_row("SELECT id FROM hashtags WHERE tag = ?1", [tag], |row| {
                        row.get(0)
                    })
                    .optional()?;

                let hashtag_id = match existing {
                    Some(id) => {
                        tx.execute("UPDATE hashtags SET count = count + 1 WHERE id = ?1", [&id])?;
                        id
                    }
                    None => {
                        let id = Uuid::new_v4().to_string();
                        tx.execute(
                            "INSERT INTO hashtags (id, tag, count) VALUES (?1, ?2, 1)",
                            params![id, tag],
                        )?;
                        id
                    }
                };

                tx.execute(
                    "INSERT OR IGNORE INTO post_hashtags (post_id, hashtag_id) VALUES (?1, ?2)",
                    params![post_id, hashtag_id],
                )?;
            }

            Ok(())
        })
    }

    /// Tombstone a post: only the author may delete, linked hashtag counts
    /// are decremented (floored at zero), text and media are cleared, the
    /// row survives for comment/like integrity.
    pub fn delete_post(&self, user_id: &str, post_id: &str) -> Result<()> {
        self.with_tx(|tx| {
            let author: Option<String> = tx
                .query_row("SELECT user_id FROM posts WHERE id = ?1", [post_id], |row| {
                    row.get(0)
                })
                .optional()?;
            let author = author.ok_or_else(|| StoreError::NotFound("Post not found".into()))?;
            if author != user_id {
                return Err(StoreError::Forbidden("Not your post".into()));
            }

            tx.execute(
                "UPDATE hashtags SET count = MAX(0, count - 1)
                 WHERE id IN (SELECT hashtag_id FROM post_hashtags WHERE post_id = ?1)",
                [post_id],
            )?;
            tx.execute(
                "UPDATE posts SET text = ?1, media_url = NULL, media_type = NULL WHERE id = ?2",
                params![DELETED_POST_TEXT, post_id],
            )?;
            Ok(())
        })
    }

    /// Idempotent like flip. Returns the new liked state and counter value.
    /// A first-time like notifies the post author (unless self-like).
    pub fn toggle_post_like(&self, user_id: &str, post_id: &str) -> Result<(bool, i64)> {
        self.with_tx(|tx| {
            let author: Option<String> = tx
                .query_row("SELECT user_id FROM posts WHERE id = ?1", [post_id], |row| {
                    row.get(0)
                })
                .optional()?;
            let author = author.ok_or_else(|| StoreError::NotFound("Post not found".into()))?;

            let existing: Option<i64> = tx
                .query_row(
                    "SELECT 1 FROM post_likes WHERE user_id = ?1 AND post_id = ?2",
                    params![user_id, post_id],
                    |row| row.get(0),
                )
                .optional()?;

            let liked = if existing.is_some() {
                tx.execute(
                    "DELETE FROM post_likes WHERE user_id = ?1 AND post_id = ?2",
                    params![user_id, post_id],
                )?;
                tx.execute(
                    "UPDATE posts SET likes_count = MAX(0, likes_count - 1) WHERE id = ?1",
                    [post_id],
                )?;
                false
            } else {
                tx.execute(
                    "INSERT INTO post_likes (user_id, post_id, created_at) VALUES (?1, ?2, ?3)",
                    params![user_id, post_id, crate::now()],
                )?;
                tx.execute(
                    "UPDATE posts SET likes_count = likes_count + 1 WHERE id = ?1",
                    [post_id],
                )?;
                if author != user_id {
                    tx.execute(
                        "INSERT INTO notifications (id, user_id, from_user_id, type, message, post_id, created_at)
                         VALUES (?1, ?2, ?3, 'like', 'liked your post', ?4, ?5)",
                        params![Uuid::new_v4().to_string(), author, user_id, post_id, crate::now()],
                    )?;
                }
                true
            };

            let likes: i64 = tx.query_row(
                "SELECT likes_count FROM posts WHERE id = ?1",
                [post_id],
                |row| row.get(0),
            )?;
            Ok((liked, likes))
        })
    }

    pub fn toggle_comment_like(&self, user_id: &str, comment_id: &str) -> Result<(bool, i64)> {
        self.with_tx(|tx| {
            let exists: Option<i64> = tx
                .query_row(
                    "SELECT 1 FROM comments WHERE id = ?1",
                    [comment_id],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_none() {
                return Err(StoreError::NotFound("Comment not found".into()));
            }

            let existing: Option<i64> = tx
                .query_row(
                    "SELECT 1 FROM comment_likes WHERE user_id = ?1 AND comment_id = ?2",
                    params![user_id, comment_id],
                    |row| row.get(0),
                )
                .optional()?;

            let liked = if existing.is_some() {
                tx.execute(
                    "DELETE FROM comment_likes WHERE user_id = ?1 AND comment_id = ?2",
                    params![user_id, comment_id],
                )?;
                tx.execute(
                    "UPDATE comments SET likes_count = MAX(0, likes_count - 1) WHERE id = ?1",
                    [comment_id],
                )?;
                false
            } else {
                tx.execute(
                    "INSERT INTO comment_likes (user_id, comment_id, created_at) VALUES (?1, ?2, ?3)",
                    params![user_id, comment_id, crate::now()],
                )?;
                tx.execute(
                    "UPDATE comments SET likes_count = likes_count + 1 WHERE id = ?1",
                    [comment_id],
                )?;
                true
            };

            let likes: i64 = tx.query_row(
                "SELECT likes_count FROM comments WHERE id = ?1",
                [comment_id],
                |row| row.get(0),
            )?;
            Ok((liked, likes))
        })
    }

    /// Insert a comment and notify the post author with a truncated preview
    /// (skipped on self-comment). Returns the comment joined with its
    /// author's public fields.
    pub fn create_comment(
        &self,
        comment_id: &str,
        user_id: &str,
        post_id: &str,
        text: &str,
    ) -> Result<CommentRow> {
        self.with_tx(|tx| {
            let author: Option<String> = tx
                .query_row("SELECT user_id FROM posts WHERE id = ?1", [post_id], |row| {
                    row.get(0)
                })
                .optional()?;
            let author = author.ok_or_else(|| StoreError::NotFound("Post not found".into()))?;

            let created_at = crate::now();
            tx.execute(
                "INSERT INTO comments (id, post_id, user_id, text, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![comment_id, post_id, user_id, text, created_at],
            )?;

            if author != user_id {
                tx.execute(
                    "INSERT INTO notifications (id, user_id, from_user_id, type, message, post_id, created_at)
                     VALUES (?1, ?2, ?3, 'comment', ?4, ?5, ?6)",
                    params![
                        Uuid::new_v4().to_string(),
                        author,
                        user_id,
                        preview(text, 100),
                        post_id,
                        crate::now()
                    ],
                )?;
            }

            let (name, handle, avatar): (String, String, Option<String>) = tx.query_row(
                "SELECT name, handle, avatar FROM users WHERE id = ?1",
                [user_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

            Ok(CommentRow {
                id: comment_id.to_string(),
                post_id: post_id.to_string(),
                text: text.to_string(),
                likes_count: 0,
                created_at,
                author_id: user_id.to_string(),
                author_name: name,
                author_handle: handle,
                author_avatar: avatar,
                liked: false,
            })
        })
    }
}

fn map_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        text: row.get(1)?,
        likes_count: row.get(2)?,
        created_at: row.get(3)?,
        media_url: row.get(4)?,
        media_type: row.get(5)?,
        author_id: row.get(6)?,
        author_name: row.get(7)?,
        author_handle: row.get(8)?,
        author_avatar: row.get(9)?,
        liked: row.get(10)?,
    })
}

fn map_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        post_id: row.get(1)?,
        text: row.get(2)?,
        likes_count: row.get(3)?,
        created_at: row.get(4)?,
        author_id: row.get(5)?,
        author_name: row.get(6)?,
        author_handle: row.get(7)?,
        author_avatar: row.get(8)?,
        liked: row.get(9)?,
    })
}
