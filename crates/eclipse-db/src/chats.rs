use rusqlite::{OptionalExtension, params};
use uuid::Uuid;

use crate::models::{ChatMessageRow, ChatSummaryRow};
use crate::posts::preview;
use crate::{Database, Result, StoreError};

impl Database {
    /// Find or create the direct chat for an unordered user pair. The pair
    /// is canonicalized to (lo, hi) before lookup and insert, so both
    /// argument orders resolve to the same chat row.
    pub fn get_or_create_chat(&self, chat_id: &str, user_a: &str, user_b: &str) -> Result<String> {
        let (lo, hi) = if user_a <= user_b {
            (user_a, user_b)
        } else {
            (user_b, user_a)
        };

        self.with_tx(|tx| {
            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM chats WHERE user1_id = ?1 AND user2_id = ?2",
                    params![lo, hi],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(id) = existing {
                return Ok(id);
            }

            tx.execute(
                "INSERT INTO chats (id, user1_id, user2_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![chat_id, lo, hi, crate::now()],
            )?;
            Ok(chat_id.to_string())
        })
    }

    /// All direct chats for a user: partner fields, most recent message,
    /// unread count scoped to messages the user did not send. Ordered by
    /// latest activity, falling back to chat creation time.
    pub fn list_chats(&self, user_id: &str) -> Result<Vec<ChatSummaryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id,
                        CASE WHEN c.user1_id = ?1 THEN c.user2_id ELSE c.user1_id END,
                        u.name, u.handle, u.avatar,
                        cm.text, cm.msg_type, cm.created_at, cm.sender_id,
                        (SELECT COUNT(*) FROM chat_messages
                         WHERE chat_id = c.id AND is_read = 0 AND sender_id != ?1)
                 FROM chats c
                 JOIN users u
                   ON u.id = CASE WHEN c.user1_id = ?1 THEN c.user2_id ELSE c.user1_id END
                 LEFT JOIN chat_messages cm ON cm.id = (
                     SELECT id FROM chat_messages WHERE chat_id = c.id
                     ORDER BY created_at DESC, rowid DESC LIMIT 1
                 )
                 WHERE c.user1_id = ?1 OR c.user2_id = ?1
                 ORDER BY COALESCE(cm.created_at, c.created_at) DESC",
            )?;

            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(ChatSummaryRow {
                        chat_id: row.get(0)?,
                        partner_id: row.get(1)?,
                        partner_name: row.get(2)?,
                        partner_handle: row.get(3)?,
                        partner_avatar: row.get(4)?,
                        last_text: row.get(5)?,
                        last_type: row.get(6)?,
                        last_time: row.get(7)?,
                        last_sender_id: row.get(8)?,
                        unread: row.get(9)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Last 100 messages, chronological. Reading history marks every unread
    /// message from the other participant as read, in the same transaction.
    pub fn chat_history(&self, chat_id: &str, user_id: &str) -> Result<Vec<ChatMessageRow>> {
        self.with_tx(|tx| {
            let mut stmt = tx.prepare(
                "SELECT id, sender_id, text, msg_type, file_url, file_name, duration,
                        created_at, is_read
                 FROM chat_messages
                 WHERE chat_id = ?1
                 ORDER BY created_at ASC, rowid ASC
                 LIMIT 100",
            )?;
            let rows = stmt
                .query_map([chat_id], map_chat_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            drop(stmt);

            tx.execute(
                "UPDATE chat_messages SET is_read = 1
                 WHERE chat_id = ?1 AND sender_id != ?2 AND is_read = 0",
                params![chat_id, user_id],
            )?;

            Ok(rows)
        })
    }

    /// Insert a direct message and notify the other participant with a text
    /// preview (or a generic marker for media). Returns the created_at stamp.
    #[allow(clippy::too_many_arguments)]
    pub fn send_chat_message(
        &self,
        message_id: &str,
        chat_id: &str,
        sender_id: &str,
        text: &str,
        msg_type: &str,
        file_url: Option<&str>,
        file_name: Option<&str>,
        duration: Option<i64>,
    ) -> Result<String> {
        self.with_tx(|tx| {
            let pair: Option<(String, String)> = tx
                .query_row(
                    "SELECT user1_id, user2_id FROM chats WHERE id = ?1",
                    [chat_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let (user1, user2) =
                pair.ok_or_else(|| StoreError::NotFound("Chat not found".into()))?;

            let created_at = crate::now();
            tx.execute(
                "INSERT INTO chat_messages
                     (id, chat_id, sender_id, text, msg_type, file_url, file_name, duration, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    message_id, chat_id, sender_id, text, msg_type, file_url, file_name,
                    duration, created_at
                ],
            )?;

            let recipient = if user1 == sender_id { user2 } else { user1 };
            let message = if text.is_empty() {
                "Media message".to_string()
            } else {
                preview(text, 100)
            };
            tx.execute(
                "INSERT INTO notifications (id, user_id, from_user_id, type, message, created_at)
                 VALUES (?1, ?2, ?3, 'message', ?4, ?5)",
                params![
                    Uuid::new_v4().to_string(),
                    recipient,
                    sender_id,
                    message,
                    crate::now()
                ],
            )?;

            Ok(created_at)
        })
    }

    pub fn mark_read(&self, chat_id: &str, user_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE chat_messages SET is_read = 1
                 WHERE chat_id = ?1 AND sender_id != ?2 AND is_read = 0",
                params![chat_id, user_id],
            )?;
            Ok(())
        })
    }

    /// Clear the requester's own messages in a chat. The chat row and the
    /// other participant's messages are untouched.
    pub fn delete_chat_messages(&self, chat_id: &str, user_id: &str) -> Result<()> {
        self.with_tx(|tx| {
            let pair: Option<(String, String)> = tx
                .query_row(
                    "SELECT user1_id, user2_id FROM chats WHERE id = ?1",
                    [chat_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let (user1, user2) =
                pair.ok_or_else(|| StoreError::NotFound("Chat not found".into()))?;
            if user_id != user1 && user_id != user2 {
                return Err(StoreError::Forbidden("Not a participant".into()));
            }

            tx.execute(
                "UPDATE chat_messages SET text = '' WHERE chat_id = ?1 AND sender_id = ?2",
                params![chat_id, user_id],
            )?;
            Ok(())
        })
    }

    pub fn save_wallpaper(&self, user_id: &str, chat_key: &str, wallpaper: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chat_wallpapers (user_id, chat_key, wallpaper)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (user_id, chat_key) DO UPDATE SET wallpaper = excluded.wallpaper",
                params![user_id, chat_key, wallpaper],
            )?;
            Ok(())
        })
    }

    pub fn get_wallpaper(&self, user_id: &str, chat_key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT wallpaper FROM chat_wallpapers WHERE user_id = ?1 AND chat_key = ?2",
                params![user_id, chat_key],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
        })
    }
}

fn map_chat_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatMessageRow> {
    Ok(ChatMessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        text: row.get(2)?,
        msg_type: row.get(3)?,
        file_url: row.get(4)?,
        file_name: row.get(5)?,
        duration: row.get(6)?,
        created_at: row.get(7)?,
        is_read: row.get(8)?,
    })
}
