use rusqlite::{OptionalExtension, params};

use crate::models::{GroupMessageRow, GroupSummaryRow};
use crate::{Database, Result, StoreError};

impl Database {
    /// Group chats the user belongs to, with member count and the most
    /// recent message, ordered by latest activity.
    pub fn list_groups(&self, user_id: &str) -> Result<Vec<GroupSummaryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT gc.id, gc.name, gc.avatar,
                        gm.text, gm.msg_type, gm.created_at,
                        (SELECT COUNT(*) FROM group_chat_members WHERE group_id = gc.id)
                 FROM group_chats gc
                 JOIN group_chat_members me ON me.group_id = gc.id AND me.user_id = ?1
                 LEFT JOIN group_messages gm ON gm.id = (
                     SELECT id FROM group_messages WHERE group_id = gc.id
                     ORDER BY created_at DESC, rowid DESC LIMIT 1
                 )
                 ORDER BY COALESCE(gm.created_at, gc.created_at) DESC",
            )?;

            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(GroupSummaryRow {
                        group_id: row.get(0)?,
                        name: row.get(1)?,
                        avatar: row.get(2)?,
                        last_text: row.get(3)?,
                        last_type: row.get(4)?,
                        last_time: row.get(5)?,
                        member_count: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Last 100 group messages, chronological, joined with sender fields.
    /// Group chats carry no per-member read state, so this has no
    /// mark-as-read side effect.
    pub fn group_history(&self, group_id: &str) -> Result<Vec<GroupMessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT gm.id, gm.sender_id, u.name, u.avatar, gm.text, gm.msg_type,
                        gm.file_url, gm.file_name, gm.duration, gm.created_at
                 FROM group_messages gm
                 JOIN users u ON u.id = gm.sender_id
                 WHERE gm.group_id = ?1
                 ORDER BY gm.created_at ASC, gm.rowid ASC
                 LIMIT 100",
            )?;
            let rows = stmt
                .query_map([group_id], |row| {
                    Ok(GroupMessageRow {
                        id: row.get(0)?,
                        sender_id: row.get(1)?,
                        sender_name: row.get(2)?,
                        sender_avatar: row.get(3)?,
                        text: row.get(4)?,
                        msg_type: row.get(5)?,
                        file_url: row.get(6)?,
                        file_name: row.get(7)?,
                        duration: row.get(8)?,
                        created_at: row.get(9)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn send_group_message(
        &self,
        message_id: &str,
        group_id: &str,
        sender_id: &str,
        text: &str,
        msg_type: &str,
        file_url: Option<&str>,
        file_name: Option<&str>,
        duration: Option<i64>,
    ) -> Result<String> {
        self.with_tx(|tx| {
            let exists: Option<i64> = tx
                .query_row("SELECT 1 FROM group_chats WHERE id = ?1", [group_id], |row| {
                    row.get(0)
                })
                .optional()?;
            if exists.is_none() {
                return Err(StoreError::NotFound("Group not found".into()));
            }

            let created_at = crate::now();
            tx.execute(
                "INSERT INTO group_messages
                     (id, group_id, sender_id, text, msg_type, file_url, file_name, duration, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    message_id, group_id, sender_id, text, msg_type, file_url, file_name,
                    duration, created_at
                ],
            )?;
            Ok(created_at)
        })
    }

    /// Create a group and enroll the creator plus the given members.
    /// Member ids are de-duplicated; the creator is always a member.
    pub fn create_group(
        &self,
        group_id: &str,
        creator_id: &str,
        name: &str,
        member_ids: &[String],
    ) -> Result<()> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO group_chats (id, name, creator_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![group_id, name, creator_id, crate::now()],
            )?;

            tx.execute(
                "INSERT INTO group_chat_members (group_id, user_id) VALUES (?1, ?2)",
                params![group_id, creator_id],
            )?;
            for member in member_ids {
                tx.execute(
                    "INSERT OR IGNORE INTO group_chat_members (group_id, user_id) VALUES (?1, ?2)",
                    params![group_id, member],
                )?;
            }
            Ok(())
        })
    }
}
