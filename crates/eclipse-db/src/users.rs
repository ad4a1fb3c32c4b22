use rusqlite::{OptionalExtension, ToSql, Transaction, params};

use crate::models::{UserLiteRow, UserRow};
use crate::{Database, Result, StoreError};

/// Partial profile update. Only `Some` fields are written.
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub handle: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub banner: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.handle.is_none()
            && self.email.is_none()
            && self.bio.is_none()
            && self.avatar.is_none()
            && self.banner.is_none()
    }
}

impl Database {
    pub fn register_user(
        &self,
        id: &str,
        name: &str,
        handle: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRow> {
        self.with_tx(|tx| {
            let taken: Option<String> = tx
                .query_row(
                    "SELECT id FROM users WHERE email = ?1",
                    [email],
                    |row| row.get(0),
                )
                .optional()?;
            if taken.is_some() {
                return Err(StoreError::Conflict("Email already taken".into()));
            }

            tx.execute(
                "INSERT INTO users (id, name, handle, email, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, name, handle, email, password_hash, crate::now()],
            )?;

            fetch_user(tx, id)?.ok_or_else(|| StoreError::NotFound("User not found".into()))
        })
    }

    /// Exact (email, password-hash) match, as used by login.
    pub fn find_by_credentials(&self, email: &str, password_hash: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.prepare(
                "SELECT id, name, handle, email, password_hash, avatar, bio, banner
                 FROM users WHERE email = ?1 AND password_hash = ?2",
            )?
            .query_row([email, password_hash], map_user)
            .optional()
            .map_err(Into::into)
        })
    }

    pub fn get_user(&self, user_id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.prepare(
                "SELECT id, name, handle, email, password_hash, avatar, bio, banner
                 FROM users WHERE id = ?1",
            )?
            .query_row([user_id], map_user)
            .optional()
            .map_err(Into::into)
        })
    }

    /// Apply all requested changes in one update, after checking that a new
    /// handle or email is not taken by another user.
    pub fn update_profile(&self, user_id: &str, changes: &ProfileChanges) -> Result<UserRow> {
        self.with_tx(|tx| {
            if let Some(handle) = &changes.handle {
                let taken: Option<String> = tx
                    .query_row(
                        "SELECT id FROM users WHERE handle = ?1 AND id != ?2",
                        params![handle, user_id],
                        |row| row.get(0),
                    )
                    .optional()?;
                if taken.is_some() {
                    return Err(StoreError::Conflict("Handle already taken".into()));
                }
            }
            if let Some(email) = &changes.email {
                let taken: Option<String> = tx
                    .query_row(
                        "SELECT id FROM users WHERE email = ?1 AND id != ?2",
                        params![email, user_id],
                        |row| row.get(0),
                    )
                    .optional()?;
                if taken.is_some() {
                    return Err(StoreError::Conflict("Email already taken".into()));
                }
            }

            if !changes.is_empty() {
                let mut sets: Vec<&str> = Vec::new();
                let mut values: Vec<&dyn ToSql> = Vec::new();
                if let Some(v) = &changes.name {
                    sets.push("name = ?");
                    values.push(v);
                }
                if let Some(v) = &changes.handle {
                    sets.push("handle = ?");
                    values.push(v);
                }
                if let Some(v) = &changes.email {
                    sets.push("email = ?");
                    values.push(v);
                }
                if let Some(v) = &changes.bio {
                    sets.push("bio = ?");
                    values.push(v);
                }
                if let Some(v) = &changes.avatar {
                    sets.push("avatar = ?");
                    values.push(v);
                }
                if let Some(v) = &changes.banner {
                    sets.push("banner = ?");
                    values.push(v);
                }
                values.push(&user_id);

                let sql = format!("UPDATE users SET {} WHERE id = ?", sets.join(", "));
                let affected = tx.execute(&sql, values.as_slice())?;
                if affected == 0 {
                    return Err(StoreError::NotFound("User not found".into()));
                }
            }

            fetch_user(tx, user_id)?.ok_or_else(|| StoreError::NotFound("User not found".into()))
        })
    }

    /// Returns false when the old password hash does not match the stored one.
    pub fn change_password(&self, user_id: &str, old_hash: &str, new_hash: &str) -> Result<bool> {
        self.with_tx(|tx| {
            let matches: Option<String> = tx
                .query_row(
                    "SELECT id FROM users WHERE id = ?1 AND password_hash = ?2",
                    params![user_id, old_hash],
                    |row| row.get(0),
                )
                .optional()?;
            if matches.is_none() {
                return Ok(false);
            }
            tx.execute(
                "UPDATE users SET password_hash = ?1 WHERE id = ?2",
                params![new_hash, user_id],
            )?;
            Ok(true)
        })
    }

    /// Case-insensitive substring match on name or handle. An empty query
    /// returns the first `limit` users unfiltered.
    pub fn search_users(&self, query: &str, limit: u32) -> Result<Vec<UserLiteRow>> {
        self.with_conn(|conn| {
            let rows = if query.is_empty() {
                let mut stmt = conn.prepare(
                    "SELECT id, name, handle, avatar, bio FROM users LIMIT ?1",
                )?;
                let rows = stmt
                    .query_map([limit], map_user_lite)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            } else {
                let pattern = format!("%{}%", query.to_lowercase());
                let mut stmt = conn.prepare(
                    "SELECT id, name, handle, avatar, bio FROM users
                     WHERE LOWER(name) LIKE ?1 OR LOWER(handle) LIKE ?1
                     LIMIT ?2",
                )?;
                let rows = stmt
                    .query_map(params![pattern, limit], map_user_lite)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            };
            Ok(rows)
        })
    }
}

fn fetch_user(tx: &Transaction, user_id: &str) -> Result<Option<UserRow>> {
    tx.prepare(
        "SELECT id, name, handle, email, password_hash, avatar, bio, banner
         FROM users WHERE id = ?1",
    )?
    .query_row([user_id], map_user)
    .optional()
    .map_err(Into::into)
}

fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        handle: row.get(2)?,
        email: row.get(3)?,
        password_hash: row.get(4)?,
        avatar: row.get(5)?,
        bio: row.get(6)?,
        banner: row.get(7)?,
    })
}

pub(crate) fn map_user_lite(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserLiteRow> {
    Ok(UserLiteRow {
        id: row.get(0)?,
        name: row.get(1)?,
        handle: row.get(2)?,
        avatar: row.get(3)?,
        bio: row.get(4)?,
    })
}
