//! CRUD operations for [`User`] records.

use agora_shared::types::UserId;
use rusqlite::params;

use crate::database::{timestamp_column, uuid_column, Database};
use crate::error::{Result, StoreError};
use crate::models::User;

impl Database {
    /// Insert a new user.
    pub fn create_user(&self, user: &User) -> Result<()> {
        self.conn().execute(
            "INSERT INTO users (id, username, roles, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                user.id.to_string(),
                user.username,
                user.roles,
                user.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch a single user by id.
    pub fn get_user(&self, id: UserId) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, username, roles, created_at FROM users WHERE id = ?1",
                params![id.to_string()],
                row_to_user,
            )
            .map_err(StoreError::from_query)
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id_str: String = row.get(0)?;
    let created_str: String = row.get(3)?;

    Ok(User {
        id: UserId(uuid_column(0, &id_str)?),
        username: row.get(1)?,
        roles: row.get(2)?,
        created_at: timestamp_column(3, &created_str)?,
    })
}
