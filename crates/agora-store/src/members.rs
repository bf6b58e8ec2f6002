//! CRUD operations for [`ChannelMember`] records.

use agora_shared::types::{ChannelId, UserId};
use rusqlite::params;

use crate::database::{uuid_column, Database};
use crate::error::{Result, StoreError};
use crate::history::insert_join_event;
use crate::models::ChannelMember;

const MEMBER_COLUMNS: &str = "channel_id, user_id, roles, scheme_guest, scheme_user, \
     scheme_admin, msg_count, mention_count, last_viewed_at, last_update_at";

impl Database {
    /// Insert a membership row.  Fails if the user is already a member.
    pub fn save_member(&self, member: &ChannelMember) -> Result<()> {
        insert_member(self.conn(), member)
    }

    /// Insert a membership row and open a join interval in the member
    /// history, atomically.
    pub fn add_member_with_history(&self, member: &ChannelMember, join_time: i64) -> Result<()> {
        let tx = self.conn().unchecked_transaction()?;
        insert_member(&tx, member)?;
        insert_join_event(&tx, member.user_id, member.channel_id, join_time)?;
        tx.commit()?;
        Ok(())
    }

    /// Fetch the membership of `user_id` in `channel_id`.
    pub fn get_member(&self, channel_id: ChannelId, user_id: UserId) -> Result<ChannelMember> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {MEMBER_COLUMNS} FROM channel_members
                     WHERE channel_id = ?1 AND user_id = ?2"
                ),
                params![channel_id.to_string(), user_id.to_string()],
                row_to_member,
            )
            .map_err(StoreError::from_query)
    }

    /// All memberships of a channel.
    pub fn get_members_for_channel(&self, channel_id: ChannelId) -> Result<Vec<ChannelMember>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {MEMBER_COLUMNS} FROM channel_members
             WHERE channel_id = ?1
             ORDER BY user_id ASC"
        ))?;
        let rows = stmt.query_map(params![channel_id.to_string()], row_to_member)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// All memberships of a user.
    pub fn get_members_for_user(&self, user_id: UserId) -> Result<Vec<ChannelMember>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {MEMBER_COLUMNS} FROM channel_members
             WHERE user_id = ?1
             ORDER BY channel_id ASC"
        ))?;
        let rows = stmt.query_map(params![user_id.to_string()], row_to_member)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Delete a membership row.  Returns `true` if a row was deleted; removing
    /// a non-member is not an error.
    pub fn remove_member(&self, channel_id: ChannelId, user_id: UserId) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM channel_members WHERE channel_id = ?1 AND user_id = ?2",
            params![channel_id.to_string(), user_id.to_string()],
        )?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn insert_member(conn: &rusqlite::Connection, member: &ChannelMember) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO channel_members ({MEMBER_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        ),
        params![
            member.channel_id.to_string(),
            member.user_id.to_string(),
            member.roles,
            member.scheme_guest,
            member.scheme_user,
            member.scheme_admin,
            member.msg_count,
            member.mention_count,
            member.last_viewed_at,
            member.last_update_at,
        ],
    )?;
    Ok(())
}

fn row_to_member(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChannelMember> {
    let channel_str: String = row.get(0)?;
    let user_str: String = row.get(1)?;

    Ok(ChannelMember {
        channel_id: ChannelId(uuid_column(0, &channel_str)?),
        user_id: UserId(uuid_column(1, &user_str)?),
        roles: row.get(2)?,
        scheme_guest: row.get(3)?,
        scheme_user: row.get(4)?,
        scheme_admin: row.get(5)?,
        msg_count: row.get(6)?,
        mention_count: row.get(7)?,
        last_viewed_at: row.get(8)?,
        last_update_at: row.get(9)?,
    })
}
