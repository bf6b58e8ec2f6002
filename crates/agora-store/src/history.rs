//! Join/leave log of channel memberships.

use agora_shared::types::{ChannelId, UserId};
use rusqlite::params;

use crate::database::{uuid_column, Database};
use crate::error::{Result, StoreError};
use crate::models::ChannelMemberHistory;

impl Database {
    /// Open a membership interval starting at `join_time` (millis).
    pub fn log_join_event(&self, user_id: UserId, channel_id: ChannelId, join_time: i64) -> Result<()> {
        insert_join_event(self.conn(), user_id, channel_id, join_time)
    }

    /// Close the open membership interval of `user_id` in `channel_id`.
    ///
    /// A missing open interval is logged and otherwise ignored: the member row
    /// is the source of truth, the history is an audit trail.
    pub fn log_leave_event(&self, user_id: UserId, channel_id: ChannelId, leave_time: i64) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE channel_member_history
             SET leave_time = ?1
             WHERE user_id = ?2 AND channel_id = ?3 AND leave_time IS NULL",
            params![leave_time, user_id.to_string(), channel_id.to_string()],
        )?;

        if affected == 0 {
            tracing::warn!(
                user_id = %user_id,
                channel_id = %channel_id,
                "no open member history interval to close"
            );
        }
        Ok(())
    }

    /// Every recorded interval of `user_id` in `channel_id`, oldest first.
    pub fn get_member_history(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> Result<Vec<ChannelMemberHistory>> {
        let mut stmt = self.conn().prepare(
            "SELECT channel_id, user_id, join_time, leave_time
             FROM channel_member_history
             WHERE channel_id = ?1 AND user_id = ?2
             ORDER BY join_time ASC, id ASC",
        )?;

        let rows = stmt.query_map(
            params![channel_id.to_string(), user_id.to_string()],
            |row| {
                let channel_str: String = row.get(0)?;
                let user_str: String = row.get(1)?;
                Ok(ChannelMemberHistory {
                    channel_id: ChannelId(uuid_column(0, &channel_str)?),
                    user_id: UserId(uuid_column(1, &user_str)?),
                    join_time: row.get(2)?,
                    leave_time: row.get(3)?,
                })
            },
        )?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }
}

pub(crate) fn insert_join_event(
    conn: &rusqlite::Connection,
    user_id: UserId,
    channel_id: ChannelId,
    join_time: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO channel_member_history (channel_id, user_id, join_time, leave_time)
         VALUES (?1, ?2, ?3, NULL)",
        params![channel_id.to_string(), user_id.to_string(), join_time],
    )?;
    Ok(())
}
