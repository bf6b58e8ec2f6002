//! CRUD operations for [`Channel`] records.

use agora_shared::types::{ChannelId, TeamId};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter};

use crate::database::{timestamp_column, uuid_column, Database};
use crate::error::{Result, StoreError};
use crate::models::{Channel, ChannelType};

const CHANNEL_COLUMNS: &str = "id, team_id, name, display_name, type, created_at, deleted_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new channel.
    pub fn create_channel(&self, channel: &Channel) -> Result<()> {
        self.conn().execute(
            "INSERT INTO channels (id, team_id, name, display_name, type, created_at, deleted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                channel.id.to_string(),
                channel.team_id.to_string(),
                channel.name,
                channel.display_name,
                channel.channel_type.as_code(),
                channel.created_at.to_rfc3339(),
                channel.deleted_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single channel by id.
    pub fn get_channel(&self, id: ChannelId) -> Result<Channel> {
        self.conn()
            .query_row(
                &format!("SELECT {CHANNEL_COLUMNS} FROM channels WHERE id = ?1"),
                params![id.to_string()],
                row_to_channel,
            )
            .map_err(StoreError::from_query)
    }

    /// Fetch every channel whose id is in `ids`. Unknown ids are skipped, and
    /// the result is ordered by team then name rather than by input order.
    pub fn get_channels_by_ids(&self, ids: &[ChannelId]) -> Result<Vec<Channel>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {CHANNEL_COLUMNS}
             FROM channels
             WHERE id IN ({placeholders})
             ORDER BY team_id ASC, name ASC"
        ))?;

        let rows = stmt.query_map(
            params_from_iter(ids.iter().map(|id| id.to_string())),
            row_to_channel,
        )?;

        let mut channels = Vec::new();
        for row in rows {
            channels.push(row?);
        }
        Ok(channels)
    }

    /// List the channels of a team, ordered by name.
    pub fn list_channels_for_team(&self, team_id: TeamId) -> Result<Vec<Channel>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {CHANNEL_COLUMNS}
             FROM channels
             WHERE team_id = ?1
             ORDER BY name ASC"
        ))?;

        let rows = stmt.query_map(params![team_id.to_string()], row_to_channel)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Mark a channel archived.  Returns `true` if the channel existed and
    /// was not archived yet.
    pub fn archive_channel(&self, id: ChannelId, at: DateTime<Utc>) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE channels SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
            params![at.to_rfc3339(), id.to_string()],
        )?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`Channel`].
fn row_to_channel(row: &rusqlite::Row<'_>) -> rusqlite::Result<Channel> {
    let id_str: String = row.get(0)?;
    let team_str: String = row.get(1)?;
    let type_code: String = row.get(4)?;
    let created_str: String = row.get(5)?;
    let deleted_str: Option<String> = row.get(6)?;

    let channel_type = ChannelType::from_code(&type_code).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown channel type {type_code:?}").into(),
        )
    })?;

    let deleted_at = deleted_str
        .map(|s| timestamp_column(6, &s))
        .transpose()?;

    Ok(Channel {
        id: ChannelId(uuid_column(0, &id_str)?),
        team_id: TeamId(uuid_column(1, &team_str)?),
        name: row.get(2)?,
        display_name: row.get(3)?,
        channel_type,
        created_at: timestamp_column(5, &created_str)?,
        deleted_at,
    })
}
