//! v001 -- Initial schema creation.
//!
//! Creates `users`, `channels`, `channel_members` and
//! `channel_member_history`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID
    username   TEXT NOT NULL UNIQUE,
    roles      TEXT NOT NULL,                 -- space separated role names
    created_at TEXT NOT NULL                  -- RFC-3339
);

-- ----------------------------------------------------------------
-- Channels
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS channels (
    id           TEXT PRIMARY KEY NOT NULL,   -- UUID
    team_id      TEXT NOT NULL,               -- UUID
    name         TEXT NOT NULL,
    display_name TEXT NOT NULL,
    type         TEXT NOT NULL,               -- O / P / D / G
    created_at   TEXT NOT NULL,
    deleted_at   TEXT,                        -- set once archived

    UNIQUE (team_id, name)
);

CREATE INDEX IF NOT EXISTS idx_channels_team_id ON channels(team_id);

-- ----------------------------------------------------------------
-- Channel members
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS channel_members (
    channel_id     TEXT NOT NULL,
    user_id        TEXT NOT NULL,
    roles          TEXT NOT NULL DEFAULT '',
    scheme_guest   INTEGER NOT NULL DEFAULT 0,
    scheme_user    INTEGER NOT NULL DEFAULT 0,
    scheme_admin   INTEGER NOT NULL DEFAULT 0,
    msg_count      INTEGER NOT NULL DEFAULT 0,
    mention_count  INTEGER NOT NULL DEFAULT 0,
    last_viewed_at INTEGER NOT NULL DEFAULT 0,  -- millis
    last_update_at INTEGER NOT NULL,            -- millis

    PRIMARY KEY (channel_id, user_id),
    FOREIGN KEY (channel_id) REFERENCES channels(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_channel_members_user_id ON channel_members(user_id);

-- ----------------------------------------------------------------
-- Channel member history (join / leave log)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS channel_member_history (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    channel_id TEXT NOT NULL,
    user_id    TEXT NOT NULL,
    join_time  INTEGER NOT NULL,              -- millis
    leave_time INTEGER                        -- millis, NULL while a member
);

CREATE INDEX IF NOT EXISTS idx_channel_member_history_user
    ON channel_member_history(user_id, channel_id);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
