//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the HTTP layer.

use agora_shared::constants::{SYSTEM_GUEST_ROLE, SYSTEM_USER_ROLE};
use agora_shared::types::{ChannelId, TeamId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A user account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Space separated system role names, e.g. `"system_user"`.
    pub roles: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a regular (non-guest) account.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            roles: SYSTEM_USER_ROLE.to_string(),
            created_at: Utc::now(),
        }
    }

    /// Build a guest account.
    pub fn new_guest(username: impl Into<String>) -> Self {
        Self {
            roles: SYSTEM_GUEST_ROLE.to_string(),
            ..Self::new(username)
        }
    }

    pub fn is_guest(&self) -> bool {
        self.roles.split_whitespace().any(|r| r == SYSTEM_GUEST_ROLE)
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChannelType {
    Open,
    Private,
    Direct,
    Group,
}

impl ChannelType {
    pub fn as_code(self) -> &'static str {
        match self {
            ChannelType::Open => "O",
            ChannelType::Private => "P",
            ChannelType::Direct => "D",
            ChannelType::Group => "G",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "O" => Some(Self::Open),
            "P" => Some(Self::Private),
            "D" => Some(Self::Direct),
            "G" => Some(Self::Group),
            _ => None,
        }
    }
}

/// A channel inside a team.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Channel {
    pub id: ChannelId,
    pub team_id: TeamId,
    /// URL-safe handle, unique per team.
    pub name: String,
    pub display_name: String,
    pub channel_type: ChannelType,
    pub created_at: DateTime<Utc>,
    /// Set once the channel is archived.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Channel {
    pub fn new(team_id: TeamId, name: impl Into<String>, channel_type: ChannelType) -> Self {
        let name = name.into();
        Self {
            id: ChannelId::new(),
            team_id,
            display_name: name.clone(),
            name,
            channel_type,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    pub fn is_archived(&self) -> bool {
        self.deleted_at.is_some()
    }
}

// ---------------------------------------------------------------------------
// ChannelMember
// ---------------------------------------------------------------------------

/// Join record between a user and a channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelMember {
    pub channel_id: ChannelId,
    pub user_id: UserId,
    /// Explicit (non-scheme) roles.
    pub roles: String,
    pub scheme_guest: bool,
    pub scheme_user: bool,
    pub scheme_admin: bool,
    pub msg_count: i64,
    pub mention_count: i64,
    /// Milliseconds since the epoch.
    pub last_viewed_at: i64,
    /// Milliseconds since the epoch.
    pub last_update_at: i64,
}

impl ChannelMember {
    /// A fresh membership for `user` in `channel`. Guests get the guest
    /// scheme role, everyone else the user scheme role.
    pub fn for_user(user: &User, channel: &Channel) -> Self {
        let guest = user.is_guest();
        Self {
            channel_id: channel.id,
            user_id: user.id,
            roles: String::new(),
            scheme_guest: guest,
            scheme_user: !guest,
            scheme_admin: false,
            msg_count: 0,
            mention_count: 0,
            last_viewed_at: 0,
            last_update_at: Utc::now().timestamp_millis(),
        }
    }
}

// ---------------------------------------------------------------------------
// ChannelMemberHistory
// ---------------------------------------------------------------------------

/// One join/leave interval of a user in a channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelMemberHistory {
    pub channel_id: ChannelId,
    pub user_id: UserId,
    /// Milliseconds since the epoch.
    pub join_time: i64,
    /// Milliseconds since the epoch, `None` while still a member.
    pub leave_time: Option<i64>,
}
