//! Events pushed to connected clients.
//!
//! Internally the server speaks in [`MembershipEvent`]s. At the boundary they
//! are translated to the [`BroadcastEvent`] wire shape that existing clients
//! already understand.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::EVENT_USER_REMOVED;
use crate::types::{TeamId, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipEvent {
    /// A user's channel memberships inside a team changed (added or removed).
    Changed { team_id: TeamId, user_id: UserId },
}

impl MembershipEvent {
    /// Translate to the wire event.
    ///
    /// Clients only refresh membership state on `user_removed`, so both adds
    /// and removals go out under that name with an empty channel scope.
    pub fn into_broadcast(self) -> BroadcastEvent {
        match self {
            MembershipEvent::Changed { team_id, user_id } => {
                let mut data = Map::new();
                data.insert("user_id".into(), Value::String(user_id.to_string()));
                data.insert("team_id".into(), Value::String(team_id.to_string()));
                BroadcastEvent {
                    event: EVENT_USER_REMOVED.to_string(),
                    team_id: team_id.to_string(),
                    channel_id: String::new(),
                    user_id: user_id.to_string(),
                    data,
                }
            }
        }
    }
}

/// An event as delivered to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BroadcastEvent {
    pub event: String,
    pub team_id: String,
    /// Empty when the event is not scoped to a single channel.
    pub channel_id: String,
    pub user_id: String,
    pub data: Map<String, Value>,
}
