//! Collaborator interfaces consumed by the membership service.
//!
//! Each port is injected into [`BatchMembershipService`] as an
//! `Arc<dyn Port>` when it is built. Store-facing ports report failures as a
//! [`PortError`] so callers can match on "not found" instead of inspecting
//! error types at runtime.
//!
//! [`BatchMembershipService`]: crate::membership::BatchMembershipService

use agora_shared::error::AppError;
use agora_shared::events::BroadcastEvent;
use agora_shared::types::{ChannelId, UserId};
use agora_store::{Channel, ChannelMember, StoreError, User};
use thiserror::Error;

/// Outcome of a failed store call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PortError {
    #[error("record not found")]
    NotFound,

    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for PortError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => PortError::NotFound,
            other => PortError::Internal(other.to_string()),
        }
    }
}

/// Resolves channel ids to channel records.
pub trait ChannelLookup: Send + Sync {
    /// Order of the returned channels is not tied to the order of `ids`.
    fn channels_by_ids(&self, ids: &[ChannelId]) -> Result<Vec<Channel>, PortError>;
}

/// Resolves user ids to user records.
pub trait UserDirectory: Send + Sync {
    fn get_user(&self, id: UserId) -> Result<User, AppError>;
}

/// Persistence for channel memberships and the member history log.
pub trait MembershipStore: Send + Sync {
    fn find_membership(&self, channel_id: ChannelId, user_id: UserId)
        -> Result<ChannelMember, PortError>;

    /// Create the membership of `user` in `channel` and log the join.
    fn insert_membership(&self, user: &User, channel: &Channel) -> Result<ChannelMember, PortError>;

    fn delete_membership(&self, channel_id: ChannelId, user_id: UserId) -> Result<(), PortError>;

    fn log_leave_event(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
        timestamp_millis: i64,
    ) -> Result<(), PortError>;
}

/// Read side used to fill the membership caches.
pub trait MembershipListing: Send + Sync {
    fn members_for_channel(&self, channel_id: ChannelId) -> Result<Vec<ChannelMember>, PortError>;

    fn members_for_user(&self, user_id: UserId) -> Result<Vec<ChannelMember>, PortError>;
}

/// Drops cached membership data.
pub trait CacheInvalidator: Send + Sync {
    fn invalidate_user(&self, user_id: UserId);

    fn invalidate_channel_members(&self, channel_id: ChannelId);
}

/// Delivers events to interested clients. Delivery is at most once and the
/// caller never waits for it.
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, event: BroadcastEvent);
}
