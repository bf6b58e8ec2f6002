//! Batch channel membership changes for a single user.
//!
//! [`BatchMembershipService`] adds a user to, or removes a user from, a list of
//! channels in one call. Every channel is processed in order and the first
//! failure aborts the rest of the batch. Channels handled before the failure
//! keep their new state; nothing is rolled back. A successful batch publishes
//! exactly one membership event, whatever its size.

use std::sync::Arc;

use agora_shared::constants::DEFAULT_CHANNEL_NAME;
use agora_shared::error::AppError;
use agora_shared::events::MembershipEvent;
use agora_shared::types::{ChannelId, UserId};
use agora_store::{Channel, ChannelMember, ChannelType, User};
use chrono::Utc;
use tracing::{debug, info};

use crate::ports::{
    CacheInvalidator, ChannelLookup, MembershipStore, NotificationPublisher, PortError,
    UserDirectory,
};

pub struct BatchMembershipService {
    channels: Arc<dyn ChannelLookup>,
    users: Arc<dyn UserDirectory>,
    store: Arc<dyn MembershipStore>,
    cache: Arc<dyn CacheInvalidator>,
    publisher: Arc<dyn NotificationPublisher>,
}

impl BatchMembershipService {
    pub fn new(
        channels: Arc<dyn ChannelLookup>,
        users: Arc<dyn UserDirectory>,
        store: Arc<dyn MembershipStore>,
        cache: Arc<dyn CacheInvalidator>,
        publisher: Arc<dyn NotificationPublisher>,
    ) -> Self {
        Self {
            channels,
            users,
            store,
            cache,
            publisher,
        }
    }

    /// Resolve channel ids to channel records.
    pub fn channels_by_id(&self, ids: &[ChannelId]) -> Result<Vec<Channel>, AppError> {
        self.channels
            .channels_by_ids(ids)
            .map_err(|e| AppError::internal("channels_by_id", "get_channels_by_ids", e))
    }

    /// Make `user_id` a member of every channel in `channels`.
    ///
    /// Channels the user already belongs to are left alone and their existing
    /// membership is returned. The result holds one membership per channel, in
    /// the order of `channels`.
    pub fn batch_add_channel_member(
        &self,
        user_id: UserId,
        channels: &[Channel],
    ) -> Result<Vec<ChannelMember>, AppError> {
        let Some(first) = channels.first() else {
            debug!(user_id = %user_id, "empty channel batch, nothing to add");
            return Ok(Vec::new());
        };

        let user = self.users.get_user(user_id)?;

        let mut members = Vec::with_capacity(channels.len());
        for channel in channels {
            match self.store.find_membership(channel.id, user.id) {
                Ok(existing) => {
                    debug!(user_id = %user.id, channel_id = %channel.id, "already a member");
                    members.push(existing);
                }
                Err(PortError::NotFound) => {
                    members.push(self.add_user_to_channel(&user, channel)?);
                }
                Err(e) => {
                    return Err(AppError::internal(
                        "batch_add_channel_member",
                        "get_member",
                        e,
                    ));
                }
            }
        }

        self.publish_membership_changed(&user, first);

        info!(
            user_id = %user.id,
            team_id = %first.team_id,
            count = members.len(),
            "batch added channel members"
        );
        Ok(members)
    }

    /// Remove `user_id` from every channel in `channels`.
    pub fn batch_delete_channel_member(
        &self,
        user_id: UserId,
        channels: &[Channel],
    ) -> Result<(), AppError> {
        let Some(first) = channels.first() else {
            debug!(user_id = %user_id, "empty channel batch, nothing to remove");
            return Ok(());
        };

        let user = self.users.get_user(user_id)?;

        for channel in channels {
            self.delete_channel_member(&user, channel)?;
        }

        self.publish_membership_changed(&user, first);

        info!(
            user_id = %user.id,
            team_id = %first.team_id,
            count = channels.len(),
            "batch removed channel members"
        );
        Ok(())
    }

    /// Create a membership and run the side effects of joining a channel.
    fn add_user_to_channel(&self, user: &User, channel: &Channel) -> Result<ChannelMember, AppError> {
        const OP: &str = "add_user_to_channel";

        if channel.is_archived() {
            return Err(AppError::ChannelArchived {
                op: OP,
                channel_id: channel.id.to_string(),
            });
        }
        if !matches!(channel.channel_type, ChannelType::Open | ChannelType::Private) {
            return Err(AppError::UnsupportedChannelType {
                op: OP,
                channel_id: channel.id.to_string(),
            });
        }

        let member = self
            .store
            .insert_membership(user, channel)
            .map_err(|e| AppError::internal(OP, "save_member", e))?;

        self.cache.invalidate_user(user.id);
        self.cache.invalidate_channel_members(channel.id);

        debug!(user_id = %user.id, channel_id = %channel.id, "added channel member");
        Ok(member)
    }

    /// Remove a single membership. Only guests may leave the default channel.
    fn delete_channel_member(&self, user: &User, channel: &Channel) -> Result<(), AppError> {
        const OP: &str = "delete_channel_member";

        if channel.name == DEFAULT_CHANNEL_NAME && !user.is_guest() {
            return Err(AppError::DefaultChannel {
                op: OP,
                channel: DEFAULT_CHANNEL_NAME.to_string(),
            });
        }

        self.store
            .delete_membership(channel.id, user.id)
            .map_err(|e| AppError::internal(OP, "remove_member", e))?;
        self.store
            .log_leave_event(user.id, channel.id, Utc::now().timestamp_millis())
            .map_err(|e| AppError::internal(OP, "log_leave_event", e))?;

        self.cache.invalidate_user(user.id);
        self.cache.invalidate_channel_members(channel.id);

        debug!(user_id = %user.id, channel_id = %channel.id, "removed channel member");
        Ok(())
    }

    /// The whole batch is scoped to the team of its first channel.
    fn publish_membership_changed(&self, user: &User, first: &Channel) {
        let event = MembershipEvent::Changed {
            team_id: first.team_id,
            user_id: user.id,
        };
        self.publisher.publish(event.into_broadcast());
    }
}
