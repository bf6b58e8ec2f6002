//! Read-through cache of channel memberships.
//!
//! Holds every membership of a user and every membership of a channel, keyed
//! by id and loaded on first use. Membership changes drop the affected
//! entries through [`CacheInvalidator`].

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};

use agora_shared::types::{ChannelId, UserId};
use agora_store::ChannelMember;
use tracing::trace;

use crate::ports::{CacheInvalidator, MembershipListing, PortError};

type Entries<K> = RwLock<HashMap<K, Arc<Vec<ChannelMember>>>>;

pub struct MembershipCache {
    source: Arc<dyn MembershipListing>,
    by_user: Entries<UserId>,
    by_channel: Entries<ChannelId>,
}

impl MembershipCache {
    pub fn new(source: Arc<dyn MembershipListing>) -> Self {
        Self {
            source,
            by_user: RwLock::new(HashMap::new()),
            by_channel: RwLock::new(HashMap::new()),
        }
    }

    /// Every membership held by `user_id`.
    pub fn members_for_user(&self, user_id: UserId) -> Result<Arc<Vec<ChannelMember>>, PortError> {
        read_through(&self.by_user, user_id, || self.source.members_for_user(user_id))
    }

    /// Every membership of `channel_id`.
    pub fn members_for_channel(
        &self,
        channel_id: ChannelId,
    ) -> Result<Arc<Vec<ChannelMember>>, PortError> {
        read_through(&self.by_channel, channel_id, || {
            self.source.members_for_channel(channel_id)
        })
    }
}

impl CacheInvalidator for MembershipCache {
    fn invalidate_user(&self, user_id: UserId) {
        self.by_user
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&user_id);
        trace!(user_id = %user_id, "user membership cache invalidated");
    }

    fn invalidate_channel_members(&self, channel_id: ChannelId) {
        self.by_channel
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&channel_id);
        trace!(channel_id = %channel_id, "channel member cache invalidated");
    }
}

fn read_through<K, F>(entries: &Entries<K>, key: K, load: F) -> Result<Arc<Vec<ChannelMember>>, PortError>
where
    K: Eq + Hash + Copy + std::fmt::Display,
    F: FnOnce() -> Result<Vec<ChannelMember>, PortError>,
{
    if let Some(hit) = entries
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        trace!(key = %key, "membership cache hit");
        return Ok(hit.clone());
    }

    trace!(key = %key, "membership cache miss");
    let loaded = Arc::new(load()?);
    entries
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(key, loaded.clone());
    Ok(loaded)
}
