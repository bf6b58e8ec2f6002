//! Ports backed by the SQLite [`Database`].
//!
//! `rusqlite::Connection` is not `Sync`, so the handle sits behind a mutex and
//! every port call holds it for the duration of its statements.

use std::sync::{Mutex, MutexGuard, PoisonError};

use agora_shared::error::AppError;
use agora_shared::types::{ChannelId, UserId};
use agora_store::{Channel, ChannelMember, Database, StoreError, User};

use crate::ports::{ChannelLookup, MembershipListing, MembershipStore, PortError, UserDirectory};

pub struct SqliteBackend {
    db: Mutex<Database>,
}

impl SqliteBackend {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Direct access, used to seed fixtures.
    #[cfg(test)]
    pub fn database(&self) -> MutexGuard<'_, Database> {
        self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChannelLookup for SqliteBackend {
    fn channels_by_ids(&self, ids: &[ChannelId]) -> Result<Vec<Channel>, PortError> {
        Ok(self.lock().get_channels_by_ids(ids)?)
    }
}

impl UserDirectory for SqliteBackend {
    fn get_user(&self, id: UserId) -> Result<User, AppError> {
        self.lock().get_user(id).map_err(|e| match e {
            StoreError::NotFound => AppError::NotFound {
                op: "get_user",
                what: format!("user {id}"),
            },
            other => AppError::internal("get_user", "get_user", other),
        })
    }
}

impl MembershipStore for SqliteBackend {
    fn find_membership(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> Result<ChannelMember, PortError> {
        Ok(self.lock().get_member(channel_id, user_id)?)
    }

    fn insert_membership(&self, user: &User, channel: &Channel) -> Result<ChannelMember, PortError> {
        let member = ChannelMember::for_user(user, channel);
        self.lock()
            .add_member_with_history(&member, member.last_update_at)?;
        Ok(member)
    }

    fn delete_membership(&self, channel_id: ChannelId, user_id: UserId) -> Result<(), PortError> {
        self.lock().remove_member(channel_id, user_id)?;
        Ok(())
    }

    fn log_leave_event(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
        timestamp_millis: i64,
    ) -> Result<(), PortError> {
        Ok(self
            .lock()
            .log_leave_event(user_id, channel_id, timestamp_millis)?)
    }
}

impl MembershipListing for SqliteBackend {
    fn members_for_channel(&self, channel_id: ChannelId) -> Result<Vec<ChannelMember>, PortError> {
        Ok(self.lock().get_members_for_channel(channel_id)?)
    }

    fn members_for_user(&self, user_id: UserId) -> Result<Vec<ChannelMember>, PortError> {
        Ok(self.lock().get_members_for_user(user_id)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use agora_shared::error::ErrorKind;
    use agora_shared::types::TeamId;
    use agora_store::ChannelType;

    use super::*;
    use crate::cache::MembershipCache;
    use crate::hub::EventHub;
    use crate::membership::BatchMembershipService;
    use crate::plugin_api::PluginApi;

    struct Fixture {
        backend: Arc<SqliteBackend>,
        cache: Arc<MembershipCache>,
        hub: EventHub,
        api: PluginApi,
    }

    fn fixture() -> Fixture {
        let backend = Arc::new(SqliteBackend::new(Database::open_in_memory().unwrap()));
        let cache = Arc::new(MembershipCache::new(backend.clone()));
        let hub = EventHub::new(16);
        let service = BatchMembershipService::new(
            backend.clone(),
            backend.clone(),
            backend.clone(),
            cache.clone(),
            Arc::new(hub.clone()),
        );
        Fixture {
            api: PluginApi::new(Arc::new(service)),
            backend,
            cache,
            hub,
        }
    }

    fn seed(f: &Fixture, user: &User, names: &[&str]) -> Vec<Channel> {
        let db = f.backend.database();
        db.create_user(user).unwrap();
        let team = TeamId::new();
        names
            .iter()
            .map(|name| {
                let channel = Channel::new(team, *name, ChannelType::Open);
                db.create_channel(&channel).unwrap();
                channel
            })
            .collect()
    }

    #[test]
    fn test_find_membership_not_found_variant() {
        let f = fixture();
        assert_eq!(
            f.backend.find_membership(ChannelId::new(), UserId::new()),
            Err(PortError::NotFound)
        );
    }

    #[test]
    fn test_unknown_user_is_not_found() {
        let f = fixture();
        let err = f.backend.get_user(UserId::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_batch_round_trip_against_sqlite() {
        let f = fixture();
        let user = User::new("alice");
        let channels = seed(&f, &user, &["town-square", "off-topic", "design"]);
        let ids: Vec<_> = channels.iter().map(|c| c.id).collect();
        let mut rx = f.hub.subscribe();

        // Warm the cache so the batch has something to invalidate.
        assert!(f.cache.members_for_user(user.id).unwrap().is_empty());

        let members = f.api.batch_add_channel_member(&ids, user.id).unwrap();
        assert_eq!(members.len(), 3);
        assert_eq!(f.cache.members_for_user(user.id).unwrap().len(), 3);
        assert_eq!(rx.try_recv().unwrap().event, "user_removed");

        // Adding again is a no-op that returns the stored rows.
        let again = f.api.batch_add_channel_member(&ids, user.id).unwrap();
        let mut stored: Vec<_> = again.iter().map(|m| m.last_update_at).collect();
        let mut first: Vec<_> = members.iter().map(|m| m.last_update_at).collect();
        stored.sort();
        first.sort();
        assert_eq!(stored, first);
        assert!(rx.try_recv().is_ok());

        let leave: Vec<_> = channels
            .iter()
            .filter(|c| c.name != "town-square")
            .map(|c| c.id)
            .collect();
        f.api.batch_delete_channel_member(&leave, user.id).unwrap();

        let remaining = f.cache.members_for_user(user.id).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].channel_id, channels[0].id);

        let history = f
            .backend
            .database()
            .get_member_history(channels[1].id, user.id)
            .unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].leave_time.is_some());
    }

    #[test]
    fn test_regular_user_cannot_leave_default_channel() {
        let f = fixture();
        let user = User::new("alice");
        let channels = seed(&f, &user, &["town-square"]);
        f.api
            .batch_add_channel_member(&[channels[0].id], user.id)
            .unwrap();

        let err = f
            .api
            .batch_delete_channel_member(&[channels[0].id], user.id)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert!(f
            .backend
            .find_membership(channels[0].id, user.id)
            .is_ok());
    }
}
