//! Membership operations as exposed to plugins.
//!
//! Plugins address channels by id. The adapter resolves them and hands the
//! records to [`BatchMembershipService`].

use std::sync::Arc;

use agora_shared::error::AppError;
use agora_shared::types::{ChannelId, UserId};
use agora_store::ChannelMember;

use crate::membership::BatchMembershipService;

#[derive(Clone)]
pub struct PluginApi {
    service: Arc<BatchMembershipService>,
}

impl PluginApi {
    pub fn new(service: Arc<BatchMembershipService>) -> Self {
        Self { service }
    }

    /// An empty `channel_ids` succeeds immediately with an empty result.
    pub fn batch_add_channel_member(
        &self,
        channel_ids: &[ChannelId],
        user_id: UserId,
    ) -> Result<Vec<ChannelMember>, AppError> {
        if channel_ids.is_empty() {
            return Ok(Vec::new());
        }

        let channels = self.service.channels_by_id(channel_ids)?;
        self.service.batch_add_channel_member(user_id, &channels)
    }

    /// An empty `channel_ids` succeeds immediately.
    pub fn batch_delete_channel_member(
        &self,
        channel_ids: &[ChannelId],
        user_id: UserId,
    ) -> Result<(), AppError> {
        if channel_ids.is_empty() {
            return Ok(());
        }

        let channels = self.service.channels_by_id(channel_ids)?;
        self.service.batch_delete_channel_member(user_id, &channels)
    }
}

#[cfg(test)]
mod tests {
    use agora_shared::error::ErrorKind;
    use agora_shared::types::TeamId;
    use agora_store::User;

    use super::*;
    use crate::test_support::Harness;

    fn api(h: &Harness) -> PluginApi {
        PluginApi::new(Arc::new(h.service()))
    }

    #[test]
    fn test_empty_ids_make_no_calls() {
        let h = Harness::new();
        let api = api(&h);

        assert!(api
            .batch_add_channel_member(&[], UserId::new())
            .unwrap()
            .is_empty());
        api.batch_delete_channel_member(&[], UserId::new()).unwrap();

        assert_eq!(h.channels.lookups(), 0);
        assert_eq!(h.users.lookups(), 0);
        assert!(h.store.calls().is_empty());
        assert!(h.publisher.events().is_empty());
    }

    #[test]
    fn test_add_resolves_ids_then_delegates() {
        let h = Harness::new();
        let user = h.add_user(User::new("alice"));
        let channels = h.team_channels(TeamId::new(), &["a", "b"]);
        let ids: Vec<_> = channels.iter().map(|c| c.id).collect();

        let members = api(&h).batch_add_channel_member(&ids, user.id).unwrap();

        assert_eq!(members.len(), 2);
        assert_eq!(h.channels.lookups(), 1);
        assert_eq!(h.publisher.events().len(), 1);
    }

    #[test]
    fn test_delete_resolves_ids_then_delegates() {
        let h = Harness::new();
        let user = h.add_user(User::new("alice"));
        let channels = h.team_channels(TeamId::new(), &["town-square"]);
        let ids: Vec<_> = channels.iter().map(|c| c.id).collect();

        let err = api(&h).batch_delete_channel_member(&ids, user.id).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(h.channels.lookups(), 1);
    }

    #[test]
    fn test_lookup_failure_is_internal() {
        let h = Harness::new();
        let user = h.add_user(User::new("alice"));
        h.channels.fail("no such table: channels");

        let err = api(&h)
            .batch_add_channel_member(&[ChannelId::new()], user.id)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.to_string().contains("no such table: channels"));
        assert_eq!(h.users.lookups(), 0);
    }
}
