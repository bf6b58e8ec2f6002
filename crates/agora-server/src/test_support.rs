//! In-memory doubles of the membership ports, recording every call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use agora_shared::error::AppError;
use agora_shared::events::BroadcastEvent;
use agora_shared::types::{ChannelId, TeamId, UserId};
use agora_store::{Channel, ChannelMember, ChannelType, User};

use crate::membership::BatchMembershipService;
use crate::ports::{
    CacheInvalidator, ChannelLookup, MembershipStore, NotificationPublisher, PortError,
    UserDirectory,
};

/// All doubles wired together.
pub(crate) struct Harness {
    pub channels: Arc<FakeChannels>,
    pub users: Arc<FakeUsers>,
    pub store: Arc<FakeStore>,
    pub cache: Arc<RecordingCache>,
    pub publisher: Arc<RecordingPublisher>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(FakeChannels::default()),
            users: Arc::new(FakeUsers::default()),
            store: Arc::new(FakeStore::default()),
            cache: Arc::new(RecordingCache::default()),
            publisher: Arc::new(RecordingPublisher::default()),
        }
    }

    pub fn service(&self) -> BatchMembershipService {
        BatchMembershipService::new(
            self.channels.clone(),
            self.users.clone(),
            self.store.clone(),
            self.cache.clone(),
            self.publisher.clone(),
        )
    }

    pub fn add_user(&self, user: User) -> User {
        self.users.users.lock().unwrap().insert(user.id, user.clone());
        user
    }

    /// Open channels of `team`, registered with the channel lookup.
    pub fn team_channels(&self, team: TeamId, names: &[&str]) -> Vec<Channel> {
        let channels: Vec<Channel> = names
            .iter()
            .map(|name| Channel::new(team, *name, ChannelType::Open))
            .collect();
        self.channels
            .channels
            .lock()
            .unwrap()
            .extend(channels.iter().cloned());
        channels
    }
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct FakeChannels {
    channels: Mutex<Vec<Channel>>,
    failure: Mutex<Option<String>>,
    lookups: AtomicUsize,
}

impl FakeChannels {
    pub fn fail(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl ChannelLookup for FakeChannels {
    fn channels_by_ids(&self, ids: &[ChannelId]) -> Result<Vec<Channel>, PortError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(PortError::Internal(message));
        }
        Ok(self
            .channels
            .lock()
            .unwrap()
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct FakeUsers {
    users: Mutex<HashMap<UserId, User>>,
    lookups: AtomicUsize,
}

impl FakeUsers {
    pub fn not_found(&self, id: UserId) -> AppError {
        AppError::NotFound {
            op: "get_user",
            what: format!("user {id}"),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl UserDirectory for FakeUsers {
    fn get_user(&self, id: UserId) -> Result<User, AppError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.users
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| self.not_found(id))
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Find(ChannelId),
    Insert(ChannelId),
    Delete(ChannelId),
    LogLeave(ChannelId),
}

#[derive(Default)]
pub(crate) struct FakeStore {
    members: Mutex<HashMap<(ChannelId, UserId), ChannelMember>>,
    calls: Mutex<Vec<Call>>,
    lookup_failure: Mutex<Option<(ChannelId, String)>>,
    insert_failure: Mutex<Option<String>>,
    delete_failure: Mutex<Option<String>>,
    leave_failure: Mutex<Option<String>>,
}

impl FakeStore {
    pub fn seed(&self, member: ChannelMember) {
        self.members
            .lock()
            .unwrap()
            .insert((member.channel_id, member.user_id), member);
    }

    pub fn member(&self, channel_id: ChannelId, user_id: UserId) -> Option<ChannelMember> {
        self.members.lock().unwrap().get(&(channel_id, user_id)).cloned()
    }

    /// Mutating calls in call order. Membership lookups are left out.
    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| !matches!(c, Call::Find(_)))
            .cloned()
            .collect()
    }

    pub fn inserts(&self) -> Vec<ChannelId> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                Call::Insert(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn fail_lookup_for(&self, channel_id: ChannelId, message: &str) {
        *self.lookup_failure.lock().unwrap() = Some((channel_id, message.to_string()));
    }

    pub fn fail_insert(&self, message: &str) {
        *self.insert_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_delete(&self, message: &str) {
        *self.delete_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_leave_log(&self, message: &str) {
        *self.leave_failure.lock().unwrap() = Some(message.to_string());
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl MembershipStore for FakeStore {
    fn find_membership(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> Result<ChannelMember, PortError> {
        self.record(Call::Find(channel_id));
        if let Some((failing, message)) = self.lookup_failure.lock().unwrap().clone() {
            if failing == channel_id {
                return Err(PortError::Internal(message));
            }
        }
        self.member(channel_id, user_id).ok_or(PortError::NotFound)
    }

    fn insert_membership(&self, user: &User, channel: &Channel) -> Result<ChannelMember, PortError> {
        self.record(Call::Insert(channel.id));
        if let Some(message) = self.insert_failure.lock().unwrap().clone() {
            return Err(PortError::Internal(message));
        }
        let member = ChannelMember::for_user(user, channel);
        self.seed(member.clone());
        Ok(member)
    }

    fn delete_membership(&self, channel_id: ChannelId, user_id: UserId) -> Result<(), PortError> {
        self.record(Call::Delete(channel_id));
        if let Some(message) = self.delete_failure.lock().unwrap().clone() {
            return Err(PortError::Internal(message));
        }
        self.members.lock().unwrap().remove(&(channel_id, user_id));
        Ok(())
    }

    fn log_leave_event(
        &self,
        _user_id: UserId,
        channel_id: ChannelId,
        _timestamp_millis: i64,
    ) -> Result<(), PortError> {
        self.record(Call::LogLeave(channel_id));
        match self.leave_failure.lock().unwrap().clone() {
            Some(message) => Err(PortError::Internal(message)),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Cache and publisher
// ---------------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct RecordingCache {
    users: Mutex<Vec<UserId>>,
    channels: Mutex<Vec<ChannelId>>,
}

impl RecordingCache {
    pub fn users(&self) -> Vec<UserId> {
        self.users.lock().unwrap().clone()
    }

    pub fn channels(&self) -> Vec<ChannelId> {
        self.channels.lock().unwrap().clone()
    }
}

impl CacheInvalidator for RecordingCache {
    fn invalidate_user(&self, user_id: UserId) {
        self.users.lock().unwrap().push(user_id);
    }

    fn invalidate_channel_members(&self, channel_id: ChannelId) {
        self.channels.lock().unwrap().push(channel_id);
    }
}

#[derive(Default)]
pub(crate) struct RecordingPublisher {
    events: Mutex<Vec<BroadcastEvent>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<BroadcastEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl NotificationPublisher for RecordingPublisher {
    fn publish(&self, event: BroadcastEvent) {
        self.events.lock().unwrap().push(event);
    }
}
