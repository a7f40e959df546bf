mod atomic_io;
mod persist;

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::catalog::{ItemCategory, ItemId};
use crate::level::MAX_LEVEL_PROGRESS;

pub use persist::{load_profile, save_profile};

pub const PROFILE_VERSION: u32 = 1;

/// Persisted player state. This is the single source of truth for ownership,
/// equipped items and progression; shop entry state is derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileData {
    pub profile_version: u32,
    #[serde(default)]
    pub owned_item_ids: BTreeSet<ItemId>,
    #[serde(default)]
    pub active_items: BTreeMap<ItemCategory, ItemId>,
    #[serde(default)]
    pub level_progress: i64,
}

impl Default for ProfileData {
    fn default() -> Self {
        Self {
            profile_version: PROFILE_VERSION,
            owned_item_ids: BTreeSet::new(),
            active_items: BTreeMap::new(),
            level_progress: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileEvent {
    Loaded,
    ItemAdded(ItemId),
    ActiveItemChanged {
        item_id: ItemId,
        category: ItemCategory,
    },
    LevelProgressChanged {
        level_progress: i64,
    },
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read profile {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write profile {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode profile json: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("parse profile {path} at {field_path}: {message}")]
    Parse {
        path: PathBuf,
        field_path: String,
        message: String,
    },
    #[error("invalid profile {path}: {message}")]
    Invalid { path: PathBuf, message: String },
    #[error("subscriber '{name}' is already subscribed to the profile")]
    AlreadySubscribed { name: String },
    #[error("item {id} is not owned and cannot be made active")]
    NotOwned { id: ItemId },
    #[error("level progress {level_progress} cannot advance past {MAX_LEVEL_PROGRESS}")]
    ProgressOutOfRange { level_progress: i64 },
}

/// Scoped subscription to profile events. Not cloneable; hand it back to
/// [`ProfileStore::unsubscribe`] to release the queue.
#[derive(Debug)]
pub struct Subscription {
    token: u64,
    name: String,
}

impl Subscription {
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug)]
struct SubscriberQueue {
    token: u64,
    name: String,
    events: VecDeque<ProfileEvent>,
}

#[derive(Debug, Default)]
pub struct ProfileStore {
    data: ProfileData,
    subscribers: Vec<SubscriberQueue>,
    next_token: u64,
}

impl ProfileStore {
    pub fn new(data: ProfileData) -> Self {
        Self {
            data,
            subscribers: Vec::new(),
            next_token: 0,
        }
    }

    pub fn data(&self) -> &ProfileData {
        &self.data
    }

    pub fn owned_item_ids(&self) -> &BTreeSet<ItemId> {
        &self.data.owned_item_ids
    }

    pub fn owns(&self, id: ItemId) -> bool {
        self.data.owned_item_ids.contains(&id)
    }

    pub fn active_item(&self, category: ItemCategory) -> Option<ItemId> {
        self.data.active_items.get(&category).copied()
    }

    pub fn level_progress(&self) -> i64 {
        self.data.level_progress
    }

    pub fn subscribe(&mut self, name: impl Into<String>) -> Result<Subscription, ProfileError> {
        let name = name.into();
        if self.subscribers.iter().any(|queue| queue.name == name) {
            error!(subscriber = %name, "profile_duplicate_subscription");
            return Err(ProfileError::AlreadySubscribed { name });
        }
        let token = self.next_token;
        self.next_token += 1;
        self.subscribers.push(SubscriberQueue {
            token,
            name: name.clone(),
            events: VecDeque::new(),
        });
        debug!(subscriber = %name, "profile_subscribed");
        Ok(Subscription { token, name })
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) {
        self.subscribers.retain(|queue| queue.token != subscription.token);
        debug!(subscriber = %subscription.name, "profile_unsubscribed");
    }

    pub fn poll(&mut self, subscription: &Subscription) -> Option<ProfileEvent> {
        self.subscribers
            .iter_mut()
            .find(|queue| queue.token == subscription.token)
            .and_then(|queue| queue.events.pop_front())
    }

    pub fn pending(&self, subscription: &Subscription) -> usize {
        self.subscribers
            .iter()
            .find(|queue| queue.token == subscription.token)
            .map_or(0, |queue| queue.events.len())
    }

    /// Replaces the whole profile, e.g. after reading it from disk.
    pub fn load(&mut self, data: ProfileData) {
        self.data = data;
        self.publish(ProfileEvent::Loaded);
    }

    /// Records ownership. Returns `false` without raising an event when the
    /// item was already owned.
    pub fn add_item(&mut self, id: ItemId) -> bool {
        if !self.data.owned_item_ids.insert(id) {
            return false;
        }
        self.publish(ProfileEvent::ItemAdded(id));
        true
    }

    /// Equips an owned item. Returns `Ok(false)` when it already was the
    /// active item of its category.
    pub fn set_active_item(
        &mut self,
        item_id: ItemId,
        category: ItemCategory,
    ) -> Result<bool, ProfileError> {
        if !self.owns(item_id) {
            return Err(ProfileError::NotOwned { id: item_id });
        }
        if self.data.active_items.insert(category, item_id) == Some(item_id) {
            return Ok(false);
        }
        self.publish(ProfileEvent::ActiveItemChanged { item_id, category });
        Ok(true)
    }

    /// Advances progress by one level. Fails without raising an event when
    /// the result would leave `0..=MAX_LEVEL_PROGRESS`.
    pub fn complete_level(&mut self) -> Result<i64, ProfileError> {
        let current = self.data.level_progress;
        let level_progress = current
            .checked_add(1)
            .filter(|next| (0..=MAX_LEVEL_PROGRESS).contains(next))
            .ok_or(ProfileError::ProgressOutOfRange {
                level_progress: current,
            })?;
        self.data.level_progress = level_progress;
        self.publish(ProfileEvent::LevelProgressChanged { level_progress });
        Ok(level_progress)
    }

    fn publish(&mut self, event: ProfileEvent) {
        for queue in &mut self.subscribers {
            queue.events.push_back(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(ids: &[u32]) -> ProfileData {
        ProfileData {
            owned_item_ids: ids.iter().map(|id| ItemId(*id)).collect(),
            ..ProfileData::default()
        }
    }

    #[test]
    fn duplicate_subscription_is_rejected() {
        let mut store = ProfileStore::default();
        let _shop = store.subscribe("shop").expect("first");
        let err = store.subscribe("shop").expect_err("second");
        assert!(matches!(err, ProfileError::AlreadySubscribed { name } if name == "shop"));
    }

    #[test]
    fn resubscribe_after_release_is_allowed() {
        let mut store = ProfileStore::default();
        let shop = store.subscribe("shop").expect("first");
        store.unsubscribe(shop);
        assert!(store.subscribe("shop").is_ok());
    }

    #[test]
    fn events_arrive_in_commit_order_per_subscriber() {
        let mut store = ProfileStore::new(owned(&[1]));
        let shop = store.subscribe("shop").expect("shop");
        let stage = store.subscribe("stage").expect("stage");

        assert!(store.add_item(ItemId(2)));
        store
            .set_active_item(ItemId(2), ItemCategory::Skin)
            .expect("activate");
        store.complete_level().expect("complete");

        assert_eq!(store.poll(&shop), Some(ProfileEvent::ItemAdded(ItemId(2))));
        assert_eq!(
            store.poll(&shop),
            Some(ProfileEvent::ActiveItemChanged {
                item_id: ItemId(2),
                category: ItemCategory::Skin
            })
        );
        assert_eq!(
            store.poll(&shop),
            Some(ProfileEvent::LevelProgressChanged { level_progress: 1 })
        );
        assert_eq!(store.poll(&shop), None);
        assert_eq!(store.pending(&stage), 3);
    }

    #[test]
    fn unchanged_mutations_raise_nothing() {
        let mut store = ProfileStore::new(owned(&[1]));
        let shop = store.subscribe("shop").expect("shop");

        assert!(!store.add_item(ItemId(1)));
        assert!(store
            .set_active_item(ItemId(1), ItemCategory::Skin)
            .expect("first"));
        assert!(!store
            .set_active_item(ItemId(1), ItemCategory::Skin)
            .expect("second"));
        assert_eq!(store.pending(&shop), 1);
    }

    #[test]
    fn unowned_item_cannot_be_activated() {
        let mut store = ProfileStore::default();
        let err = store
            .set_active_item(ItemId(4), ItemCategory::Weapon)
            .expect_err("not owned");
        assert!(matches!(err, ProfileError::NotOwned { id } if id == ItemId(4)));
        assert_eq!(store.active_item(ItemCategory::Weapon), None);
    }

    #[test]
    fn completing_past_last_level_is_rejected() {
        for level_progress in [MAX_LEVEL_PROGRESS, i64::MAX] {
            let mut store = ProfileStore::new(ProfileData {
                level_progress,
                ..ProfileData::default()
            });
            let shop = store.subscribe("shop").expect("shop");
            let err = store.complete_level().expect_err("overflow");
            assert!(matches!(
                err,
                ProfileError::ProgressOutOfRange { level_progress: at } if at == level_progress
            ));
            assert_eq!(store.level_progress(), level_progress);
            assert_eq!(store.pending(&shop), 0);
        }

        let mut store = ProfileStore::new(ProfileData {
            level_progress: MAX_LEVEL_PROGRESS - 1,
            ..ProfileData::default()
        });
        assert_eq!(store.complete_level().expect("last"), MAX_LEVEL_PROGRESS);
    }

    #[test]
    fn load_replaces_data_and_notifies() {
        let mut store = ProfileStore::default();
        let shop = store.subscribe("shop").expect("shop");
        store.load(owned(&[7, 8]));
        assert!(store.owns(ItemId(8)));
        assert_eq!(store.poll(&shop), Some(ProfileEvent::Loaded));
    }
}
