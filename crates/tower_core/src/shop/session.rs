use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogError, ItemCatalog, ItemCategory, ItemId};
use crate::profile::{ProfileData, ProfileError, ProfileEvent, ProfileStore, Subscription};

use super::engine::{InvariantViolation, ItemStateChanged, ItemStateEngine, ItemStateError};
use super::order::{default_selection, order_for_display};
use super::ShopEntry;

pub const SHOP_SUBSCRIBER: &str = "shop";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    State(#[from] ItemStateError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// Explicit context that wires the profile store to the item state engine.
///
/// Owns the profile store and the engine, borrows the catalog. Profile
/// mutations only reach the engine through [`ShopSession::pump`], which
/// replays profile events in the order they were committed.
#[derive(Debug)]
pub struct ShopSession<'c> {
    catalog: &'c ItemCatalog,
    profile: ProfileStore,
    engine: ItemStateEngine,
    subscription: Option<Subscription>,
}

impl<'c> ShopSession<'c> {
    pub fn open(
        catalog: &'c ItemCatalog,
        mut profile: ProfileStore,
    ) -> Result<Self, SessionError> {
        let mut engine = ItemStateEngine::new(catalog);
        let skipped = engine.initialize(profile.data());
        let subscription = profile.subscribe(SHOP_SUBSCRIBER)?;
        info!(
            items = catalog.len(),
            skipped_profile_ids = skipped.len(),
            "shop_session_opened"
        );
        Ok(Self {
            catalog,
            profile,
            engine,
            subscription: Some(subscription),
        })
    }

    /// Releases the profile subscription and hands the store back.
    pub fn close(mut self) -> ProfileStore {
        if let Some(subscription) = self.subscription.take() {
            self.profile.unsubscribe(subscription);
        }
        debug!("shop_session_closed");
        self.profile
    }

    pub fn catalog(&self) -> &'c ItemCatalog {
        self.catalog
    }

    pub fn profile(&self) -> &ProfileStore {
        &self.profile
    }

    pub fn engine(&self) -> &ItemStateEngine {
        &self.engine
    }

    /// Applies queued profile events. Stops at the first rejected event,
    /// which is consumed and dropped; later events stay queued for the next
    /// call.
    pub fn pump(&mut self) -> Result<usize, SessionError> {
        let mut applied = 0;
        loop {
            let event = match self.subscription.as_ref() {
                Some(subscription) => self.profile.poll(subscription),
                None => None,
            };
            let Some(event) = event else {
                break;
            };
            self.apply(event)?;
            applied += 1;
        }
        Ok(applied)
    }

    fn apply(&mut self, event: ProfileEvent) -> Result<(), SessionError> {
        match event {
            ProfileEvent::Loaded => {
                let skipped = self.engine.initialize(self.profile.data());
                info!(skipped_profile_ids = skipped.len(), "shop_entries_reloaded");
            }
            ProfileEvent::ItemAdded(id) => {
                self.engine.on_item_acquired(id)?;
                let category = self.engine.category_of(id)?;
                // Keeps the profile's equipped item in line with the entry
                // that just became active.
                self.profile.set_active_item(id, category)?;
            }
            ProfileEvent::ActiveItemChanged { item_id, category } => {
                self.engine.activate(item_id, category)?;
            }
            ProfileEvent::LevelProgressChanged { level_progress } => {
                debug!(level_progress, "shop_ignores_level_progress");
            }
        }
        Ok(())
    }

    /// Grants ownership of an item. Returns `false` when it was already owned.
    pub fn acquire_item(&mut self, id: ItemId) -> Result<bool, SessionError> {
        self.catalog.lookup(id)?;
        let added = self.profile.add_item(id);
        self.pump()?;
        if added {
            info!(item_id = id.0, "item_acquired");
        }
        Ok(added)
    }

    /// Equips an owned item. Locked items are left alone and `false` is
    /// returned; the caller treats them as preview only.
    pub fn select_item(&mut self, id: ItemId) -> Result<bool, SessionError> {
        let category = self.catalog.category_of(id)?;
        if !self.engine.state(id)?.is_owned() {
            debug!(item_id = id.0, "locked_item_selected_for_preview");
            return Ok(false);
        }
        self.profile.set_active_item(id, category)?;
        self.pump()?;
        Ok(true)
    }

    pub fn complete_level(&mut self) -> Result<i64, SessionError> {
        let level_progress = self.profile.complete_level()?;
        self.pump()?;
        Ok(level_progress)
    }

    pub fn reload_profile(&mut self, data: ProfileData) -> Result<(), SessionError> {
        self.profile.load(data);
        self.pump()?;
        Ok(())
    }

    pub fn order_for_display(&self, category: ItemCategory) -> Vec<&ShopEntry> {
        order_for_display(self.engine.entries(category))
    }

    pub fn default_selection(&self, category: ItemCategory) -> usize {
        default_selection(&self.order_for_display(category))
    }

    pub fn take_notifications(&mut self) -> Vec<ItemStateChanged> {
        self.engine.take_notifications()
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let result = self.engine.check_invariants(self.profile.data());
        if let Err(violation) = &result {
            warn!(violation = %violation, "shop_invariant_violated");
        }
        result
    }
}
