use std::collections::{BTreeMap, HashMap};
use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::{ItemCatalog, ItemCategory, ItemDefinition, ItemId};
use crate::profile::ProfileData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemState {
    Locked,
    Unlocked,
    Active,
}

impl ItemState {
    pub fn is_owned(self) -> bool {
        matches!(self, ItemState::Unlocked | ItemState::Active)
    }

    fn allows(self, next: ItemState) -> bool {
        use ItemState::*;
        match (self, next) {
            (from, to) if from == to => true,
            (Locked, Unlocked) | (Unlocked, Active) | (Active, Unlocked) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ItemState::Locked => "locked",
            ItemState::Unlocked => "unlocked",
            ItemState::Active => "active",
        };
        f.write_str(label)
    }
}

/// One catalog item paired with its derived ownership state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopEntry {
    item: ItemDefinition,
    state: ItemState,
}

impl ShopEntry {
    pub fn new(item: ItemDefinition, state: ItemState) -> Self {
        Self { item, state }
    }

    pub fn id(&self) -> ItemId {
        self.item.id
    }

    pub fn category(&self) -> ItemCategory {
        self.item.category
    }

    pub fn item(&self) -> &ItemDefinition {
        &self.item
    }

    pub fn state(&self) -> ItemState {
        self.state
    }
}

/// Committed transition, delivered to observers after the engine state
/// already reflects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemStateChanged {
    pub item_id: ItemId,
    pub category: ItemCategory,
    pub previous: ItemState,
    pub state: ItemState,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemStateError {
    #[error("item {id} was not found")]
    NotFound { id: ItemId },
    #[error("item {id} cannot go from {from} to {to}")]
    InvalidTransition {
        id: ItemId,
        from: ItemState,
        to: ItemState,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("category {category} has {count} active items")]
    MultipleActive { category: ItemCategory, count: usize },
    #[error("item {id} is {state} but not owned by the profile")]
    NotOwned { id: ItemId, state: ItemState },
    #[error("item {id} is active but the profile equips {equipped:?} for {category}")]
    ActiveMismatch {
        id: ItemId,
        category: ItemCategory,
        equipped: Option<ItemId>,
    },
}

/// Sole owner and mutator of shop entry state.
#[derive(Debug, Default)]
pub struct ItemStateEngine {
    entries: BTreeMap<ItemCategory, Vec<ShopEntry>>,
    locations: HashMap<ItemId, (ItemCategory, usize)>,
    notifications: Vec<ItemStateChanged>,
}

impl ItemStateEngine {
    /// Builds one locked entry per catalog item, grouped per category in
    /// catalog order.
    pub fn new(catalog: &ItemCatalog) -> Self {
        let mut entries = BTreeMap::new();
        let mut locations = HashMap::with_capacity(catalog.len());
        for (category, items) in catalog.all_by_category() {
            let category_entries = items
                .into_iter()
                .enumerate()
                .map(|(idx, def)| {
                    locations.insert(def.id, (category, idx));
                    ShopEntry::new(def.clone(), ItemState::Locked)
                })
                .collect::<Vec<_>>();
            entries.insert(category, category_entries);
        }
        Self {
            entries,
            locations,
            notifications: Vec::new(),
        }
    }

    /// Resets every entry to locked and replays ownership then equipped
    /// items from the profile. Unknown or inconsistent ids are skipped and
    /// returned so the caller can report them.
    pub fn initialize(&mut self, profile: &ProfileData) -> Vec<ItemStateError> {
        for entry in self.entries.values_mut().flatten() {
            entry.state = ItemState::Locked;
        }

        let mut skipped = Vec::new();
        for id in &profile.owned_item_ids {
            if let Err(error) = self.change_state(*id, ItemState::Unlocked) {
                skipped.push(error);
            }
        }
        for (category, id) in &profile.active_items {
            let result = self
                .locate_in(*id, *category)
                .and_then(|_| self.change_state(*id, ItemState::Active));
            if let Err(error) = result {
                warn!(
                    item_id = id.0,
                    category = %category,
                    error = %error,
                    "profile_active_item_skipped"
                );
                skipped.push(error);
            }
        }
        debug!(skipped = skipped.len(), "item_state_engine_initialized");
        skipped
    }

    /// Primitive transition. Re-entering the current state is a silent no-op;
    /// skipping straight from locked to active or relocking is rejected.
    pub fn change_state(
        &mut self,
        id: ItemId,
        new_state: ItemState,
    ) -> Result<Option<ItemStateChanged>, ItemStateError> {
        let (category, idx) = self.locate(id)?;
        let Some(entry) = self
            .entries
            .get_mut(&category)
            .and_then(|items| items.get_mut(idx))
        else {
            return Err(ItemStateError::NotFound { id });
        };
        let previous = entry.state;
        if !previous.allows(new_state) {
            return Err(ItemStateError::InvalidTransition {
                id,
                from: previous,
                to: new_state,
            });
        }
        if previous == new_state {
            return Ok(None);
        }

        entry.state = new_state;
        let change = ItemStateChanged {
            item_id: id,
            category,
            previous,
            state: new_state,
        };
        debug!(
            item_id = id.0,
            category = %category,
            from = %previous,
            to = %new_state,
            "item_state_changed"
        );
        self.notifications.push(change);
        Ok(Some(change))
    }

    /// Makes `id` the only active entry of `category`. The target must
    /// already be unlocked; other active siblings fall back to unlocked and
    /// locked siblings stay locked.
    pub fn activate(
        &mut self,
        id: ItemId,
        category: ItemCategory,
    ) -> Result<Vec<ItemStateChanged>, ItemStateError> {
        self.locate_in(id, category)?;
        let current = self.state(id)?;
        if current == ItemState::Locked {
            return Err(ItemStateError::InvalidTransition {
                id,
                from: current,
                to: ItemState::Active,
            });
        }

        let mut changes = Vec::new();
        changes.extend(self.change_state(id, ItemState::Active)?);
        let demoted = self.entries[&category]
            .iter()
            .filter(|entry| entry.id() != id && entry.state == ItemState::Active)
            .map(ShopEntry::id)
            .collect::<Vec<_>>();
        for sibling in demoted {
            changes.extend(self.change_state(sibling, ItemState::Unlocked)?);
        }
        Ok(changes)
    }

    /// Newly owned items are unlocked and immediately equipped.
    pub fn on_item_acquired(
        &mut self,
        id: ItemId,
    ) -> Result<Vec<ItemStateChanged>, ItemStateError> {
        let category = self.category_of(id)?;
        let mut changes = Vec::new();
        if self.state(id)? == ItemState::Locked {
            changes.extend(self.change_state(id, ItemState::Unlocked)?);
        }
        changes.extend(self.activate(id, category)?);
        Ok(changes)
    }

    pub fn category_of(&self, id: ItemId) -> Result<ItemCategory, ItemStateError> {
        self.locate(id).map(|(category, _)| category)
    }

    pub fn state(&self, id: ItemId) -> Result<ItemState, ItemStateError> {
        self.entry(id)
            .map(ShopEntry::state)
            .ok_or(ItemStateError::NotFound { id })
    }

    pub fn entry(&self, id: ItemId) -> Option<&ShopEntry> {
        let (category, idx) = self.locations.get(&id)?;
        self.entries.get(category).and_then(|items| items.get(*idx))
    }

    /// Entries of one category in catalog order.
    pub fn entries(&self, category: ItemCategory) -> &[ShopEntry] {
        self.entries.get(&category).map_or(&[][..], Vec::as_slice)
    }

    pub fn active_in(&self, category: ItemCategory) -> Option<ItemId> {
        self.entries(category)
            .iter()
            .find(|entry| entry.state == ItemState::Active)
            .map(ShopEntry::id)
    }

    pub fn take_notifications(&mut self) -> Vec<ItemStateChanged> {
        std::mem::take(&mut self.notifications)
    }

    pub fn check_invariants(&self, profile: &ProfileData) -> Result<(), InvariantViolation> {
        for (category, items) in &self.entries {
            let count = items
                .iter()
                .filter(|entry| entry.state == ItemState::Active)
                .count();
            if count > 1 {
                return Err(InvariantViolation::MultipleActive {
                    category: *category,
                    count,
                });
            }
            for entry in items {
                if entry.state.is_owned() && !profile.owned_item_ids.contains(&entry.id()) {
                    return Err(InvariantViolation::NotOwned {
                        id: entry.id(),
                        state: entry.state,
                    });
                }
                let equipped = profile.active_items.get(category).copied();
                if entry.state == ItemState::Active && equipped != Some(entry.id()) {
                    return Err(InvariantViolation::ActiveMismatch {
                        id: entry.id(),
                        category: *category,
                        equipped,
                    });
                }
            }
        }
        Ok(())
    }

    fn locate(&self, id: ItemId) -> Result<(ItemCategory, usize), ItemStateError> {
        self.locations.get(&id).copied().ok_or_else(|| {
            warn!(item_id = id.0, "shop_item_not_found");
            ItemStateError::NotFound { id }
        })
    }

    fn locate_in(&self, id: ItemId, category: ItemCategory) -> Result<usize, ItemStateError> {
        match self.locations.get(&id) {
            Some((found, idx)) if *found == category => Ok(*idx),
            _ => {
                warn!(item_id = id.0, category = %category, "shop_item_not_found");
                Err(ItemStateError::NotFound { id })
            }
        }
    }
}
