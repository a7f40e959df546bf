//! Immutable registry of every shop item the game knows about.
//!
//! The catalog is built once at startup from loaded content and never
//! mutated afterwards. Insertion order is kept per category because it is the
//! tie-break order for every display ordering.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of item categories. There is no "none" variant: an absent
/// category is `Option<ItemCategory>` and can never be stored on an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemCategory {
    Skin,
    Weapon,
}

impl ItemCategory {
    /// Every category in declaration order, which is also shop tab order.
    pub const ALL: [ItemCategory; 2] = [ItemCategory::Skin, ItemCategory::Weapon];

    pub fn as_str(self) -> &'static str {
        match self {
            ItemCategory::Skin => "Skin",
            ItemCategory::Weapon => "Weapon",
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown item category '{0}'; allowed values: Skin, Weapon")]
pub struct UnknownCategory(pub String);

impl FromStr for ItemCategory {
    type Err = UnknownCategory;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        ItemCategory::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| UnknownCategory(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDefinition {
    pub id: ItemId,
    pub category: ItemCategory,
    /// Opaque handle the presentation layer uses to find the display model.
    pub model_ref: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("duplicate item id {id} in catalog")]
    DuplicateId { id: ItemId },
    #[error("item {id} was not found in catalog")]
    NotFound { id: ItemId },
}

#[derive(Debug, Default, Clone)]
pub struct ItemCatalog {
    items: Vec<ItemDefinition>,
    index_by_id: HashMap<ItemId, usize>,
}

impl ItemCatalog {
    pub fn load(definitions: Vec<ItemDefinition>) -> Result<Self, CatalogError> {
        let mut index_by_id = HashMap::with_capacity(definitions.len());
        for (idx, def) in definitions.iter().enumerate() {
            if index_by_id.insert(def.id, idx).is_some() {
                return Err(CatalogError::DuplicateId { id: def.id });
            }
        }
        Ok(Self {
            items: definitions,
            index_by_id,
        })
    }

    /// Looks an item up, logging a miss. Callers abort only the operation
    /// that referenced the id.
    pub fn lookup(&self, id: ItemId) -> Result<&ItemDefinition, CatalogError> {
        self.get(id).ok_or_else(|| {
            warn!(item_id = id.0, "catalog_item_not_found");
            CatalogError::NotFound { id }
        })
    }

    pub fn get(&self, id: ItemId) -> Option<&ItemDefinition> {
        self.index_by_id.get(&id).map(|idx| &self.items[*idx])
    }

    pub fn category_of(&self, id: ItemId) -> Result<ItemCategory, CatalogError> {
        self.lookup(id).map(|def| def.category)
    }

    /// Catalog position of an item, the global tie-break key.
    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.index_by_id.get(&id).copied()
    }

    pub fn items(&self) -> &[ItemDefinition] {
        &self.items
    }

    pub fn items_in(&self, category: ItemCategory) -> impl Iterator<Item = &ItemDefinition> {
        self.items.iter().filter(move |def| def.category == category)
    }

    /// Every category mapped to its items in insertion order. Categories
    /// without items map to an empty sequence.
    pub fn all_by_category(&self) -> BTreeMap<ItemCategory, Vec<&ItemDefinition>> {
        let mut grouped = ItemCategory::ALL
            .into_iter()
            .map(|category| (category, Vec::new()))
            .collect::<BTreeMap<_, _>>();
        for def in &self.items {
            grouped.entry(def.category).or_default().push(def);
        }
        grouped
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
