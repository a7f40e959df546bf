use tracing::debug;

use crate::catalog::{ItemCategory, ItemId};

use super::engine::{ItemState, ItemStateError};
use super::session::{SessionError, ShopSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopRow<'s> {
    pub item_id: ItemId,
    pub model_ref: &'s str,
    pub state: ItemState,
    pub selected: bool,
}

/// Presentation model of the shop page: one tab per category, a sorted slot
/// list for the open tab, the selected slot and the previewed item.
///
/// Slot order is computed when a tab opens and kept until the next tab
/// change, so equipping an item does not reshuffle the list under the
/// cursor. Row states are always read live from the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopView {
    category: ItemCategory,
    order: Vec<ItemId>,
    selected: usize,
    preview: Option<ItemId>,
}

impl ShopView {
    pub fn open(session: &ShopSession<'_>) -> Self {
        let mut view = Self {
            category: ItemCategory::ALL[0],
            order: Vec::new(),
            selected: 0,
            preview: None,
        };
        view.refresh(session);
        view
    }

    pub fn tabs() -> &'static [ItemCategory] {
        &ItemCategory::ALL
    }

    pub fn category(&self) -> ItemCategory {
        self.category
    }

    pub fn selected_item(&self) -> Option<ItemId> {
        self.order.get(self.selected).copied()
    }

    pub fn preview(&self) -> Option<ItemId> {
        self.preview
    }

    pub fn change_tab(&mut self, session: &ShopSession<'_>, category: ItemCategory) {
        self.category = category;
        self.refresh(session);
    }

    /// Resorts the open tab and moves the selection to its default slot.
    pub fn refresh(&mut self, session: &ShopSession<'_>) {
        self.order = session
            .order_for_display(self.category)
            .iter()
            .map(|entry| entry.id())
            .collect();
        self.selected = session.default_selection(self.category);
        self.preview = self.selected_item();
        debug!(
            category = %self.category,
            slots = self.order.len(),
            selected = ?self.preview,
            "shop_tab_shown"
        );
    }

    /// Selects a slot of the open tab. Owned items get equipped; locked ones
    /// are only previewed. Returns whether the item was equipped.
    pub fn select(
        &mut self,
        session: &mut ShopSession<'_>,
        id: ItemId,
    ) -> Result<bool, SessionError> {
        let Some(position) = self.order.iter().position(|slot| *slot == id) else {
            return Err(ItemStateError::NotFound { id }.into());
        };
        let equipped = session.select_item(id)?;
        self.selected = position;
        self.preview = Some(id);
        Ok(equipped)
    }

    pub fn rows<'s>(&self, session: &'s ShopSession<'_>) -> Vec<ShopRow<'s>> {
        self.order
            .iter()
            .enumerate()
            .filter_map(|(idx, id)| {
                session.engine().entry(*id).map(|entry| ShopRow {
                    item_id: *id,
                    model_ref: entry.item().model_ref.as_str(),
                    state: entry.state(),
                    selected: idx == self.selected,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ItemCatalog, ItemDefinition};
    use crate::profile::{ProfileData, ProfileStore};

    fn catalog() -> ItemCatalog {
        let defs = [
            (1, ItemCategory::Skin),
            (2, ItemCategory::Skin),
            (3, ItemCategory::Skin),
            (10, ItemCategory::Weapon),
            (11, ItemCategory::Weapon),
        ]
        .into_iter()
        .map(|(id, category)| ItemDefinition {
            id: ItemId(id),
            category,
            model_ref: format!("model_{id}"),
        })
        .collect();
        ItemCatalog::load(defs).expect("catalog")
    }

    fn profile() -> ProfileStore {
        let mut data = ProfileData::default();
        data.owned_item_ids.extend([ItemId(1), ItemId(3), ItemId(11)]);
        data.active_items.insert(ItemCategory::Skin, ItemId(3));
        ProfileStore::new(data)
    }

    fn row_ids(rows: &[ShopRow<'_>]) -> Vec<u32> {
        rows.iter().map(|row| row.item_id.0).collect()
    }

    #[test]
    fn opens_on_first_tab_with_active_selected() {
        let catalog = catalog();
        let session = ShopSession::open(&catalog, profile()).expect("open");
        let view = ShopView::open(&session);

        assert_eq!(view.category(), ItemCategory::Skin);
        assert_eq!(view.selected_item(), Some(ItemId(3)));
        assert_eq!(view.preview(), Some(ItemId(3)));
        let rows = view.rows(&session);
        assert_eq!(row_ids(&rows), vec![3, 1, 2]);
        assert!(rows[0].selected);
        assert_eq!(rows[0].model_ref, "model_3");
    }

    #[test]
    fn tab_without_active_selects_first_unlocked() {
        let catalog = catalog();
        let session = ShopSession::open(&catalog, profile()).expect("open");
        let mut view = ShopView::open(&session);

        view.change_tab(&session, ItemCategory::Weapon);
        assert_eq!(row_ids(&view.rows(&session)), vec![11, 10]);
        assert_eq!(view.selected_item(), Some(ItemId(11)));
    }

    #[test]
    fn selecting_owned_slot_equips_without_resorting() {
        let catalog = catalog();
        let mut session = ShopSession::open(&catalog, profile()).expect("open");
        let mut view = ShopView::open(&session);

        assert!(view.select(&mut session, ItemId(1)).expect("select"));
        let rows = view.rows(&session);
        assert_eq!(row_ids(&rows), vec![3, 1, 2]);
        assert_eq!(rows[0].state, ItemState::Unlocked);
        assert_eq!(rows[1].state, ItemState::Active);
        assert!(rows[1].selected);

        view.refresh(&session);
        assert_eq!(row_ids(&view.rows(&session)), vec![1, 3, 2]);
    }

    #[test]
    fn selecting_locked_slot_previews_only() {
        let catalog = catalog();
        let mut session = ShopSession::open(&catalog, profile()).expect("open");
        let mut view = ShopView::open(&session);

        assert!(!view.select(&mut session, ItemId(2)).expect("select"));
        assert_eq!(view.preview(), Some(ItemId(2)));
        assert_eq!(session.engine().active_in(ItemCategory::Skin), Some(ItemId(3)));
    }

    #[test]
    fn selecting_item_from_other_tab_is_not_found() {
        let catalog = catalog();
        let mut session = ShopSession::open(&catalog, profile()).expect("open");
        let mut view = ShopView::open(&session);

        let err = view.select(&mut session, ItemId(11)).expect_err("other tab");
        assert!(matches!(
            err,
            SessionError::State(ItemStateError::NotFound { id }) if id == ItemId(11)
        ));
        assert_eq!(view.selected_item(), Some(ItemId(3)));
    }

    #[test]
    fn tabs_follow_category_order() {
        assert_eq!(ShopView::tabs(), &[ItemCategory::Skin, ItemCategory::Weapon]);
    }
}
