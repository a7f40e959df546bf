use super::engine::{ItemState, ShopEntry};

fn display_rank(state: ItemState) -> u8 {
    match state {
        ItemState::Active => 0,
        ItemState::Unlocked => 1,
        ItemState::Locked => 2,
    }
}

/// Display order for one category: active first, then unlocked, then
/// locked. `entries` must be in catalog order, which the stable sort keeps as
/// the tie-break. The input is left untouched.
pub fn order_for_display(entries: &[ShopEntry]) -> Vec<&ShopEntry> {
    let mut ordered = entries.iter().collect::<Vec<_>>();
    ordered.sort_by_key(|entry| display_rank(entry.state()));
    ordered
}

/// Index to select when a category is shown. Falls back to 0, which makes
/// the first locked entry a preview-only selection.
pub fn default_selection(ordered: &[&ShopEntry]) -> usize {
    if ordered
        .first()
        .is_some_and(|entry| entry.state() == ItemState::Active)
    {
        return 0;
    }
    ordered
        .iter()
        .position(|entry| entry.state() == ItemState::Unlocked)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ItemCategory, ItemDefinition, ItemId};

    fn entry(id: u32, state: ItemState) -> ShopEntry {
        ShopEntry::new(
            ItemDefinition {
                id: ItemId(id),
                category: ItemCategory::Skin,
                model_ref: String::new(),
            },
            state,
        )
    }

    fn ids(ordered: &[&ShopEntry]) -> Vec<u32> {
        ordered.iter().map(|entry| entry.id().0).collect()
    }

    #[test]
    fn active_then_unlocked_then_locked_in_catalog_order() {
        let entries = vec![
            entry(1, ItemState::Locked),
            entry(2, ItemState::Unlocked),
            entry(3, ItemState::Active),
            entry(4, ItemState::Unlocked),
        ];
        let ordered = order_for_display(&entries);
        assert_eq!(ids(&ordered), vec![3, 2, 4, 1]);
        assert_eq!(default_selection(&ordered), 0);
        assert_eq!(entries[0].id(), ItemId(1));
    }

    #[test]
    fn locked_entries_keep_catalog_order() {
        let entries = vec![
            entry(9, ItemState::Locked),
            entry(5, ItemState::Locked),
            entry(7, ItemState::Unlocked),
            entry(6, ItemState::Locked),
        ];
        assert_eq!(ids(&order_for_display(&entries)), vec![7, 9, 5, 6]);
    }

    #[test]
    fn default_selection_without_active_picks_first_unlocked() {
        let entries = vec![entry(1, ItemState::Unlocked), entry(2, ItemState::Locked)];
        let ordered = order_for_display(&entries);
        assert_eq!(default_selection(&ordered), 0);

        let unordered = vec![&entries[1], &entries[0]];
        assert_eq!(default_selection(&unordered), 1);
    }

    #[test]
    fn default_selection_all_locked_or_empty_is_zero() {
        let entries = vec![entry(1, ItemState::Locked), entry(2, ItemState::Locked)];
        assert_eq!(default_selection(&order_for_display(&entries)), 0);
        assert_eq!(default_selection(&[]), 0);
    }
}
