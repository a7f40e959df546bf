use super::index::{resolve_level_index, LevelChapterIndex, LEVELS_PER_CHAPTER};
use super::LevelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageSlotState {
    Passed,
    Current,
    Future,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSlot {
    /// Absolute, 0-based level number.
    pub level_number: u32,
    pub state: StageSlotState,
    pub boss: bool,
}

/// The home screen's chapter strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTrack {
    pub index: LevelChapterIndex,
    pub slots: Vec<StageSlot>,
    /// Out of 100; the marker sits in the middle of the current slot.
    pub progress_percent: u32,
}

pub fn stage_track(level_progress: i64) -> Result<StageTrack, LevelError> {
    let index = resolve_level_index(level_progress)?;
    let slots = (0..LEVELS_PER_CHAPTER)
        .map(|slot| {
            let state = match slot.cmp(&index.level_in_chapter) {
                std::cmp::Ordering::Less => StageSlotState::Passed,
                std::cmp::Ordering::Equal => StageSlotState::Current,
                std::cmp::Ordering::Greater => StageSlotState::Future,
            };
            StageSlot {
                level_number: index.chapter_start() + slot,
                state,
                boss: slot == LEVELS_PER_CHAPTER - 1,
            }
        })
        .collect();

    Ok(StageTrack {
        index,
        slots,
        progress_percent: index.level_in_chapter * 10 + 5,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_cover_current_chapter() {
        let track = stage_track(23).expect("track");
        assert_eq!(track.slots.len(), 10);
        assert_eq!(track.slots[0].level_number, 20);
        assert_eq!(track.slots[9].level_number, 29);
        assert_eq!(track.slots[2].state, StageSlotState::Passed);
        assert_eq!(track.slots[3].state, StageSlotState::Current);
        assert_eq!(track.slots[4].state, StageSlotState::Future);
        assert_eq!(track.progress_percent, 35);
    }

    #[test]
    fn only_last_slot_is_boss() {
        let track = stage_track(0).expect("track");
        let bosses = track
            .slots
            .iter()
            .filter(|slot| slot.boss)
            .map(|slot| slot.level_number)
            .collect::<Vec<_>>();
        assert_eq!(bosses, vec![9]);
        assert_eq!(track.slots[0].state, StageSlotState::Current);
        assert_eq!(track.progress_percent, 5);
    }

    #[test]
    fn boss_level_is_current_on_last_slot() {
        let track = stage_track(19).expect("track");
        assert!(track.slots[9].boss);
        assert_eq!(track.slots[9].state, StageSlotState::Current);
        assert_eq!(track.progress_percent, 95);
    }

    #[test]
    fn negative_progress_fails() {
        assert!(stage_track(-3).is_err());
    }

    #[test]
    fn last_chapter_fits_and_partial_chapter_is_rejected() {
        use crate::level::MAX_LEVEL_PROGRESS;

        let track = stage_track(MAX_LEVEL_PROGRESS).expect("last chapter");
        assert_eq!(i64::from(track.slots[9].level_number), MAX_LEVEL_PROGRESS);
        assert!(matches!(
            stage_track(i64::from(u32::MAX)),
            Err(LevelError::OutOfRange { .. })
        ));
    }
}
