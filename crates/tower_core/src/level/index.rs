use super::LevelError;

pub const LEVELS_PER_CHAPTER: u32 = 10;
pub const BOSS_LEVEL_IN_CHAPTER: u32 = LEVELS_PER_CHAPTER - 1;

/// Highest accepted progress. The last chapter must fit in `u32` whole, so
/// the trailing partial chapter below `u32::MAX` is excluded.
pub const MAX_LEVEL_PROGRESS: i64 = (u32::MAX - u32::MAX % LEVELS_PER_CHAPTER - 1) as i64;

/// Position of a linear progress counter inside the chapter layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LevelChapterIndex {
    /// 0-based.
    pub chapter_index: u32,
    /// In `0..LEVELS_PER_CHAPTER`.
    pub level_in_chapter: u32,
}

impl LevelChapterIndex {
    /// 1-based chapter number used for configuration lookup.
    pub fn chapter_number(&self) -> u32 {
        self.chapter_index + 1
    }

    pub fn is_boss_level(&self) -> bool {
        self.level_in_chapter == BOSS_LEVEL_IN_CHAPTER
    }

    /// Absolute level number of the first level of this chapter.
    pub fn chapter_start(&self) -> u32 {
        self.chapter_index * LEVELS_PER_CHAPTER
    }
}

pub fn resolve_level_index(level_progress: i64) -> Result<LevelChapterIndex, LevelError> {
    if !(0..=MAX_LEVEL_PROGRESS).contains(&level_progress) {
        return Err(LevelError::OutOfRange { level_progress });
    }
    let progress =
        u32::try_from(level_progress).map_err(|_| LevelError::OutOfRange { level_progress })?;
    Ok(LevelChapterIndex {
        chapter_index: progress / LEVELS_PER_CHAPTER,
        level_in_chapter: progress % LEVELS_PER_CHAPTER,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(progress: i64) -> (u32, u32, bool) {
        let index = resolve_level_index(progress).expect("resolve");
        (
            index.chapter_number(),
            index.level_in_chapter,
            index.is_boss_level(),
        )
    }

    #[test]
    fn splits_progress_into_chapter_and_level() {
        assert_eq!(resolved(0), (1, 0, false));
        assert_eq!(resolved(9), (1, 9, true));
        assert_eq!(resolved(10), (2, 0, false));
        assert_eq!(resolved(23), (3, 3, false));
        assert_eq!(resolved(39), (4, 9, true));
    }

    #[test]
    fn negative_progress_is_out_of_range() {
        assert_eq!(
            resolve_level_index(-1),
            Err(LevelError::OutOfRange { level_progress: -1 })
        );
    }

    #[test]
    fn progress_past_u32_is_out_of_range() {
        let too_far = i64::from(u32::MAX) + 1;
        assert!(matches!(
            resolve_level_index(too_far),
            Err(LevelError::OutOfRange { .. })
        ));
    }

    #[test]
    fn last_whole_chapter_is_the_upper_bound() {
        let index = resolve_level_index(MAX_LEVEL_PROGRESS).expect("last level");
        assert!(index.is_boss_level());
        assert_eq!(
            index.chapter_start() + BOSS_LEVEL_IN_CHAPTER,
            u32::try_from(MAX_LEVEL_PROGRESS).expect("fits")
        );

        for past in [MAX_LEVEL_PROGRESS + 1, i64::from(u32::MAX)] {
            assert_eq!(
                resolve_level_index(past),
                Err(LevelError::OutOfRange {
                    level_progress: past
                })
            );
        }
    }

    #[test]
    fn chapter_start_is_first_absolute_level() {
        let index = resolve_level_index(27).expect("resolve");
        assert_eq!(index.chapter_start(), 20);
    }
}
