mod config;
mod index;
mod launch;
mod stage;

use thiserror::Error;

pub use config::{EnemyDef, EnemyId, EnemyRoster, LevelConfig, LevelTable};
pub use index::{
    resolve_level_index, LevelChapterIndex, BOSS_LEVEL_IN_CHAPTER, LEVELS_PER_CHAPTER,
    MAX_LEVEL_PROGRESS,
};
pub use launch::{
    build_launch_plan, EnemyCounter, LaunchError, LevelLaunchPlan, Loadout, LoadoutSlot,
};
pub use stage::{stage_track, StageSlot, StageSlotState, StageTrack};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("level progress {level_progress} is out of range")]
    OutOfRange { level_progress: i64 },
    #[error("no level configuration for chapter {chapter} level {level}")]
    ConfigNotFound { chapter: u32, level: u32 },
    #[error("duplicate level configuration for chapter {chapter} level {level}")]
    DuplicateLevel { chapter: u32, level: u32 },
    #[error("duplicate enemy id {id}")]
    DuplicateEnemy { id: EnemyId },
}
