use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::{ItemCategory, ItemId};
use crate::content::ContentDatabase;
use crate::profile::ProfileData;

use super::config::EnemyId;
use super::index::LevelChapterIndex;
use super::LevelError;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error("enemy {id} required by chapter {chapter} level {level} was not found")]
    EnemyNotFound { id: EnemyId, chapter: u32, level: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadoutSlot {
    pub item_id: ItemId,
    pub model_ref: String,
}

/// Equipped items the character spawns with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Loadout {
    pub skin: Option<LoadoutSlot>,
    pub weapon: Option<LoadoutSlot>,
}

/// Everything the spawning systems need to start the current level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelLaunchPlan {
    pub index: LevelChapterIndex,
    pub loadout: Loadout,
    pub spawn_point_count: u32,
    pub enemy_models: Vec<String>,
    pub boss_model: Option<String>,
    pub total_enemies: u32,
}

impl LevelLaunchPlan {
    pub fn has_boss_fight(&self) -> bool {
        self.boss_model.is_some()
    }

    pub fn enemy_counter(&self) -> EnemyCounter {
        EnemyCounter::new(self.total_enemies)
    }
}

/// Fails when no level can be resolved for the profile's progress, or when a
/// boss level lacks its boss. Missing regular enemies and equipped items
/// only leave gaps.
pub fn build_launch_plan(
    content: &ContentDatabase,
    profile: &ProfileData,
) -> Result<LevelLaunchPlan, LaunchError> {
    let (index, config) = content.levels.resolve(profile.level_progress)?;

    let loadout = Loadout {
        skin: loadout_slot(content, profile, ItemCategory::Skin),
        weapon: loadout_slot(content, profile, ItemCategory::Weapon),
    };

    let mut enemy_models = Vec::with_capacity(config.enemy_ids.len());
    for id in &config.enemy_ids {
        match content.enemies.get(*id) {
            Some(def) => enemy_models.push(def.model_ref.clone()),
            None => warn!(
                enemy_id = id.0,
                chapter = config.chapter,
                level = config.level,
                "level_enemy_not_found_skipped"
            ),
        }
    }

    let boss_model = match config.boss_enemy_id {
        Some(id) => {
            let def = content.enemies.get(id).ok_or(LaunchError::EnemyNotFound {
                id,
                chapter: config.chapter,
                level: config.level,
            })?;
            Some(def.model_ref.clone())
        }
        None => None,
    };

    info!(
        chapter = index.chapter_number(),
        level = index.level_in_chapter,
        spawn_points = config.spawn_point_count,
        enemy_kinds = enemy_models.len(),
        boss = boss_model.is_some(),
        total_enemies = config.max_enemy_count,
        "level_launch_planned"
    );

    Ok(LevelLaunchPlan {
        index,
        loadout,
        spawn_point_count: config.spawn_point_count,
        enemy_models,
        boss_model,
        total_enemies: config.max_enemy_count,
    })
}

fn loadout_slot(
    content: &ContentDatabase,
    profile: &ProfileData,
    category: ItemCategory,
) -> Option<LoadoutSlot> {
    let item_id = *profile.active_items.get(&category)?;
    let def = content.items.lookup(item_id).ok()?;
    if def.category != category {
        warn!(
            item_id = item_id.0,
            expected = %category,
            actual = %def.category,
            "loadout_item_category_mismatch"
        );
        return None;
    }
    Some(LoadoutSlot {
        item_id,
        model_ref: def.model_ref.clone(),
    })
}

/// Kill tally shown on the HUD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyCounter {
    total: u32,
    killed: u32,
}

impl EnemyCounter {
    pub fn new(total: u32) -> Self {
        Self { total, killed: 0 }
    }

    pub fn record_kill(&mut self) -> u32 {
        self.killed = self.killed.saturating_add(1).min(self.total);
        self.killed
    }

    pub fn killed(&self) -> u32 {
        self.killed
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn is_cleared(&self) -> bool {
        self.killed >= self.total
    }

    pub fn display_text(&self) -> String {
        format!("{}/{}", self.killed, self.total)
    }
}
