use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::warn;

use super::index::{resolve_level_index, LevelChapterIndex};
use super::LevelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EnemyId(pub u32);

impl fmt::Display for EnemyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnemyDef {
    pub id: EnemyId,
    pub model_ref: String,
}

#[derive(Debug, Default, Clone)]
pub struct EnemyRoster {
    enemies: Vec<EnemyDef>,
    index_by_id: HashMap<EnemyId, usize>,
}

impl EnemyRoster {
    pub fn load(enemies: Vec<EnemyDef>) -> Result<Self, LevelError> {
        let mut index_by_id = HashMap::with_capacity(enemies.len());
        for (idx, def) in enemies.iter().enumerate() {
            if index_by_id.insert(def.id, idx).is_some() {
                return Err(LevelError::DuplicateEnemy { id: def.id });
            }
        }
        Ok(Self {
            enemies,
            index_by_id,
        })
    }

    pub fn get(&self, id: EnemyId) -> Option<&EnemyDef> {
        self.index_by_id.get(&id).map(|idx| &self.enemies[*idx])
    }

    pub fn enemies(&self) -> &[EnemyDef] {
        &self.enemies
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelConfig {
    /// 1-based.
    pub chapter: u32,
    pub level: u32,
    pub spawn_point_count: u32,
    pub enemy_ids: Vec<EnemyId>,
    pub boss_enemy_id: Option<EnemyId>,
    pub max_enemy_count: u32,
}

impl LevelConfig {
    pub fn has_boss_fight(&self) -> bool {
        self.boss_enemy_id.is_some()
    }
}

#[derive(Debug, Default, Clone)]
pub struct LevelTable {
    levels: BTreeMap<(u32, u32), LevelConfig>,
}

impl LevelTable {
    pub fn load(configs: Vec<LevelConfig>) -> Result<Self, LevelError> {
        let mut levels = BTreeMap::new();
        for config in configs {
            let key = (config.chapter, config.level);
            if levels.insert(key, config).is_some() {
                return Err(LevelError::DuplicateLevel {
                    chapter: key.0,
                    level: key.1,
                });
            }
        }
        Ok(Self { levels })
    }

    pub fn get_level_config(&self, chapter: u32, level: u32) -> Result<&LevelConfig, LevelError> {
        self.levels.get(&(chapter, level)).ok_or_else(|| {
            warn!(chapter, level, "level_config_not_found");
            LevelError::ConfigNotFound { chapter, level }
        })
    }

    /// Maps a progress counter straight to its configuration.
    pub fn resolve(
        &self,
        level_progress: i64,
    ) -> Result<(LevelChapterIndex, &LevelConfig), LevelError> {
        let index = resolve_level_index(level_progress)?;
        let config = self.get_level_config(index.chapter_number(), index.level_in_chapter)?;
        Ok((index, config))
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
