use thiserror::Error;

use crate::catalog::{CatalogError, ItemCatalog, ItemDefinition};
use crate::level::{EnemyDef, EnemyRoster, LevelConfig, LevelError, LevelTable};

#[derive(Debug, Error)]
pub enum ContentBuildError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Level(#[from] LevelError),
}

/// All static game data, loaded once at startup and passed explicitly to
/// whatever needs it.
#[derive(Debug, Default, Clone)]
pub struct ContentDatabase {
    pub items: ItemCatalog,
    pub enemies: EnemyRoster,
    pub levels: LevelTable,
}

impl ContentDatabase {
    pub fn from_parts(
        items: Vec<ItemDefinition>,
        enemies: Vec<EnemyDef>,
        levels: Vec<LevelConfig>,
    ) -> Result<Self, ContentBuildError> {
        Ok(Self {
            items: ItemCatalog::load(items)?,
            enemies: EnemyRoster::load(enemies)?,
            levels: LevelTable::load(levels)?,
        })
    }
}
