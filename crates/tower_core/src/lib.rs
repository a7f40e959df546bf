use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod catalog;
pub mod content;
pub mod level;
pub mod profile;
pub mod shop;

pub use catalog::{CatalogError, ItemCatalog, ItemCategory, ItemDefinition, ItemId};
pub use content::{
    load_content_database, ContentDatabase, ContentErrorCode, ContentLoadError, SourceLocation,
};
pub use level::{
    build_launch_plan, resolve_level_index, stage_track, EnemyCounter, EnemyDef, EnemyId,
    EnemyRoster, LaunchError, LevelChapterIndex, LevelConfig, LevelError, LevelLaunchPlan,
    LevelTable, Loadout, LoadoutSlot, StageSlot, StageSlotState, StageTrack, LEVELS_PER_CHAPTER,
    MAX_LEVEL_PROGRESS,
};
pub use profile::{
    load_profile, save_profile, ProfileData, ProfileError, ProfileEvent, ProfileStore,
    Subscription, PROFILE_VERSION,
};
pub use shop::{
    default_selection, order_for_display, InvariantViolation, ItemState, ItemStateChanged,
    ItemStateEngine, ItemStateError, SessionError, ShopEntry, ShopRow, ShopSession, ShopView,
};

pub const ROOT_ENV_VAR: &str = "TOWER_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub content_dir: PathBuf,
    pub save_dir: PathBuf,
}

impl AppPaths {
    pub fn from_root(root: PathBuf) -> Self {
        let content_dir = root.join("assets").join("content");
        let save_dir = root.join("saves");
        Self {
            root,
            content_dir,
            save_dir,
        }
    }

    pub fn profile_path(&self) -> PathBuf {
        self.save_dir.join("profile.json")
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("failed to create save directory at {path}: {source}")]
    CreateSaveDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "TOWER_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/tower\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let paths = AppPaths::from_root(resolve_root()?);

    fs::create_dir_all(&paths.save_dir).map_err(|source| StartupError::CreateSaveDir {
        path: paths.save_dir.clone(),
        source,
    })?;

    Ok(paths)
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            exe_dir
                .ancestors()
                .find(|candidate| is_repo_marker(candidate))
                .map(normalize_path)
                .ok_or_else(|| StartupError::RootNotFound {
                    start_dir: normalize_path(&exe_dir),
                    env_var: ROOT_ENV_VAR,
                })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn repo_marker_requires_cargo_toml() {
        let temp = TempDir::new().expect("temp");
        fs::create_dir_all(temp.path().join("assets")).expect("assets");
        assert!(!is_repo_marker(temp.path()));

        fs::write(temp.path().join("Cargo.toml"), "[workspace]").expect("cargo toml");
        assert!(is_repo_marker(temp.path()));
    }

    #[test]
    fn app_paths_layout_under_root() {
        let paths = AppPaths::from_root(PathBuf::from("/game"));
        assert_eq!(paths.content_dir, Path::new("/game/assets/content"));
        assert_eq!(paths.profile_path(), Path::new("/game/saves/profile.json"));
    }
}
