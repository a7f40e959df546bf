use std::env;
use std::path::PathBuf;

use tower_core::{load_content_database, resolve_app_paths, AppPaths, ContentDatabase};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::runner::AppError;

const PROFILE_ENV_VAR: &str = "TOWER_PROFILE";

pub(crate) struct AppContext {
    pub(crate) content: ContentDatabase,
    pub(crate) profile_path: PathBuf,
}

pub(crate) fn build_app() -> Result<AppContext, AppError> {
    let paths = resolve_app_paths()?;
    info!(
        root = %paths.root.display(),
        content_dir = %paths.content_dir.display(),
        "startup_paths_resolved"
    );

    let content = load_content_database(&paths.content_dir)?;
    let profile_path = profile_path_from_env(&paths);
    info!(profile = %profile_path.display(), "profile_path_resolved");

    Ok(AppContext {
        content,
        profile_path,
    })
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn profile_path_from_env(paths: &AppPaths) -> PathBuf {
    env::var_os(PROFILE_ENV_VAR)
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| paths.profile_path())
}
