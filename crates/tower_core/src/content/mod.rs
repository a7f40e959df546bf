mod database;
mod loader;

pub use database::{ContentBuildError, ContentDatabase};
pub use loader::{load_content_database, ContentErrorCode, ContentLoadError, SourceLocation};
