pub mod analytics;
pub mod db;
pub mod errors;
pub mod images;
pub mod models;
pub mod service;

pub use crate::db::fitness::FitnessStore;
pub use crate::db::journal::JournalStore;
pub use crate::db::mood::MoodStore;
pub use crate::db::{Database, DB_FILE_NAME};
pub use crate::errors::{AppError, AppResult};
pub use crate::service::{ImageUpdate, JournalService};

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;

pub const DATA_DIR_ENV: &str = "MINDFUL_JOURNAL_DATA_DIR";
const APP_DIR_NAME: &str = "mindful-journal";

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

/// JSON logs under `<data_dir>/logs`, rotated daily. `RUST_LOG` overrides the
/// default `info` filter.
pub fn init_tracing(data_dir: &Path) -> AppResult<()> {
    let log_dir = data_dir.join("logs");
    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "journal.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| AppError::Internal(error.to_string()))
}

/// Platform data directory for the app, e.g. `~/.local/share/mindful-journal`.
pub fn default_data_dir() -> AppResult<PathBuf> {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| AppError::NotFound("no local data directory for this platform".to_string()))
}
