pub mod commands;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use std::path::Path;

use tracing::info;

use crate::commands::AppState;
use crate::db::DbPool;
use crate::error::AppResult;

const DATABASE_FILE: &str = "momentum.sqlite";

/// Prepares `data_dir`, starts logging and opens the application state.
pub fn bootstrap(data_dir: &Path) -> AppResult<AppState> {
    std::fs::create_dir_all(data_dir)?;
    crate::utils::logger::init_logging(&data_dir.join("logs"))?;

    let pool = DbPool::new(data_dir.join(DATABASE_FILE))?;
    info!(target: "app::bootstrap", data_dir = %data_dir.display(), "application state ready");
    AppState::new(pool)
}
