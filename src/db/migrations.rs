use rusqlite::Connection;
use tracing::info;

use crate::error::AppResult;

struct Migration {
    version: i32,
    description: &'static str,
    up: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Add eq reflections keyed by user and date",
        up: r#"
            CREATE TABLE IF NOT EXISTS eq_reflections (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                items TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_eq_reflections_user_date
                ON eq_reflections(user_id, date);
        "#,
    },
    Migration {
        version: 2,
        description: "Seed default board and tracker settings",
        up: r#"
            INSERT OR IGNORE INTO app_settings (key, value) VALUES ('week_start', 'monday');
            INSERT OR IGNORE INTO app_settings (key, value) VALUES ('completed_preview_limit', '3');
            INSERT OR IGNORE INTO app_settings (key, value) VALUES ('default_view', 'list');
        "#,
    },
];

pub fn latest_version() -> i32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies every migration above `PRAGMA user_version`, each in its own
/// transaction together with the version bump.
pub fn run(conn: &Connection) -> AppResult<()> {
    let current_version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current_version) {
        info!(
            target: "app::db",
            version = migration.version,
            description = migration.description,
            "running migration"
        );
        conn.execute_batch(&format!(
            "BEGIN;\n{}\nPRAGMA user_version = {};\nCOMMIT;",
            migration.up, migration.version
        ))?;
    }

    Ok(())
}
