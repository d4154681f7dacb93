use std::collections::HashMap;

use rusqlite::{named_params, Connection, OptionalExtension};

use crate::error::AppResult;

/// Key/value rows of the `app_settings` table.
pub struct SettingsRepository;

impl SettingsRepository {
    pub fn value(conn: &Connection, key: &str) -> AppResult<Option<String>> {
        let value = conn
            .query_row(
                "SELECT value FROM app_settings WHERE key = :key",
                named_params! {":key": key},
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// All rows keyed by setting name, plus the most recent `updated_at`.
    pub fn load_all(conn: &Connection) -> AppResult<(HashMap<String, String>, Option<String>)> {
        let mut stmt = conn.prepare("SELECT key, value, updated_at FROM app_settings")?;
        let mut values = HashMap::new();
        let mut latest: Option<String> = None;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        for row in rows {
            let (key, value, updated_at) = row?;
            if latest.as_deref().map_or(true, |current| current < updated_at.as_str()) {
                latest = Some(updated_at);
            }
            values.insert(key, value);
        }

        Ok((values, latest))
    }

    /// Writes every pair inside one transaction.
    pub fn upsert_many(conn: &Connection, pairs: &[(&str, String)]) -> AppResult<()> {
        if pairs.is_empty() {
            return Ok(());
        }

        let tx = conn.unchecked_transaction()?;
        for (key, value) in pairs {
            tx.execute(
                r#"
                    INSERT INTO app_settings (key, value)
                    VALUES (:key, :value)
                    ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        updated_at = CURRENT_TIMESTAMP
                "#,
                named_params! {":key": key, ":value": value},
            )?;
        }
        tx.commit()?;

        Ok(())
    }

    pub fn reset(conn: &Connection) -> AppResult<usize> {
        Ok(conn.execute("DELETE FROM app_settings", [])?)
    }
}
