use std::collections::HashMap;
use std::sync::RwLock;

use serde::Deserialize;
use tracing::{info, warn};

use crate::db::repositories::settings_repository::SettingsRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::settings::{AppSettings, BoardView};
use crate::models::tracker::WeekStart;

const KEY_WEEK_START: &str = "week_start";
const KEY_COMPLETED_PREVIEW_LIMIT: &str = "completed_preview_limit";
const KEY_DEFAULT_VIEW: &str = "default_view";

const PREVIEW_LIMIT_RANGE: std::ops::RangeInclusive<usize> = 1..=50;

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdateInput {
    #[serde(default)]
    pub week_start: Option<String>,
    #[serde(default)]
    pub completed_preview_limit: Option<usize>,
    #[serde(default)]
    pub default_view: Option<String>,
}

pub struct SettingsService {
    db: DbPool,
    cache: RwLock<Option<AppSettings>>,
}

impl SettingsService {
    pub fn new(db: DbPool) -> Self {
        Self {
            db,
            cache: RwLock::new(None),
        }
    }

    pub fn get(&self) -> AppResult<AppSettings> {
        if let Ok(guard) = self.cache.read() {
            if let Some(settings) = guard.as_ref() {
                return Ok(settings.clone());
            }
        }

        let settings = self.load_from_db()?;
        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(settings.clone());
        }
        Ok(settings)
    }

    /// Week start in effect, falling back to the default when unreadable.
    pub fn week_start(&self) -> WeekStart {
        self.get()
            .map(|settings| settings.week_start)
            .unwrap_or_default()
    }

    pub fn update(&self, input: SettingsUpdateInput) -> AppResult<AppSettings> {
        let mut pairs: Vec<(&str, String)> = Vec::new();

        if let Some(raw) = input.week_start.as_deref() {
            let week_start = WeekStart::try_from(raw).map_err(AppError::validation)?;
            pairs.push((KEY_WEEK_START, week_start.as_str().to_string()));
        }

        if let Some(limit) = input.completed_preview_limit {
            if !PREVIEW_LIMIT_RANGE.contains(&limit) {
                return Err(AppError::validation_with_details(
                    "completed preview limit out of range",
                    serde_json::json!({
                        "min": PREVIEW_LIMIT_RANGE.start(),
                        "max": PREVIEW_LIMIT_RANGE.end(),
                        "value": limit,
                    }),
                ));
            }
            pairs.push((KEY_COMPLETED_PREVIEW_LIMIT, limit.to_string()));
        }

        if let Some(raw) = input.default_view.as_deref() {
            let view = BoardView::try_from(raw).map_err(AppError::validation)?;
            pairs.push((KEY_DEFAULT_VIEW, view.as_str().to_string()));
        }

        if pairs.is_empty() {
            return self.get();
        }

        self.db
            .with_connection(|conn| SettingsRepository::upsert_many(conn, &pairs))?;
        info!(
            target: "app::settings",
            keys = ?pairs.iter().map(|(key, _)| *key).collect::<Vec<_>>(),
            "settings updated"
        );

        let settings = self.load_from_db()?;
        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(settings.clone());
        }
        Ok(settings)
    }

    /// Drops every stored value; the next read yields defaults.
    pub fn reset(&self) -> AppResult<AppSettings> {
        self.db.with_connection(SettingsRepository::reset)?;
        if let Ok(mut guard) = self.cache.write() {
            *guard = None;
        }
        info!(target: "app::settings", "settings reset to defaults");
        self.get()
    }

    fn load_from_db(&self) -> AppResult<AppSettings> {
        let (values, updated_at) = self.db.with_connection(SettingsRepository::load_all)?;
        Ok(settings_from_values(&values, updated_at))
    }
}

fn settings_from_values(values: &HashMap<String, String>, updated_at: Option<String>) -> AppSettings {
    let defaults = AppSettings::default();

    let week_start = values
        .get(KEY_WEEK_START)
        .map(|raw| {
            WeekStart::try_from(raw.as_str()).unwrap_or_else(|reason| {
                warn!(target: "app::settings", %reason, "invalid stored week start");
                defaults.week_start
            })
        })
        .unwrap_or(defaults.week_start);

    let completed_preview_limit = values
        .get(KEY_COMPLETED_PREVIEW_LIMIT)
        .map(|raw| match raw.parse::<usize>() {
            Ok(limit) if PREVIEW_LIMIT_RANGE.contains(&limit) => limit,
            _ => {
                warn!(target: "app::settings", value = %raw, "invalid stored preview limit");
                defaults.completed_preview_limit
            }
        })
        .unwrap_or(defaults.completed_preview_limit);

    let default_view = values
        .get(KEY_DEFAULT_VIEW)
        .map(|raw| {
            BoardView::try_from(raw.as_str()).unwrap_or_else(|reason| {
                warn!(target: "app::settings", %reason, "invalid stored board view");
                defaults.default_view
            })
        })
        .unwrap_or(defaults.default_view);

    AppSettings {
        week_start,
        completed_preview_limit,
        default_view,
        updated_at: updated_at.unwrap_or_default(),
    }
}
