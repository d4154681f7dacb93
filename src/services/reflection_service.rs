//! Daily EQ reflection: one record per user and date.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::repositories::reflection_repository::ReflectionRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::notice::Notice;
use crate::models::reflection::{EqCategory, EqReflection, EqReflectionItem, StoredReflection};
use crate::services::notifier::NoticeQueue;
use crate::services::optimistic::{apply_confirm_revert, FieldLens, PatchTarget};
use crate::services::session::SessionProvider;
use crate::services::state::VersionedState;

/// Remote home of reflection records. Every call is scoped to `user_id`, and
/// writes upsert on `(user_id, date)`, returning the row id.
#[async_trait::async_trait]
pub trait ReflectionStore: Send + Sync {
    async fn find(&self, user_id: &str, date: NaiveDate) -> AppResult<Option<StoredReflection>>;

    /// Replaces the whole items document.
    async fn upsert(&self, user_id: &str, date: NaiveDate, items: &str) -> AppResult<String>;

    /// Replaces one category entry only.
    async fn upsert_item(
        &self,
        user_id: &str,
        date: NaiveDate,
        category: EqCategory,
        item: &str,
    ) -> AppResult<String>;

    async fn recent(&self, user_id: &str, limit: usize) -> AppResult<Vec<StoredReflection>>;
}

pub struct SqliteReflectionStore {
    db: DbPool,
}

impl SqliteReflectionStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

async fn blocking<F, T>(db: &DbPool, operation: F) -> AppResult<T>
where
    F: FnOnce(&rusqlite::Connection) -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    let db = db.clone();
    tokio::task::spawn_blocking(move || db.with_connection(operation))
        .await
        .map_err(|err| AppError::other(format!("reflection store task failed: {err}")))?
}

#[async_trait::async_trait]
impl ReflectionStore for SqliteReflectionStore {
    async fn find(&self, user_id: &str, date: NaiveDate) -> AppResult<Option<StoredReflection>> {
        let user_id = user_id.to_string();
        blocking(&self.db, move |conn| {
            ReflectionRepository::find_by_user_and_date(conn, &user_id, date)
        })
        .await
    }

    async fn upsert(&self, user_id: &str, date: NaiveDate, items: &str) -> AppResult<String> {
        let user_id = user_id.to_string();
        let items = items.to_string();
        blocking(&self.db, move |conn| {
            let id = Uuid::new_v4().to_string();
            let now = Utc::now().to_rfc3339();
            ReflectionRepository::upsert_items(conn, &id, &user_id, date, &items, &now)
        })
        .await
    }

    async fn upsert_item(
        &self,
        user_id: &str,
        date: NaiveDate,
        category: EqCategory,
        item: &str,
    ) -> AppResult<String> {
        let user_id = user_id.to_string();
        let item = item.to_string();
        blocking(&self.db, move |conn| {
            let id = Uuid::new_v4().to_string();
            let now = Utc::now().to_rfc3339();
            ReflectionRepository::upsert_item(conn, &id, &user_id, date, category, &item, &now)
        })
        .await
    }

    async fn recent(&self, user_id: &str, limit: usize) -> AppResult<Vec<StoredReflection>> {
        let user_id = user_id.to_string();
        blocking(&self.db, move |conn| {
            ReflectionRepository::list_for_user(conn, &user_id, limit)
        })
        .await
    }
}

/// Reads the stored items document. Each category is parsed on its own; a
/// missing or malformed entry falls back to that category's default.
pub fn parse_items(raw: &str) -> BTreeMap<EqCategory, EqReflectionItem> {
    let document = match serde_json::from_str::<JsonValue>(raw) {
        Ok(JsonValue::Object(map)) => map,
        Ok(other) => {
            warn!(target: "app::reflection", kind = ?other, "reflection items are not an object");
            Default::default()
        }
        Err(err) => {
            warn!(target: "app::reflection", error = %err, "reflection items are not valid json");
            Default::default()
        }
    };

    EqCategory::ALL
        .iter()
        .map(|category| {
            let item = document
                .get(category.as_str())
                .map(|value| serde_json::from_value::<EqReflectionItem>(value.clone()))
                .and_then(|parsed| match parsed {
                    Ok(item) if item.category == *category => Some(item),
                    Ok(item) => {
                        warn!(
                            target: "app::reflection",
                            expected = %category,
                            found = %item.category,
                            "reflection item filed under the wrong category"
                        );
                        None
                    }
                    Err(err) => {
                        warn!(
                            target: "app::reflection",
                            category = %category,
                            error = %err,
                            "malformed reflection item"
                        );
                        None
                    }
                })
                .unwrap_or_else(|| category.default_item());
            (*category, item)
        })
        .collect()
}

/// Cached record and the user it was loaded for. `None` means defaults shown
/// to a signed-out visitor.
#[derive(Debug, Clone, PartialEq)]
struct ReflectionView {
    owner: Option<String>,
    reflection: EqReflection,
}

impl ReflectionView {
    fn defaults(date: NaiveDate) -> Self {
        Self {
            owner: None,
            reflection: EqReflection::with_defaults(date),
        }
    }

    fn belongs_to(&self, user_id: &str, date: NaiveDate) -> bool {
        self.owner.as_deref() == Some(user_id) && self.reflection.date == date
    }
}

impl PatchTarget<EqCategory, EqReflectionItem> for ReflectionView {
    fn slot_mut(&mut self, key: &EqCategory) -> Option<&mut EqReflectionItem> {
        self.reflection.items.get_mut(key)
    }
}

const COMPLETED: FieldLens<EqReflectionItem, bool> = FieldLens {
    name: "completed",
    get: |item| item.completed,
    set: |item, value| item.completed = value,
};

const WHOLE_ITEM: FieldLens<EqReflectionItem, EqReflectionItem> = FieldLens {
    name: "item",
    get: |item| item.clone(),
    set: |item, value| *item = value,
};

fn as_persistence(err: AppError) -> AppError {
    match err {
        AppError::Persistence { .. } => err,
        other => AppError::persistence("eq reflection", other.to_string()),
    }
}

pub struct ReflectionService {
    store: Arc<dyn ReflectionStore>,
    session: Arc<dyn SessionProvider>,
    notices: Arc<NoticeQueue>,
    view: VersionedState<ReflectionView>,
}

impl ReflectionService {
    pub fn new(
        store: Arc<dyn ReflectionStore>,
        session: Arc<dyn SessionProvider>,
        notices: Arc<NoticeQueue>,
        today: NaiveDate,
    ) -> Self {
        Self {
            store,
            session,
            notices,
            view: VersionedState::new("eq_reflection", ReflectionView::defaults(today)),
        }
    }

    pub fn current(&self) -> AppResult<EqReflection> {
        Ok(self.view.snapshot()?.reflection)
    }

    /// Stops applying responses for loads still in flight.
    pub fn close(&self) {
        debug!(target: "app::reflection", "reflection view closed");
        self.view.close();
    }

    /// Forgets the signed-in user's record and shows defaults for the same date.
    pub fn clear(&self) -> AppResult<()> {
        let date = self.view.snapshot()?.reflection.date;
        self.view.replace(ReflectionView::defaults(date))?;
        debug!(target: "app::reflection", %date, "reflection cache cleared");
        Ok(())
    }

    fn require_session(&self, action: &str) -> AppResult<String> {
        match self.session.current_user() {
            Some(user_id) => Ok(user_id),
            None => {
                self.notices.push(Notice::authentication_required(format!(
                    "Please sign in to {action}"
                )));
                Err(AppError::unauthenticated(action))
            }
        }
    }

    /// Loads the record for `date`. Without a session the defaults are shown
    /// and the store is not consulted.
    pub async fn load(&self, date: NaiveDate) -> AppResult<EqReflection> {
        let Some(user_id) = self.session.current_user() else {
            let defaults = ReflectionView::defaults(date);
            self.view.replace(defaults.clone())?;
            return Ok(defaults.reflection);
        };

        let ticket = self.view.begin_load();
        let stored = self.store.find(&user_id, date).await?;
        let record = match stored {
            Some(row) => EqReflection {
                id: Some(row.id),
                date,
                items: parse_items(&row.items),
            },
            None => EqReflection::with_defaults(date),
        };

        let loaded = ReflectionView {
            owner: Some(user_id.clone()),
            reflection: record.clone(),
        };
        if self.view.finish_load(ticket, loaded)? {
            debug!(target: "app::reflection", %user_id, %date, found = record.id.is_some(), "reflection loaded");
            Ok(record)
        } else {
            self.current()
        }
    }

    /// Marks one category done, persisting in the background of the local edit.
    pub async fn complete_item(&self, date: NaiveDate, category: EqCategory) -> AppResult<EqReflection> {
        let user_id = self.require_session("complete a reflection")?;
        self.ensure_loaded(&user_id, date).await?;

        let title = match self.current()?.item(category) {
            Some(item) if item.completed => return self.current(),
            Some(item) => item.title.clone(),
            None => category.default_item().title,
        };

        let outcome = apply_confirm_revert(&self.view, category, COMPLETED, true, || {
            self.persist_item(&user_id, date, category)
        })
        .await;

        match outcome {
            Ok(_) => {
                info!(target: "app::reflection", %user_id, %date, category = %category, "reflection item completed");
                self.notices
                    .push(Notice::info("Success", format!("Completed your {title} task!")));
                self.current()
            }
            Err(err) => {
                self.notices.push(Notice::destructive(
                    "Error",
                    format!("Failed to save your {title} reflection"),
                ));
                Err(err)
            }
        }
    }

    /// Replaces one category's item.
    pub async fn update_item(&self, date: NaiveDate, item: EqReflectionItem) -> AppResult<EqReflection> {
        let user_id = self.require_session("update a reflection")?;
        self.ensure_loaded(&user_id, date).await?;

        let category = item.category;
        let title = item.title.clone();
        let outcome = apply_confirm_revert(&self.view, category, WHOLE_ITEM, item, || {
            self.persist_item(&user_id, date, category)
        })
        .await;

        match outcome {
            Ok(_) => {
                info!(target: "app::reflection", %user_id, %date, category = %category, "reflection item updated");
                self.notices.push(Notice::info(
                    "Success",
                    format!("Your {title} reflection has been updated"),
                ));
                self.current()
            }
            Err(err) => {
                self.notices.push(Notice::destructive(
                    "Error",
                    format!("Failed to update your {title} reflection"),
                ));
                Err(err)
            }
        }
    }

    /// Upserts the whole record for `date`.
    pub async fn save_reflection(&self, date: NaiveDate) -> AppResult<EqReflection> {
        let user_id = self.require_session("save a reflection")?;
        self.ensure_loaded(&user_id, date).await?;

        if let Err(err) = self.persist_all(&user_id, date).await {
            self.notices.push(Notice::destructive(
                "Error",
                "Failed to save your reflection",
            ));
            return Err(err);
        }
        info!(target: "app::reflection", %user_id, %date, "reflection saved");
        self.current()
    }

    /// Most recent records for the signed-in user; empty without a session.
    pub async fn history(&self, limit: usize) -> AppResult<Vec<EqReflection>> {
        let Some(user_id) = self.session.current_user() else {
            return Ok(Vec::new());
        };

        let rows = self.store.recent(&user_id, limit).await?;
        Ok(rows
            .into_iter()
            .map(|row| EqReflection {
                items: parse_items(&row.items),
                id: Some(row.id),
                date: row.date,
            })
            .collect())
    }

    /// Reloads unless the cached record is this user's record for `date`.
    async fn ensure_loaded(&self, user_id: &str, date: NaiveDate) -> AppResult<()> {
        if self.view.snapshot()?.belongs_to(user_id, date) {
            return Ok(());
        }

        self.load(date).await?;
        if self.view.snapshot()?.belongs_to(user_id, date) {
            Ok(())
        } else {
            Err(AppError::conflict("reflection changed while loading"))
        }
    }

    async fn persist_item(&self, user_id: &str, date: NaiveDate, category: EqCategory) -> AppResult<()> {
        let item = self
            .current()?
            .item(category)
            .cloned()
            .unwrap_or_else(|| category.default_item());
        let payload = serde_json::to_string(&item).map_err(|err| as_persistence(err.into()))?;

        let row_id = self
            .store
            .upsert_item(user_id, date, category, &payload)
            .await
            .map_err(as_persistence)?;
        self.remember_row_id(user_id, date, row_id);
        Ok(())
    }

    async fn persist_all(&self, user_id: &str, date: NaiveDate) -> AppResult<()> {
        let items = serde_json::to_string(&self.current()?.items)
            .map_err(|err| as_persistence(err.into()))?;

        let row_id = self
            .store
            .upsert(user_id, date, &items)
            .await
            .map_err(as_persistence)?;
        self.remember_row_id(user_id, date, row_id);
        Ok(())
    }

    fn remember_row_id(&self, user_id: &str, date: NaiveDate, row_id: String) {
        let outcome = self.view.modify(|view| {
            if view.belongs_to(user_id, date) && view.reflection.id.is_none() {
                view.reflection.id = Some(row_id);
            }
        });
        if let Err(err) = outcome {
            warn!(target: "app::reflection", error = %err, "could not record reflection row id");
        }
    }
}
