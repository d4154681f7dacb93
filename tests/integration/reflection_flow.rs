//! EQ reflection persistence, revert on failed saves, and load guards.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use momentum_flow_lib::commands::{reflection, session, AppState};
use momentum_flow_lib::db::DbPool;
use momentum_flow_lib::error::{AppError, AppResult};
use momentum_flow_lib::models::notice::NoticeVariant;
use momentum_flow_lib::models::reflection::{EqCategory, StoredReflection};
use momentum_flow_lib::services::notifier::NoticeQueue;
use momentum_flow_lib::services::reflection_service::{
    parse_items, ReflectionService, ReflectionStore, SqliteReflectionStore,
};
use momentum_flow_lib::services::session::{LocalSession, SessionProvider};
use serde_json::{Map, Value};
use tempfile::{tempdir, TempDir};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 5).expect("valid date")
}

struct Harness {
    service: ReflectionService,
    notices: Arc<NoticeQueue>,
    session: Arc<LocalSession>,
}

fn harness(store: Arc<dyn ReflectionStore>, session: LocalSession) -> Harness {
    let notices = Arc::new(NoticeQueue::new());
    let session = Arc::new(session);
    let provider: Arc<dyn SessionProvider> = session.clone();
    let service = ReflectionService::new(store, provider, Arc::clone(&notices), day());
    Harness {
        service,
        notices,
        session,
    }
}

fn sqlite_store() -> (Arc<dyn ReflectionStore>, TempDir) {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("reflections.sqlite")).expect("db pool");
    (Arc::new(SqliteReflectionStore::new(pool)), dir)
}

/// Store that remembers one record in memory. It can fail every write, stall
/// its first read after taking its snapshot, or stall and then reject item
/// writes for one category.
#[derive(Default)]
struct ScriptedStore {
    record: Mutex<Option<StoredReflection>>,
    fail_writes: bool,
    slow_first_find: bool,
    rejected_category: Option<EqCategory>,
    finds: AtomicUsize,
}

impl ScriptedStore {
    fn stored_items(&self) -> Option<String> {
        self.record.lock().expect("lock").as_ref().map(|row| row.items.clone())
    }

    fn write(&self, user_id: &str, date: NaiveDate, change: impl FnOnce(&mut Map<String, Value>)) -> String {
        let mut record = self.record.lock().expect("lock");
        let row = record.get_or_insert_with(|| StoredReflection {
            id: "row-1".into(),
            user_id: user_id.into(),
            date,
            items: "{}".into(),
            updated_at: "now".into(),
        });
        let mut document = match serde_json::from_str::<Value>(&row.items) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        change(&mut document);
        row.items = Value::Object(document).to_string();
        row.id.clone()
    }
}

#[async_trait::async_trait]
impl ReflectionStore for ScriptedStore {
    async fn find(&self, _user_id: &str, _date: NaiveDate) -> AppResult<Option<StoredReflection>> {
        let call = self.finds.fetch_add(1, Ordering::SeqCst);
        let record = self.record.lock().expect("lock").clone();
        if self.slow_first_find && call == 0 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        Ok(record)
    }

    async fn upsert(&self, user_id: &str, date: NaiveDate, items: &str) -> AppResult<String> {
        if self.fail_writes {
            return Err(AppError::database("connection reset"));
        }
        let replacement = match serde_json::from_str::<Value>(items) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Ok(self.write(user_id, date, |document| *document = replacement))
    }

    async fn upsert_item(
        &self,
        user_id: &str,
        date: NaiveDate,
        category: EqCategory,
        item: &str,
    ) -> AppResult<String> {
        if self.rejected_category == Some(category) {
            tokio::time::sleep(Duration::from_millis(30)).await;
            return Err(AppError::database("connection reset"));
        }
        if self.fail_writes {
            return Err(AppError::database("connection reset"));
        }
        let value: Value = serde_json::from_str(item)?;
        Ok(self.write(user_id, date, |document| {
            document.insert(category.as_str().to_string(), value);
        }))
    }

    async fn recent(&self, _user_id: &str, _limit: usize) -> AppResult<Vec<StoredReflection>> {
        Ok(self.record.lock().expect("lock").clone().into_iter().collect())
    }
}

#[tokio::test]
async fn signed_out_load_shows_defaults() {
    let (store, _dir) = sqlite_store();
    let h = harness(store, LocalSession::new());

    let reflection = h.service.load(day()).await.expect("load");
    assert_eq!(reflection.items.len(), 4);
    assert_eq!(reflection.completed_count(), 0);
    assert!(reflection.id.is_none());
}

#[tokio::test]
async fn signed_out_write_requires_authentication() {
    let (store, _dir) = sqlite_store();
    let h = harness(store, LocalSession::new());

    let err = h
        .service
        .complete_item(day(), EqCategory::Empathy)
        .await
        .expect_err("unauthenticated");
    assert!(err.is_unauthenticated());

    let notices = h.notices.drain();
    assert_eq!(notices[0].title, "Authentication Required");
    assert_eq!(notices[0].variant, NoticeVariant::Destructive);
}

#[tokio::test]
async fn completion_persists_per_user_and_date() {
    let (store, _dir) = sqlite_store();
    let h = harness(Arc::clone(&store), LocalSession::signed_in("user-1"));

    h.service.load(day()).await.expect("load");
    let updated = h
        .service
        .complete_item(day(), EqCategory::SelfAwareness)
        .await
        .expect("complete");
    assert!(updated.item(EqCategory::SelfAwareness).expect("item").completed);
    assert!(updated.id.is_some());
    assert_eq!(
        h.notices.drain()[0].description,
        "Completed your Self-Awareness task!"
    );

    h.service
        .complete_item(day(), EqCategory::Empathy)
        .await
        .expect("second completion");

    let fresh = harness(Arc::clone(&store), LocalSession::signed_in("user-1"));
    let reloaded = fresh.service.load(day()).await.expect("reload");
    assert_eq!(reloaded.completed_count(), 2);
    assert_eq!(reloaded.id, updated.id);

    let other_user = harness(store, LocalSession::signed_in("user-2"));
    let theirs = other_user.service.load(day()).await.expect("other load");
    assert_eq!(theirs.completed_count(), 0);
}

#[tokio::test]
async fn failed_save_reverts_only_that_item() {
    let store = Arc::new(ScriptedStore {
        fail_writes: true,
        ..Default::default()
    });
    let h = harness(store, LocalSession::signed_in("user-1"));
    let before = h.service.load(day()).await.expect("load");

    let err = h
        .service
        .complete_item(day(), EqCategory::SocialSkills)
        .await
        .expect_err("write fails");
    assert!(matches!(err, AppError::Persistence { .. }));
    assert_eq!(h.service.current().expect("current"), before);

    let notices = h.notices.drain();
    assert_eq!(notices[0].title, "Error");
    assert_eq!(
        notices[0].description,
        "Failed to save your Social Skills reflection"
    );
}

#[tokio::test]
async fn item_edit_is_saved_and_reloaded() {
    let (store, _dir) = sqlite_store();
    let h = harness(Arc::clone(&store), LocalSession::signed_in("user-1"));
    let loaded = h.service.load(day()).await.expect("load");

    let mut item = loaded.item(EqCategory::Empathy).expect("item").clone();
    item.task = "Ask how their week went".into();
    h.service.update_item(day(), item).await.expect("update");
    assert_eq!(
        h.notices.drain()[0].description,
        "Your Empathy reflection has been updated"
    );

    let fresh = harness(store, LocalSession::signed_in("user-1"));
    let reloaded = fresh.service.load(day()).await.expect("reload");
    assert_eq!(
        reloaded.item(EqCategory::Empathy).expect("item").task,
        "Ask how their week went"
    );
}

#[tokio::test]
async fn late_load_does_not_clobber_newer_edit() {
    let store = Arc::new(ScriptedStore {
        slow_first_find: true,
        ..Default::default()
    });
    let h = harness(store, LocalSession::signed_in("user-1"));

    let (loaded, completed) = tokio::join!(
        h.service.load(day()),
        h.service.complete_item(day(), EqCategory::Empathy)
    );
    loaded.expect("load");
    completed.expect("complete");

    let current = h.service.current().expect("current");
    assert!(current.item(EqCategory::Empathy).expect("item").completed);
}

#[tokio::test]
async fn load_after_close_is_ignored() {
    let store = Arc::new(ScriptedStore::default());
    let writer = harness(store.clone(), LocalSession::signed_in("user-1"));
    writer
        .service
        .complete_item(day(), EqCategory::Empathy)
        .await
        .expect("seed record");

    let reader = harness(store, LocalSession::signed_in("user-1"));
    reader.service.close();
    let shown = reader.service.load(day()).await.expect("load");
    assert_eq!(shown.completed_count(), 0);
}

#[tokio::test]
async fn history_lists_saved_days() {
    let (store, _dir) = sqlite_store();
    let h = harness(store, LocalSession::signed_in("user-1"));
    h.service.save_reflection(day()).await.expect("save");

    let history = h.service.history(7).await.expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].date, day());

    h.session.sign_out();
    assert!(h.service.history(7).await.expect("history").is_empty());
}

#[tokio::test]
async fn failed_item_edit_uses_update_wording() {
    let store = Arc::new(ScriptedStore {
        fail_writes: true,
        ..Default::default()
    });
    let h = harness(store, LocalSession::signed_in("user-1"));
    let loaded = h.service.load(day()).await.expect("load");

    let mut item = loaded.item(EqCategory::SelfRegulation).expect("item").clone();
    item.reason = "Breathing resets focus".into();
    h.service.update_item(day(), item).await.expect_err("write fails");

    assert_eq!(h.service.current().expect("current"), loaded);
    let notices = h.notices.drain();
    assert_eq!(notices[0].variant, NoticeVariant::Destructive);
    assert_eq!(
        notices[0].description,
        "Failed to update your Self-Regulation reflection"
    );
}

#[tokio::test]
async fn overlapping_writes_fail_independently() {
    let store = Arc::new(ScriptedStore {
        rejected_category: Some(EqCategory::Empathy),
        ..Default::default()
    });
    let h = harness(store.clone(), LocalSession::signed_in("user-1"));
    h.service.load(day()).await.expect("load");

    let (empathy, social) = tokio::join!(
        h.service.complete_item(day(), EqCategory::Empathy),
        h.service.complete_item(day(), EqCategory::SocialSkills)
    );
    assert!(matches!(empathy, Err(AppError::Persistence { .. })));
    social.expect("social skills saved");

    let local = h.service.current().expect("current");
    assert!(!local.item(EqCategory::Empathy).expect("item").completed);
    assert!(local.item(EqCategory::SocialSkills).expect("item").completed);

    let remote = parse_items(&store.stored_items().expect("stored row"));
    assert!(!remote[&EqCategory::Empathy].completed);
    assert!(remote[&EqCategory::SocialSkills].completed);

    let titles: Vec<String> = h.notices.drain().into_iter().map(|n| n.title).collect();
    assert!(titles.contains(&"Success".to_string()));
    assert!(titles.contains(&"Error".to_string()));
}

#[tokio::test]
async fn concurrent_first_saves_share_one_row() {
    let (store, _dir) = sqlite_store();
    let h = harness(Arc::clone(&store), LocalSession::signed_in("user-1"));

    let (first, second) = tokio::join!(
        h.service.complete_item(day(), EqCategory::Empathy),
        h.service.complete_item(day(), EqCategory::SelfAwareness)
    );
    first.expect("first completion");
    second.expect("second completion");
    assert!(h
        .notices
        .drain()
        .iter()
        .all(|notice| notice.variant != NoticeVariant::Destructive));

    let fresh = harness(store, LocalSession::signed_in("user-1"));
    let reloaded = fresh.service.load(day()).await.expect("reload");
    assert_eq!(reloaded.completed_count(), 2);
    assert_eq!(fresh.service.history(7).await.expect("history").len(), 1);
}

#[tokio::test]
async fn switching_users_reloads_the_record() {
    let (store, _dir) = sqlite_store();
    let h = harness(Arc::clone(&store), LocalSession::signed_in("alice"));
    let alice = h
        .service
        .complete_item(day(), EqCategory::Empathy)
        .await
        .expect("alice completes");

    h.session.sign_in("bob");
    let bob = h
        .service
        .complete_item(day(), EqCategory::SocialSkills)
        .await
        .expect("bob completes");

    assert!(!bob.item(EqCategory::Empathy).expect("item").completed);
    assert!(bob.item(EqCategory::SocialSkills).expect("item").completed);
    assert_ne!(bob.id, alice.id);

    let alice_again = harness(store, LocalSession::signed_in("alice"));
    let stored = alice_again.service.load(day()).await.expect("reload");
    assert!(stored.item(EqCategory::Empathy).expect("item").completed);
    assert!(!stored.item(EqCategory::SocialSkills).expect("item").completed);
}

#[tokio::test]
async fn sign_out_clears_the_cached_record() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("state.sqlite")).expect("db pool");
    let state = AppState::new(pool).expect("state");

    session::session_sign_in(&state, "alice".into())
        .await
        .expect("sign in");
    reflection::reflection_complete_item(&state, day(), EqCategory::Empathy)
        .await
        .expect("alice completes");

    session::session_sign_out(&state).await.expect("sign out");
    let shown = state.reflections().current().expect("current");
    assert_eq!(shown.completed_count(), 0);
    assert!(shown.id.is_none());

    session::session_sign_in(&state, "bob".into())
        .await
        .expect("sign in");
    let bob = reflection::reflection_complete_item(&state, day(), EqCategory::SocialSkills)
        .await
        .expect("bob completes");
    assert_eq!(bob.completed_count(), 1);
    assert!(bob.item(EqCategory::SocialSkills).expect("item").completed);
}
