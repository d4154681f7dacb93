pub mod knowledge;
pub mod project;
pub mod reflection;
pub mod session;
pub mod settings;
pub mod task;
pub mod tracker;

use std::sync::Arc;

use chrono::Local;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, error, warn};

use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::services::knowledge_service::KnowledgeService;
use crate::services::link_service::LinkedTaskChannel;
use crate::services::notifier::NoticeQueue;
use crate::services::project_service::ProjectService;
use crate::services::reflection_service::{ReflectionService, ReflectionStore, SqliteReflectionStore};
use crate::services::session::{LocalSession, SessionProvider};
use crate::services::settings_service::SettingsService;
use crate::services::task_service::TaskBoard;
use crate::services::tracker_service::TrackerService;

#[derive(Clone)]
pub struct AppState {
    db_pool: DbPool,
    session: Arc<LocalSession>,
    notices: Arc<NoticeQueue>,
    linked_tasks: Arc<LinkedTaskChannel>,
    task_board: Arc<TaskBoard>,
    tracker_service: Arc<TrackerService>,
    project_service: Arc<ProjectService>,
    knowledge_service: Arc<KnowledgeService>,
    reflection_service: Arc<ReflectionService>,
    settings_service: Arc<SettingsService>,
}

impl AppState {
    pub fn new(db_pool: DbPool) -> AppResult<Self> {
        let store: Arc<dyn ReflectionStore> = Arc::new(SqliteReflectionStore::new(db_pool.clone()));
        Self::with_store(db_pool, store)
    }

    /// Builds the state over a caller-supplied reflection store.
    pub fn with_store(db_pool: DbPool, store: Arc<dyn ReflectionStore>) -> AppResult<Self> {
        let session = Arc::new(LocalSession::new());
        let provider: Arc<dyn SessionProvider> = session.clone();
        let notices = Arc::new(NoticeQueue::new());
        let linked_tasks = Arc::new(LinkedTaskChannel::new());

        let settings_service = Arc::new(SettingsService::new(db_pool.clone()));
        let settings = settings_service.get()?;

        let task_board = Arc::new(TaskBoard::new(
            Arc::clone(&notices),
            Arc::clone(&linked_tasks),
        ));
        let tracker_service = Arc::new(TrackerService::new(
            Arc::clone(&provider),
            Arc::clone(&notices),
            Arc::clone(&linked_tasks),
            settings.week_start,
        ));
        let reflection_service = Arc::new(ReflectionService::new(
            store,
            Arc::clone(&provider),
            Arc::clone(&notices),
            Local::now().date_naive(),
        ));

        Ok(Self {
            db_pool,
            session,
            notices,
            linked_tasks,
            task_board,
            tracker_service,
            project_service: Arc::new(ProjectService::new()),
            knowledge_service: Arc::new(KnowledgeService::new()),
            reflection_service,
            settings_service,
        })
    }

    pub fn db(&self) -> DbPool {
        self.db_pool.clone()
    }

    pub fn session(&self) -> Arc<LocalSession> {
        Arc::clone(&self.session)
    }

    pub fn notices(&self) -> Arc<NoticeQueue> {
        Arc::clone(&self.notices)
    }

    pub fn linked_tasks(&self) -> Arc<LinkedTaskChannel> {
        Arc::clone(&self.linked_tasks)
    }

    pub fn tasks(&self) -> Arc<TaskBoard> {
        Arc::clone(&self.task_board)
    }

    pub fn trackers(&self) -> Arc<TrackerService> {
        Arc::clone(&self.tracker_service)
    }

    pub fn projects(&self) -> Arc<ProjectService> {
        Arc::clone(&self.project_service)
    }

    pub fn knowledge(&self) -> Arc<KnowledgeService> {
        Arc::clone(&self.knowledge_service)
    }

    pub fn reflections(&self) -> Arc<ReflectionService> {
        Arc::clone(&self.reflection_service)
    }

    pub fn settings(&self) -> Arc<SettingsService> {
        Arc::clone(&self.settings_service)
    }

    /// Pushes the board's weekly-linked tasks into the current weekly tracker.
    pub fn propagate_linked_tasks(&self) -> AppResult<()> {
        if let Some(tracker) = self.tracker_service.sync_linked_tasks()? {
            debug!(target: "app::link", tracker_id = %tracker.id, "linked tasks propagated");
        }
        Ok(())
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl CommandError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<JsonValue>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details,
        }
    }
}

impl From<AppError> for CommandError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::Validation {
                message, details, ..
            } => CommandError::new("VALIDATION_ERROR", message, details),
            AppError::NotFound => CommandError::new("NOT_FOUND", "The requested record does not exist", None),
            AppError::Conflict { message } => CommandError::new("CONFLICT", message, None),
            AppError::Unauthenticated { action } => {
                warn!(target: "app::command", %action, "unauthenticated command");
                CommandError::new(
                    "UNAUTHENTICATED",
                    "Authentication required",
                    Some(serde_json::json!({ "action": action })),
                )
            }
            AppError::Persistence { operation, message } => {
                error!(target: "app::command", %operation, %message, "persistence error in command");
                CommandError::new(
                    "PERSISTENCE_ERROR",
                    message,
                    Some(serde_json::json!({ "operation": operation })),
                )
            }
            AppError::Database { message } => {
                error!(target: "app::command", %message, "database error in command");
                CommandError::new("UNKNOWN", message, None)
            }
            AppError::Serialization(error) => {
                error!(target: "app::command", error = %error, "serialization error in command");
                CommandError::new("UNKNOWN", "Serialization failed", None)
            }
            AppError::Io(error) => {
                error!(target: "app::command", error = %error, "io error in command");
                CommandError::new("UNKNOWN", "File system access failed", None)
            }
            AppError::Other(message) => {
                error!(target: "app::command", %message, "unexpected error in command");
                CommandError::new("UNKNOWN", message, None)
            }
        }
    }
}

async fn run_blocking<T: Send + 'static>(
    task: impl FnOnce() -> Result<T, AppError> + Send + 'static,
) -> CommandResult<T> {
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| CommandError::new("UNKNOWN", format!("background task failed: {err}"), None))?
        .map_err(CommandError::from)
}
