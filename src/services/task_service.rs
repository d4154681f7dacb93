use std::sync::Arc;

use tracing::{debug, info};

use crate::error::AppResult;
use crate::models::task::{LinkedTaskSnapshot, Task, TaskInput, TaskStatus};
use crate::services::link_service::{link_notices, weekly_snapshots, LinkAction, LinkedTaskChannel};
use crate::services::notifier::NoticeQueue;
use crate::services::reorder::{
    apply_gesture, eisenhower_quadrants, list_view, status_columns, DragGesture,
    EisenhowerQuadrants, StatusColumns,
};
use crate::services::state::VersionedState;

/// Daily tasks in their persisted order.
pub struct TaskBoard {
    tasks: VersionedState<Vec<Task>>,
    notices: Arc<NoticeQueue>,
    linked: Arc<LinkedTaskChannel>,
}

impl TaskBoard {
    pub fn new(notices: Arc<NoticeQueue>, linked: Arc<LinkedTaskChannel>) -> Self {
        Self {
            tasks: VersionedState::new("tasks", Vec::new()),
            notices,
            linked,
        }
    }

    pub fn tasks(&self) -> AppResult<Vec<Task>> {
        let tasks = self.tasks.snapshot()?;
        debug!(target: "app::task", count = tasks.len(), "tasks listed");
        Ok(tasks)
    }

    /// Replaces the whole collection, e.g. when the shell restores a session.
    pub fn restore(&self, tasks: Vec<Task>) -> AppResult<()> {
        info!(target: "app::task", count = tasks.len(), "task board restored");
        self.tasks.replace(tasks)?;
        self.publish_linked()
    }

    pub fn create_task(&self, input: TaskInput) -> AppResult<Option<Task>> {
        if input.title.trim().is_empty() {
            debug!(target: "app::task", "ignoring task without a title");
            return Ok(None);
        }

        let task = build_task(uuid::Uuid::new_v4().to_string(), TaskStatus::Todo, input);
        self.tasks.update(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.push(task.clone());
            next.extend(current.iter().cloned());
            Some(next)
        })?;

        info!(target: "app::task", task_id = %task.id, "task created");
        self.notices.extend(link_notices(&task, LinkAction::Created));
        self.publish_linked()?;
        Ok(Some(task))
    }

    /// Replaces the editable fields of `id`; the status is kept.
    pub fn edit_task(&self, id: &str, input: TaskInput) -> AppResult<Option<Task>> {
        if input.title.trim().is_empty() {
            debug!(target: "app::task", task_id = %id, "ignoring edit without a title");
            return Ok(None);
        }

        let mut edited = None;
        self.tasks.update(|current| {
            let index = current.iter().position(|task| task.id == id)?;
            let task = build_task(id.to_string(), current[index].status, input);
            let mut next = current.clone();
            next[index] = task.clone();
            edited = Some(task);
            Some(next)
        })?;

        if let Some(task) = &edited {
            info!(target: "app::task", task_id = %task.id, "task edited");
            self.publish_linked()?;
        }
        Ok(edited)
    }

    pub fn complete_task(&self, id: &str) -> AppResult<Option<Task>> {
        self.set_status(id, TaskStatus::Completed)
    }

    /// Sets any status directly. `None` when the id is unknown or nothing changed.
    pub fn set_status(&self, id: &str, status: TaskStatus) -> AppResult<Option<Task>> {
        let mut changed = None;
        self.tasks.update(|current| {
            let index = current.iter().position(|task| task.id == id)?;
            if current[index].status == status {
                return None;
            }
            let mut next = current.clone();
            next[index].status = status;
            changed = Some(next[index].clone());
            Some(next)
        })?;

        if let Some(task) = &changed {
            info!(target: "app::task", task_id = %task.id, status = %status, "task status changed");
            if status.is_completed() {
                self.notices.extend(link_notices(task, LinkAction::Completed));
            }
            self.publish_linked()?;
        }
        Ok(changed)
    }

    /// Applies a finished drag. Returns whether the collection changed.
    pub fn apply_drag(&self, gesture: &DragGesture) -> AppResult<bool> {
        let mut newly_completed = None;
        let changed = self.tasks.update(|current| {
            let next = apply_gesture(current, gesture)?;
            let was_completed = current
                .iter()
                .any(|task| task.id == gesture.active_id && task.status.is_completed());
            if !was_completed {
                newly_completed = next
                    .iter()
                    .find(|task| task.id == gesture.active_id && task.status.is_completed())
                    .cloned();
            }
            Some(next)
        })?;

        if let Some(task) = &newly_completed {
            self.notices.extend(link_notices(task, LinkAction::Completed));
        }
        if changed.is_some() {
            self.publish_linked()?;
        }
        Ok(changed.is_some())
    }

    pub fn weekly_linked(&self) -> AppResult<Vec<LinkedTaskSnapshot>> {
        Ok(weekly_snapshots(&self.tasks.snapshot()?))
    }

    pub fn columns(&self) -> AppResult<StatusColumns> {
        Ok(status_columns(&self.tasks.snapshot()?))
    }

    pub fn list(&self, completed_limit: usize) -> AppResult<StatusColumns> {
        Ok(list_view(&self.tasks.snapshot()?, completed_limit))
    }

    pub fn quadrants(&self) -> AppResult<EisenhowerQuadrants> {
        Ok(eisenhower_quadrants(&self.tasks.snapshot()?))
    }

    fn publish_linked(&self) -> AppResult<()> {
        self.linked.publish(self.weekly_linked()?);
        Ok(())
    }
}

fn build_task(id: String, status: TaskStatus, input: TaskInput) -> Task {
    Task {
        id,
        title: input.title.trim().to_string(),
        description: normalize_text(input.description),
        objective: normalize_text(input.objective),
        priority: input.priority,
        status,
        is_important: input.is_important,
        is_urgent: input.is_urgent,
        start_date: input.start_date,
        end_date: input.end_date,
        time_frame: normalize_text(input.time_frame),
        quality: normalize_text(input.quality),
        dependencies: normalize_text(input.dependencies),
        resources: normalize_text(input.resources),
        linked_project: normalize_text(input.linked_project),
        linked_timeframes: input.linked_timeframes,
    }
}

fn normalize_text(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
