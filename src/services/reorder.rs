//! Drag-and-drop semantics over the flat task collection.
//!
//! The flat collection is the persisted order. Status columns and Eisenhower
//! quadrants are order-preserving filters of it, so moving by id here keeps
//! every view's relative order consistent.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::task::{Task, TaskStatus};

/// Where a drag ended, as interpreted by the gesture layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum DropTarget {
    /// Dropped onto another card.
    Item(String),
    /// Dropped onto a status column.
    Column(TaskStatus),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragGesture {
    pub active_id: String,
    /// `None` when the drop landed outside any valid target.
    #[serde(default)]
    pub target: Option<DropTarget>,
}

impl DragGesture {
    pub fn onto_item(active_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            active_id: active_id.into(),
            target: Some(DropTarget::Item(target_id.into())),
        }
    }

    pub fn onto_column(active_id: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            active_id: active_id.into(),
            target: Some(DropTarget::Column(status)),
        }
    }

    pub fn cancelled(active_id: impl Into<String>) -> Self {
        Self {
            active_id: active_id.into(),
            target: None,
        }
    }
}

/// Anything the engine can reorder.
pub trait Identified {
    fn ident(&self) -> &str;
}

impl Identified for Task {
    fn ident(&self) -> &str {
        &self.id
    }
}

/// Removes `source_id` and reinserts it at the former index of `target_id`.
///
/// Returns `None` when nothing changes: same id, or either id unknown.
pub fn reorder_within<T>(items: &[T], source_id: &str, target_id: &str) -> Option<Vec<T>>
where
    T: Identified + Clone,
{
    if source_id == target_id {
        return None;
    }

    let from = items.iter().position(|item| item.ident() == source_id)?;
    let to = items.iter().position(|item| item.ident() == target_id)?;

    let mut next = items.to_vec();
    let moved = next.remove(from);
    next.insert(to, moved);
    Some(next)
}

/// Sets only the source task's status. `None` when unknown or unchanged.
pub fn move_to_column(tasks: &[Task], source_id: &str, status: TaskStatus) -> Option<Vec<Task>> {
    let current = tasks.iter().find(|task| task.id == source_id)?;
    if current.status == status {
        return None;
    }

    Some(
        tasks
            .iter()
            .map(|task| {
                if task.id == source_id {
                    Task {
                        status,
                        ..task.clone()
                    }
                } else {
                    task.clone()
                }
            })
            .collect(),
    )
}

/// Interprets a finished gesture. `None` means the state is unchanged.
pub fn apply_gesture(tasks: &[Task], gesture: &DragGesture) -> Option<Vec<Task>> {
    let outcome = match gesture.target.as_ref() {
        None => None,
        Some(DropTarget::Item(target_id)) => {
            reorder_within(tasks, &gesture.active_id, target_id)
        }
        Some(DropTarget::Column(status)) => move_to_column(tasks, &gesture.active_id, *status),
    };

    debug!(
        target: "app::reorder",
        active_id = %gesture.active_id,
        target = ?gesture.target,
        changed = outcome.is_some(),
        "drag gesture applied"
    );
    outcome
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusColumns {
    pub todo: Vec<Task>,
    pub in_progress: Vec<Task>,
    pub completed: Vec<Task>,
}

impl StatusColumns {
    pub fn column(&self, status: TaskStatus) -> &[Task] {
        match status {
            TaskStatus::Todo => &self.todo,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::Completed => &self.completed,
        }
    }
}

/// Kanban partition; each column keeps the flat order.
pub fn status_columns(tasks: &[Task]) -> StatusColumns {
    let mut columns = StatusColumns::default();
    for task in tasks {
        match task.status {
            TaskStatus::Todo => columns.todo.push(task.clone()),
            TaskStatus::InProgress => columns.in_progress.push(task.clone()),
            TaskStatus::Completed => columns.completed.push(task.clone()),
        }
    }
    columns
}

/// List view: like the kanban partition, with the completed section truncated.
pub fn list_view(tasks: &[Task], completed_limit: usize) -> StatusColumns {
    let mut columns = status_columns(tasks);
    columns.completed.truncate(completed_limit);
    columns
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EisenhowerQuadrants {
    pub urgent_important: Vec<Task>,
    pub important_not_urgent: Vec<Task>,
    pub urgent_not_important: Vec<Task>,
    pub neither: Vec<Task>,
}

pub fn eisenhower_quadrants(tasks: &[Task]) -> EisenhowerQuadrants {
    let mut quadrants = EisenhowerQuadrants::default();
    for task in tasks {
        let bucket = match (task.is_urgent, task.is_important) {
            (true, true) => &mut quadrants.urgent_important,
            (false, true) => &mut quadrants.important_not_urgent,
            (true, false) => &mut quadrants.urgent_not_important,
            (false, false) => &mut quadrants.neither,
        };
        bucket.push(task.clone());
    }
    quadrants
}
