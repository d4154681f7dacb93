//! One-way propagation of daily tasks into trackers.
//!
//! The task board publishes weekly-linked task snapshots onto a shared
//! [`LinkedTaskChannel`]; the tracker side reads them and reconciles its most
//! recent weekly tracker. Toggling a weekly sub-item never writes back to the
//! source task.

use std::sync::RwLock;

use tracing::{debug, info};
use uuid::Uuid;

use crate::models::notice::Notice;
use crate::models::task::{LinkedTaskSnapshot, LinkedTimeframe, Task};
use crate::models::tracker::{SubItem, Tracker};
use crate::services::completion::completion_percentage;

/// Shared handoff of weekly-linked tasks between the board and the trackers.
#[derive(Debug, Default)]
pub struct LinkedTaskChannel {
    tasks: RwLock<Vec<LinkedTaskSnapshot>>,
}

impl LinkedTaskChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, tasks: Vec<LinkedTaskSnapshot>) {
        debug!(target: "app::link", count = tasks.len(), "publishing weekly-linked tasks");
        if let Ok(mut guard) = self.tasks.write() {
            *guard = tasks;
        }
    }

    pub fn snapshot(&self) -> Vec<LinkedTaskSnapshot> {
        self.tasks
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    Created,
    Completed,
}

/// One notice per timeframe the task is linked to.
pub fn link_notices(task: &Task, action: LinkAction) -> Vec<Notice> {
    task.linked_timeframes
        .iter()
        .map(|timeframe| match action {
            LinkAction::Created => Notice::info(
                "Task Linked",
                format!("Task \"{}\" linked to {}", task.title, timeframe.display_name()),
            ),
            LinkAction::Completed => Notice::info(
                "Task Completed",
                format!("Task marked as complete in {}", timeframe.display_name()),
            ),
        })
        .collect()
}

/// Weekly-linked tasks as handed to the tracker side.
pub fn weekly_snapshots(tasks: &[Task]) -> Vec<LinkedTaskSnapshot> {
    tasks
        .iter()
        .filter(|task| task.is_linked_to(LinkedTimeframe::Weekly))
        .map(LinkedTaskSnapshot::from)
        .collect()
}

/// Reconciles a weekly tracker with the linked tasks.
///
/// Missing tasks are appended and stale completion flags are refreshed.
/// Returns `None` when the tracker already matches.
pub fn sync_weekly_items(
    tracker: &Tracker,
    linked: &[LinkedTaskSnapshot],
) -> Option<(Tracker, Vec<Notice>)> {
    let mut next = tracker.clone();
    let mut notices = Vec::new();

    for task in linked {
        let completed = task.status.is_completed();
        let existing = next
            .items
            .iter()
            .position(|item| item.source_task_id.as_deref() == Some(task.id.as_str()));

        match existing {
            Some(index) if next.items[index].completed != completed => {
                next.items[index].completed = completed;
                notices.push(Notice::info(
                    "Task Updated",
                    format!(
                        "Task \"{}\" marked as {}",
                        task.title,
                        if completed { "complete" } else { "incomplete" }
                    ),
                ));
            }
            Some(_) => {}
            None => {
                next.items.push(SubItem {
                    id: Uuid::new_v4().to_string(),
                    title: task.title.clone(),
                    completed,
                    source_task_id: Some(task.id.clone()),
                });
                notices.push(Notice::info(
                    "Task Added",
                    format!("Task \"{}\" added to Weekly Tracker", task.title),
                ));
            }
        }
    }

    if notices.is_empty() {
        return None;
    }

    next.completion_percentage = completion_percentage(&next.items);
    info!(
        target: "app::link",
        tracker_id = %next.id,
        changes = notices.len(),
        completion = next.completion_percentage,
        "weekly tracker synced with linked tasks"
    );
    Some((next, notices))
}
