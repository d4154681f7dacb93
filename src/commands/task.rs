use serde::Serialize;
use tracing::debug;

use crate::models::settings::BoardView;
use crate::models::task::{Task, TaskInput, TaskStatus};
use crate::services::reorder::{DragGesture, EisenhowerQuadrants, StatusColumns};

use super::{run_blocking, AppState, CommandResult};

/// Board contents shaped for the requested view.
#[derive(Debug, Serialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum BoardSnapshot {
    List { columns: StatusColumns },
    Kanban { columns: StatusColumns },
    Eisenhower { quadrants: EisenhowerQuadrants },
}

pub async fn tasks_list(state: &AppState) -> CommandResult<Vec<Task>> {
    Ok(state.tasks().tasks()?)
}

pub async fn tasks_board(state: &AppState, view: Option<BoardView>) -> CommandResult<BoardSnapshot> {
    let settings_state = state.clone();
    let settings = run_blocking(move || settings_state.settings().get()).await?;
    let view = view.unwrap_or(settings.default_view);
    debug!(target: "app::command", view = %view, "building board snapshot");

    let board = state.tasks();
    let snapshot = match view {
        BoardView::List => BoardSnapshot::List {
            columns: board.list(settings.completed_preview_limit)?,
        },
        BoardView::Kanban => BoardSnapshot::Kanban {
            columns: board.columns()?,
        },
        BoardView::Eisenhower => BoardSnapshot::Eisenhower {
            quadrants: board.quadrants()?,
        },
    };
    Ok(snapshot)
}

pub async fn tasks_create(state: &AppState, input: TaskInput) -> CommandResult<Option<Task>> {
    let created = state.tasks().create_task(input)?;
    if created.is_some() {
        state.propagate_linked_tasks()?;
    }
    Ok(created)
}

pub async fn tasks_edit(state: &AppState, id: String, input: TaskInput) -> CommandResult<Option<Task>> {
    let edited = state.tasks().edit_task(&id, input)?;
    if edited.is_some() {
        state.propagate_linked_tasks()?;
    }
    Ok(edited)
}

pub async fn tasks_complete(state: &AppState, id: String) -> CommandResult<Option<Task>> {
    let completed = state.tasks().complete_task(&id)?;
    if completed.is_some() {
        state.propagate_linked_tasks()?;
    }
    Ok(completed)
}

pub async fn tasks_set_status(
    state: &AppState,
    id: String,
    status: TaskStatus,
) -> CommandResult<Option<Task>> {
    let changed = state.tasks().set_status(&id, status)?;
    if changed.is_some() {
        state.propagate_linked_tasks()?;
    }
    Ok(changed)
}

pub async fn tasks_drag(state: &AppState, gesture: DragGesture) -> CommandResult<bool> {
    let changed = state.tasks().apply_drag(&gesture)?;
    if changed {
        state.propagate_linked_tasks()?;
    }
    Ok(changed)
}
