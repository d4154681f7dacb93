use chrono::NaiveDate;

use crate::models::project::{Project, ProjectUpdate};

use super::{AppState, CommandResult};

pub async fn projects_list(state: &AppState) -> CommandResult<Vec<Project>> {
    Ok(state.projects().list()?)
}

pub async fn projects_create(state: &AppState, title: String) -> CommandResult<Option<Project>> {
    Ok(state.projects().create_project(&title)?)
}

pub async fn projects_update(
    state: &AppState,
    id: String,
    update: ProjectUpdate,
) -> CommandResult<Option<Project>> {
    Ok(state.projects().update_project(&id, update)?)
}

pub async fn projects_toggle_milestone(
    state: &AppState,
    project_id: String,
    milestone_id: String,
) -> CommandResult<Option<Project>> {
    Ok(state.projects().toggle_milestone(&project_id, &milestone_id)?)
}

pub async fn projects_add_milestone(
    state: &AppState,
    project_id: String,
    title: String,
    due_date: Option<NaiveDate>,
) -> CommandResult<Option<Project>> {
    Ok(state.projects().add_milestone(&project_id, &title, due_date)?)
}

pub async fn projects_add_member(
    state: &AppState,
    project_id: String,
    name: String,
    role: String,
) -> CommandResult<Option<Project>> {
    Ok(state.projects().add_team_member(&project_id, &name, &role)?)
}
