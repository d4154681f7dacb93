use chrono::{NaiveDate, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::project::{Milestone, Project, ProjectStatus, ProjectUpdate, TeamMember};
use crate::services::completion::completion_percentage;
use crate::services::state::VersionedState;

pub struct ProjectService {
    projects: VersionedState<Vec<Project>>,
}

impl Default for ProjectService {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectService {
    pub fn new() -> Self {
        Self {
            projects: VersionedState::new("projects", Vec::new()),
        }
    }

    pub fn list(&self) -> AppResult<Vec<Project>> {
        let projects = self.projects.snapshot()?;
        debug!(target: "app::project", count = projects.len(), "projects listed");
        Ok(projects)
    }

    pub fn get(&self, id: &str) -> AppResult<Option<Project>> {
        Ok(self
            .projects
            .snapshot()?
            .into_iter()
            .find(|project| project.id == id))
    }

    pub fn create_project(&self, title: &str) -> AppResult<Option<Project>> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(None);
        }

        let project = Project {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: String::new(),
            start_date: Utc::now(),
            end_date: None,
            status: ProjectStatus::Planning,
            team: Vec::new(),
            milestones: Vec::new(),
            budget: 0.0,
            resources: Vec::new(),
            risks: Vec::new(),
            completion_percentage: 0.0,
        };

        self.projects.update(|current| {
            let mut next = current.clone();
            next.push(project.clone());
            Some(next)
        })?;
        info!(target: "app::project", project_id = %project.id, "project created");
        Ok(Some(project))
    }

    pub fn toggle_milestone(&self, project_id: &str, milestone_id: &str) -> AppResult<Option<Project>> {
        let project = self.modify_project(project_id, |project| {
            let milestone = project
                .milestones
                .iter_mut()
                .find(|milestone| milestone.id == milestone_id)?;
            milestone.completed = !milestone.completed;
            Some(())
        })?;

        if project.is_some() {
            info!(target: "app::project", %project_id, %milestone_id, "milestone toggled");
        }
        Ok(project)
    }

    pub fn add_milestone(
        &self,
        project_id: &str,
        title: &str,
        due_date: Option<NaiveDate>,
    ) -> AppResult<Option<Project>> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(None);
        }

        self.modify_project(project_id, |project| {
            project.milestones.push(Milestone {
                id: Uuid::new_v4().to_string(),
                title: title.to_string(),
                due_date,
                completed: false,
            });
            Some(())
        })
    }

    pub fn add_team_member(&self, project_id: &str, name: &str, role: &str) -> AppResult<Option<Project>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        self.modify_project(project_id, |project| {
            project.team.push(TeamMember {
                name: name.to_string(),
                role: role.trim().to_string(),
            });
            Some(())
        })
    }

    pub fn update_project(&self, project_id: &str, update: ProjectUpdate) -> AppResult<Option<Project>> {
        let project = self.modify_project(project_id, |project| {
            apply_update(project, update);
            Some(())
        })?;

        if let Some(project) = &project {
            info!(target: "app::project", project_id = %project.id, status = %project.status, "project updated");
        }
        Ok(project)
    }

    /// Runs `f` on a copy of the project; `None` from `f` discards the change.
    fn modify_project<F>(&self, project_id: &str, f: F) -> AppResult<Option<Project>>
    where
        F: FnOnce(&mut Project) -> Option<()>,
    {
        let mut changed = None;
        self.projects.update(|current| {
            let index = current.iter().position(|project| project.id == project_id)?;
            let mut project = current[index].clone();
            f(&mut project)?;
            project.completion_percentage = completion_percentage(&project.milestones);

            let mut next = current.clone();
            next[index] = project.clone();
            changed = Some(project);
            Some(next)
        })?;
        Ok(changed)
    }
}

fn apply_update(project: &mut Project, update: ProjectUpdate) {
    if let Some(title) = update.title {
        let title = title.trim();
        if !title.is_empty() {
            project.title = title.to_string();
        }
    }
    if let Some(description) = update.description {
        project.description = description;
    }
    if let Some(status) = update.status {
        project.status = status;
    }
    if let Some(end_date) = update.end_date {
        project.end_date = end_date;
    }
    if let Some(budget) = update.budget {
        if budget.is_finite() && budget >= 0.0 {
            project.budget = budget;
        }
    }
    if let Some(text) = update.resources_text {
        project.resources = split_lines(&text);
    }
    if let Some(text) = update.risks_text {
        project.risks = split_lines(&text);
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
