use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::tracker::WeekStart;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BoardView {
    #[default]
    List,
    Kanban,
    Eisenhower,
}

impl BoardView {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoardView::List => "list",
            BoardView::Kanban => "kanban",
            BoardView::Eisenhower => "eisenhower",
        }
    }
}

impl fmt::Display for BoardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for BoardView {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "list" => Ok(BoardView::List),
            "kanban" => Ok(BoardView::Kanban),
            "eisenhower" => Ok(BoardView::Eisenhower),
            other => Err(format!("unsupported board view: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub week_start: WeekStart,
    /// Completed tasks shown in the list view before truncation.
    pub completed_preview_limit: usize,
    pub default_view: BoardView,
    pub updated_at: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            week_start: WeekStart::Monday,
            completed_preview_limit: 3,
            default_view: BoardView::List,
            updated_at: String::new(),
        }
    }
}
