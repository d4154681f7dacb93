use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskPriority {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(format!("unsupported task priority: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "todo" => Ok(TaskStatus::Todo),
            "in-progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(format!("unsupported task status: {other}")),
        }
    }
}

/// Tracker a task is mirrored into.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LinkedTimeframe {
    Weekly,
    Monthly,
    Projects,
}

impl LinkedTimeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkedTimeframe::Weekly => "weekly",
            LinkedTimeframe::Monthly => "monthly",
            LinkedTimeframe::Projects => "projects",
        }
    }

    /// Name shown to the user in link notices.
    pub fn display_name(&self) -> &'static str {
        match self {
            LinkedTimeframe::Weekly => "Weekly Tracker",
            LinkedTimeframe::Monthly => "Monthly Tracker",
            LinkedTimeframe::Projects => "Projects",
        }
    }
}

impl fmt::Display for LinkedTimeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for LinkedTimeframe {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "weekly" => Ok(LinkedTimeframe::Weekly),
            "monthly" => Ok(LinkedTimeframe::Monthly),
            "projects" => Ok(LinkedTimeframe::Projects),
            other => Err(format!("unsupported linked timeframe: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub is_important: bool,
    #[serde(default)]
    pub is_urgent: bool,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time_frame: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub dependencies: Option<String>,
    #[serde(default)]
    pub resources: Option<String>,
    #[serde(default)]
    pub linked_project: Option<String>,
    #[serde(
        default,
        alias = "linkedTimeframe",
        deserialize_with = "deserialize_timeframes"
    )]
    pub linked_timeframes: BTreeSet<LinkedTimeframe>,
}

impl Task {
    pub fn is_linked_to(&self, timeframe: LinkedTimeframe) -> bool {
        self.linked_timeframes.contains(&timeframe)
    }

    /// End date if present, otherwise the start date.
    pub fn due_date(&self) -> Option<NaiveDate> {
        self.end_date
            .or(self.start_date)
            .map(|instant| instant.date_naive())
    }
}

/// Accepts either a list of tags or a single tag, the shapes older payloads used.
fn deserialize_timeframes<'de, D>(deserializer: D) -> Result<BTreeSet<LinkedTimeframe>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    let raw = Option::<OneOrMany>::deserialize(deserializer)?;
    let values = match raw {
        None => Vec::new(),
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
    };

    Ok(parse_timeframes(values))
}

pub fn parse_timeframes<I, S>(values: I) -> BTreeSet<LinkedTimeframe>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .filter_map(|value| match LinkedTimeframe::try_from(value.as_ref()) {
            Ok(timeframe) => Some(timeframe),
            Err(reason) => {
                warn!(target: "app::model", %reason, "dropping linked timeframe");
                None
            }
        })
        .collect()
}

/// Form payload for creating or editing a task.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub is_important: bool,
    #[serde(default)]
    pub is_urgent: bool,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time_frame: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub dependencies: Option<String>,
    #[serde(default)]
    pub resources: Option<String>,
    #[serde(default)]
    pub linked_project: Option<String>,
    #[serde(
        default,
        alias = "linkedTimeframe",
        deserialize_with = "deserialize_timeframes"
    )]
    pub linked_timeframes: BTreeSet<LinkedTimeframe>,
}

/// Minimal view of a task handed to the weekly tracker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LinkedTaskSnapshot {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
}

impl From<&Task> for LinkedTaskSnapshot {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            status: task.status,
        }
    }
}
