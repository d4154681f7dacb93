use std::fmt;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TrackerKind {
    Weekly,
    Monthly,
}

impl TrackerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackerKind::Weekly => "weekly",
            TrackerKind::Monthly => "monthly",
        }
    }

    /// Word used in generated titles ("Week of ...", "Month of ...").
    pub fn period_label(&self) -> &'static str {
        match self {
            TrackerKind::Weekly => "Week",
            TrackerKind::Monthly => "Month",
        }
    }

    pub fn format_period_start(&self, start: NaiveDate) -> String {
        match self {
            TrackerKind::Weekly => start.format("%b %-d, %Y").to_string(),
            TrackerKind::Monthly => start.format("%B %Y").to_string(),
        }
    }

    /// Advances a period start by exactly one unit.
    pub fn advance(&self, start: NaiveDate) -> Option<NaiveDate> {
        match self {
            TrackerKind::Weekly => start.checked_add_days(Days::new(7)),
            TrackerKind::Monthly => start.checked_add_months(Months::new(1)),
        }
    }

    /// Start of the period containing `day`.
    pub fn period_start_of(&self, day: NaiveDate, week_start: WeekStart) -> NaiveDate {
        match self {
            TrackerKind::Weekly => {
                let offset = match week_start {
                    WeekStart::Monday => day.weekday().num_days_from_monday(),
                    WeekStart::Sunday => day.weekday().num_days_from_sunday(),
                };
                day - chrono::Duration::days(i64::from(offset))
            }
            TrackerKind::Monthly => day.with_day(1).unwrap_or(day),
        }
    }

    pub fn period_end(&self, start: NaiveDate) -> NaiveDate {
        self.advance(start)
            .and_then(|next| next.pred_opt())
            .unwrap_or(start)
    }
}

impl fmt::Display for TrackerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TrackerKind {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "weekly" => Ok(TrackerKind::Weekly),
            "monthly" => Ok(TrackerKind::Monthly),
            other => Err(format!("unsupported tracker kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

impl WeekStart {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeekStart::Monday => "monday",
            WeekStart::Sunday => "sunday",
        }
    }
}

impl TryFrom<&str> for WeekStart {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "monday" => Ok(WeekStart::Monday),
            "sunday" => Ok(WeekStart::Sunday),
            other => Err(format!("unsupported week start: {other}")),
        }
    }
}

/// Checkable child of a tracker: a weekly task or a monthly outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    /// Id of the daily task this item mirrors, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_task_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tracker {
    pub id: String,
    pub kind: TrackerKind,
    pub period_start: NaiveDate,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub north_star: String,
    #[serde(default)]
    pub reflection: String,
    #[serde(default)]
    pub wins: String,
    #[serde(default)]
    pub challenges: String,
    #[serde(default)]
    pub linked_projects: Vec<String>,
    #[serde(default)]
    pub items: Vec<SubItem>,
    #[serde(default)]
    pub completion_percentage: f64,
}

impl Tracker {
    pub fn period_end(&self) -> NaiveDate {
        self.kind.period_end(self.period_start)
    }

    pub fn completed_count(&self) -> usize {
        self.items.iter().filter(|item| item.completed).count()
    }

    pub fn find_item(&self, item_id: &str) -> Option<&SubItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn find_linked_item(&self, task_id: &str) -> Option<&SubItem> {
        self.items
            .iter()
            .find(|item| item.source_task_id.as_deref() == Some(task_id))
    }
}

/// Field edits for a tracker; `None` leaves a field untouched.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackerFieldsUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub north_star: Option<String>,
    #[serde(default)]
    pub reflection: Option<String>,
    #[serde(default)]
    pub wins: Option<String>,
    #[serde(default)]
    pub challenges: Option<String>,
    #[serde(default)]
    pub linked_projects: Option<Vec<String>>,
}

impl TrackerFieldsUpdate {
    pub fn is_empty(&self) -> bool {
        self == &TrackerFieldsUpdate::default()
    }
}
