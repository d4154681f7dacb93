use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EqCategory {
    Empathy,
    SocialSkills,
    SelfRegulation,
    SelfAwareness,
}

impl EqCategory {
    pub const ALL: [EqCategory; 4] = [
        EqCategory::Empathy,
        EqCategory::SocialSkills,
        EqCategory::SelfRegulation,
        EqCategory::SelfAwareness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EqCategory::Empathy => "empathy",
            EqCategory::SocialSkills => "social_skills",
            EqCategory::SelfRegulation => "self_regulation",
            EqCategory::SelfAwareness => "self_awareness",
        }
    }

    /// Built-in practice shown until the user has stored their own.
    pub fn default_item(&self) -> EqReflectionItem {
        let (title, ideal_time, task, reason) = match self {
            EqCategory::Empathy => (
                "Empathy",
                "Late Afternoon (4:00 – 6:00 PM)",
                "During a conversation, say: \"That makes sense,\" to validate someone's feelings.",
                "Simple validation strengthens emotional connection and understanding.",
            ),
            EqCategory::SocialSkills => (
                "Social Skills",
                "Evening (7:00 – 9:00 PM)",
                "Share a quick voice note or video message instead of text with someone.",
                "Adds tone and warmth to communication, enhancing relational depth.",
            ),
            EqCategory::SelfRegulation => (
                "Self-Regulation",
                "Mid-morning (10:00 – 11:00 AM)",
                "Pause during a moment of stress and slowly trace a square in the air with your finger as you breathe.",
                "Combining movement and breath engages focus and eases tension.",
            ),
            EqCategory::SelfAwareness => (
                "Self-Awareness",
                "Morning (7:00 – 9:00 AM)",
                "Write: \"An emotion I often dismiss but need to listen to more is ______.\"",
                "Recognizing ignored emotions helps uncover valuable inner signals.",
            ),
        };

        EqReflectionItem {
            category: *self,
            title: title.to_string(),
            ideal_time: ideal_time.to_string(),
            task: task.to_string(),
            reason: reason.to_string(),
            completed: false,
        }
    }
}

impl fmt::Display for EqCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EqCategory {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "empathy" => Ok(EqCategory::Empathy),
            "social_skills" => Ok(EqCategory::SocialSkills),
            "self_regulation" => Ok(EqCategory::SelfRegulation),
            "self_awareness" => Ok(EqCategory::SelfAwareness),
            other => Err(format!("unsupported eq category: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EqReflectionItem {
    #[serde(rename = "type")]
    pub category: EqCategory,
    pub title: String,
    pub ideal_time: String,
    pub task: String,
    pub reason: String,
    #[serde(default)]
    pub completed: bool,
}

/// One item per category for a calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EqReflection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub date: NaiveDate,
    pub items: BTreeMap<EqCategory, EqReflectionItem>,
}

impl EqReflection {
    pub fn with_defaults(date: NaiveDate) -> Self {
        Self {
            id: None,
            date,
            items: default_items(),
        }
    }

    pub fn item(&self, category: EqCategory) -> Option<&EqReflectionItem> {
        self.items.get(&category)
    }

    pub fn completed_count(&self) -> usize {
        self.items.values().filter(|item| item.completed).count()
    }
}

pub fn default_items() -> BTreeMap<EqCategory, EqReflectionItem> {
    EqCategory::ALL
        .iter()
        .map(|category| (*category, category.default_item()))
        .collect()
}

/// Row as held by the persistence boundary; `items` is the raw JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredReflection {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub items: String,
    pub updated_at: String,
}
