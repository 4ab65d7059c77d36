//! Per-user learning state: preferences, topic interests and recorded
//! learning sessions.

use crate::catalog::{ContentType, Difficulty};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningStyle {
    Visual,
    Auditory,
    Reading,
    Mixed,
}

impl LearningStyle {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            LearningStyle::Visual => "visual",
            LearningStyle::Auditory => "auditory",
            LearningStyle::Reading => "reading",
            LearningStyle::Mixed => "mixed",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "visual" => Some(LearningStyle::Visual),
            "auditory" => Some(LearningStyle::Auditory),
            "reading" => Some(LearningStyle::Reading),
            "mixed" => Some(LearningStyle::Mixed),
            _ => None,
        }
    }
}

/// One row per user. A `daily_goal_minutes` of 0 means no daily goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub difficulty_level: Difficulty,
    pub learning_style: LearningStyle,
    pub daily_goal_minutes: u32,
    pub morning_reminder: bool,
    pub reminder_time: Option<String>,
}

/// How attached a user is to a topic. Strength lives in [0, 1] and only ever
/// grows as engagement is recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInterest {
    pub user_id: usize,
    pub topic_id: String,
    pub strength: f64,
    pub preferred_content_types: Vec<ContentType>,
    pub average_session_length: Option<u32>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// A completed or abandoned study session on one content item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningSession {
    pub id: Option<usize>,
    pub user_id: usize,
    pub topic_id: String,
    pub content_id: String,
    pub duration_minutes: u32,
    pub completed: bool,
    pub score: Option<f64>,
    pub engagement_score: Option<f64>,
    pub created: DateTime<Utc>,
}
