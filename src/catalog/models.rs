use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicCategory {
    Geography,
    Vocabulary,
    Technology,
    Custom,
}

impl TopicCategory {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            TopicCategory::Geography => "geography",
            TopicCategory::Vocabulary => "vocabulary",
            TopicCategory::Technology => "technology",
            TopicCategory::Custom => "custom",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "geography" => Some(TopicCategory::Geography),
            "vocabulary" => Some(TopicCategory::Vocabulary),
            "technology" => Some(TopicCategory::Technology),
            "custom" => Some(TopicCategory::Custom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "beginner" => Some(Difficulty::Beginner),
            "intermediate" => Some(Difficulty::Intermediate),
            "advanced" => Some(Difficulty::Advanced),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Article,
    Video,
    Quiz,
    Interactive,
    Flashcard,
}

impl ContentType {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ContentType::Article => "article",
            ContentType::Video => "video",
            ContentType::Quiz => "quiz",
            ContentType::Interactive => "interactive",
            ContentType::Flashcard => "flashcard",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "article" => Some(ContentType::Article),
            "video" => Some(ContentType::Video),
            "quiz" => Some(ContentType::Quiz),
            "interactive" => Some(ContentType::Interactive),
            "flashcard" => Some(ContentType::Flashcard),
            _ => None,
        }
    }
}

/// A learnable subject users can follow, e.g. "Italian vocabulary".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub category: TopicCategory,
    pub difficulty: Difficulty,
    pub estimated_minutes: u32,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// A single learnable item within a topic.
///
/// The embedding vector is persisted for future use but nothing reads it when
/// ranking content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub id: String,
    pub topic_id: String,
    pub title: String,
    pub description: Option<String>,
    pub content_type: ContentType,
    pub url: Option<String>,
    pub difficulty: Difficulty,
    pub estimated_minutes: u32,
    pub tags: Vec<String>,
    pub embedding: Option<Vec<f32>>,
    pub view_count: u64,
    pub rating: Option<f64>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Candidate selection criteria for content queries.
///
/// Every field is an explicit filter: content must belong to one of
/// `topic_ids`, must not be listed in `exclude_ids`, and, when `types` is
/// set, must have one of the listed types.
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    pub topic_ids: Vec<String>,
    pub exclude_ids: Vec<String>,
    pub types: Option<Vec<ContentType>>,
}

impl ContentFilter {
    /// A filter with no topics can never match anything.
    pub fn is_vacuous(&self) -> bool {
        self.topic_ids.is_empty()
    }
}
