//! Content scoring heuristics.
//!
//! The score of a content item for a user is the sum of a fixed set of
//! additive rules, clamped to [0, 100]. Each rule that fires contributes a
//! human-readable reason, collected in rule order.

use crate::catalog::{Content, ContentType, Topic};
use crate::user::{LearningStyle, UserInterest, UserPreferences};
use chrono::{DateTime, Duration, Utc};

pub const INTEREST_WEIGHT: f64 = 40.0;
pub const DIFFICULTY_MATCH_POINTS: f64 = 20.0;
pub const STYLE_MATCH_POINTS: f64 = 15.0;
pub const QUALITY_POINTS: f64 = 10.0;
pub const RECENCY_POINTS: f64 = 5.0;
pub const SESSION_FIT_POINTS: f64 = 10.0;

pub const MAX_SCORE: f64 = 100.0;
pub const QUALITY_RATING_THRESHOLD: f64 = 4.0;
pub const RECENCY_WINDOW_DAYS: i64 = 7;
/// A learning session is assumed to take about a third of the daily goal.
pub const SESSION_GOAL_DIVISOR: f64 = 3.0;
pub const SESSION_FIT_TOLERANCE_MINUTES: f64 = 5.0;

/// Scores `content` for a user described by their interests and preferences.
///
/// `now` is passed in rather than read from the wall clock so that the
/// recency rule is deterministic under test.
pub fn score_content(
    content: &Content,
    topic: &Topic,
    interests: &[UserInterest],
    preferences: Option<&UserPreferences>,
    now: DateTime<Utc>,
) -> (f64, Vec<String>) {
    let mut score = 0.0;
    let mut reasons = Vec::new();

    if let Some(interest) = interests.iter().find(|i| i.topic_id == content.topic_id) {
        score += interest.strength * INTEREST_WEIGHT;
        reasons.push(format!("Matches your interest in {}", topic.name));
    }

    if let Some(preferences) = preferences {
        if preferences.difficulty_level == content.difficulty {
            score += DIFFICULTY_MATCH_POINTS;
            reasons.push("Matches your preferred difficulty level".to_string());
        }

        match (preferences.learning_style, content.content_type) {
            (LearningStyle::Visual, ContentType::Video) => {
                score += STYLE_MATCH_POINTS;
                reasons.push("Visual content matches your learning style".to_string());
            }
            (LearningStyle::Reading, ContentType::Article) => {
                score += STYLE_MATCH_POINTS;
                reasons.push("Reading content matches your learning style".to_string());
            }
            _ => {}
        }
    }

    if let Some(rating) = content.rating {
        if rating > QUALITY_RATING_THRESHOLD {
            score += QUALITY_POINTS;
            reasons.push("Highly rated content".to_string());
        }
    }

    if now.signed_duration_since(content.created) < Duration::days(RECENCY_WINDOW_DAYS) {
        score += RECENCY_POINTS;
        reasons.push("Recently added content".to_string());
    }

    if let Some(preferences) = preferences {
        if preferences.daily_goal_minutes > 0 {
            let ideal_minutes = preferences.daily_goal_minutes as f64 / SESSION_GOAL_DIVISOR;
            if (content.estimated_minutes as f64 - ideal_minutes).abs()
                <= SESSION_FIT_TOLERANCE_MINUTES
            {
                score += SESSION_FIT_POINTS;
                reasons.push("Perfect length for your learning sessions".to_string());
            }
        }
    }

    (score.min(MAX_SCORE), reasons)
}
