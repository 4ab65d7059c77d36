use super::service::Recommender;
use anyhow::Result;
use serde::Serialize;

pub const DEFAULT_ROUTINE_MINUTES: u32 = 25;

/// The routine draws from the user's strongest interests only.
pub const ROUTINE_TOPIC_COUNT: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct RoutineItem {
    pub topic_name: String,
    pub content_title: String,
    pub estimated_minutes: u32,
    pub content_id: String,
}

impl Recommender {
    /// Builds a short study plan for the morning: walk the user's top
    /// interests in strength order and greedily pick the best content item
    /// of each topic that still fits in the remaining time budget. The
    /// total never exceeds `total_minutes`.
    pub fn generate_morning_routine(
        &self,
        user_id: usize,
        total_minutes: u32,
    ) -> Result<Vec<RoutineItem>> {
        let interests = self.user_store.get_user_interests(user_id)?;

        let mut remaining = total_minutes;
        let mut routine = Vec::new();
        for interest in interests.iter().take(ROUTINE_TOPIC_COUNT) {
            if remaining == 0 {
                break;
            }
            let Some(content) = self
                .catalog_store
                .best_content_for_topic(&interest.topic_id, remaining)?
            else {
                continue;
            };
            let Some(topic) = self.catalog_store.get_topic(&interest.topic_id)? else {
                continue;
            };
            remaining -= content.estimated_minutes;
            routine.push(RoutineItem {
                topic_name: topic.name,
                content_title: content.title,
                estimated_minutes: content.estimated_minutes,
                content_id: content.id,
            });
        }
        Ok(routine)
    }
}
