use anyhow::Result;

use super::models::{Content, ContentFilter, Topic};

/// Read/write access to the content catalog.
pub trait CatalogStore: Send + Sync {
    /// Returns the topic with the given id, None if it doesn't exist.
    fn get_topic(&self, topic_id: &str) -> Result<Option<Topic>>;

    /// Returns all topics, ordered by name.
    fn get_all_topics(&self) -> Result<Vec<Topic>>;

    /// Returns the content item with the given id, None if it doesn't exist.
    fn get_content(&self, content_id: &str) -> Result<Option<Content>>;

    /// Returns up to `limit` content items matching the filter, ordered by
    /// descending rating (unrated items last). A vacuous filter matches
    /// nothing and returns an empty list without querying.
    fn find_content(&self, filter: &ContentFilter, limit: usize) -> Result<Vec<Content>>;

    /// Returns the highest-rated content item of a topic that fits within
    /// `max_minutes`, None when nothing fits.
    fn best_content_for_topic(&self, topic_id: &str, max_minutes: u32) -> Result<Option<Content>>;

    fn insert_topic(&self, topic: &Topic) -> Result<()>;

    fn insert_content(&self, content: &Content) -> Result<()>;

    fn get_topics_count(&self) -> Result<usize>;

    fn get_content_count(&self) -> Result<usize>;
}
