//! Test fixture creation for the catalog and user databases.

use super::constants::*;
use anyhow::Result;
use chrono::Utc;
use imparo_server::catalog::{
    CatalogStore, Content, ContentType, Difficulty, SqliteCatalogStore, Topic, TopicCategory,
};
use imparo_server::user::{SqliteUserStore, UserManager};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn topic(
    id: &str,
    name: &str,
    category: TopicCategory,
    difficulty: Difficulty,
    estimated_minutes: u32,
) -> Topic {
    let now = Utc::now();
    Topic {
        id: id.to_string(),
        name: name.to_string(),
        category,
        difficulty,
        estimated_minutes,
        created: now,
        updated: now,
    }
}

fn content(
    id: &str,
    topic_id: &str,
    title: &str,
    content_type: ContentType,
    difficulty: Difficulty,
    estimated_minutes: u32,
    rating: Option<f64>,
) -> Content {
    let now = Utc::now();
    Content {
        id: id.to_string(),
        topic_id: topic_id.to_string(),
        title: title.to_string(),
        description: Some(format!("Description of {}", title)),
        content_type,
        url: None,
        difficulty,
        estimated_minutes,
        tags: vec!["test".to_string()],
        embedding: None,
        view_count: 0,
        rating,
        created: now,
        updated: now,
    }
}

/// Creates a temporary catalog database with 3 topics and 4 content items.
/// Returns (temp_dir, catalog_db_path).
pub fn create_test_catalog() -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    let catalog_db_path = dir.path().join("catalog.db");

    let store = SqliteCatalogStore::new(&catalog_db_path)?;

    store.insert_topic(&topic(
        TOPIC_ITALIAN_ID,
        TOPIC_ITALIAN_NAME,
        TopicCategory::Vocabulary,
        Difficulty::Beginner,
        15,
    ))?;
    store.insert_topic(&topic(
        TOPIC_GEOGRAPHY_ID,
        TOPIC_GEOGRAPHY_NAME,
        TopicCategory::Geography,
        Difficulty::Beginner,
        10,
    ))?;
    store.insert_topic(&topic(
        TOPIC_RUST_ID,
        TOPIC_RUST_NAME,
        TopicCategory::Technology,
        Difficulty::Intermediate,
        20,
    ))?;

    store.insert_content(&content(
        CONTENT_ITALIAN_ARTICLE_ID,
        TOPIC_ITALIAN_ID,
        "Italian greetings",
        ContentType::Article,
        Difficulty::Beginner,
        10,
        Some(4.5),
    ))?;
    store.insert_content(&content(
        CONTENT_ITALIAN_VIDEO_ID,
        TOPIC_ITALIAN_ID,
        "Counting in Italian",
        ContentType::Video,
        Difficulty::Beginner,
        10,
        Some(3.5),
    ))?;
    store.insert_content(&content(
        CONTENT_GEOGRAPHY_QUIZ_ID,
        TOPIC_GEOGRAPHY_ID,
        "European capitals quiz",
        ContentType::Quiz,
        Difficulty::Beginner,
        10,
        Some(4.2),
    ))?;
    store.insert_content(&content(
        CONTENT_RUST_ARTICLE_ID,
        TOPIC_RUST_ID,
        "Ownership and borrowing",
        ContentType::Article,
        Difficulty::Intermediate,
        30,
        Some(4.8),
    ))?;

    Ok((dir, catalog_db_path))
}

/// Creates a temporary user database with two password-authenticated users.
/// Returns (temp_dir, user_db_path).
pub fn create_test_db_with_users() -> Result<(TempDir, PathBuf)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("user.db");

    {
        let store = Arc::new(SqliteUserStore::new(&db_path)?);
        let manager = UserManager::new(store);

        manager.add_user(TEST_USER)?;
        manager.create_password_credentials(TEST_USER, TEST_PASS)?;

        manager.add_user(OTHER_USER)?;
        manager.create_password_credentials(OTHER_USER, OTHER_PASS)?;
    }

    Ok((temp_dir, db_path))
}
