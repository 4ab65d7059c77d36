//! Sqlite-backed catalog store.

use super::models::*;
use super::schema::CATALOG_VERSIONED_SCHEMAS;
use super::trait_def::CatalogStore;
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, Row, ToSql};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

const CONTENT_COLUMNS: &str = "id, topic_id, title, description, content_type, url, difficulty, \
     estimated_minutes, tags, embedding, view_count, rating, created, updated";

#[derive(Clone)]
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
}

fn migrate_if_needed(conn: &mut Connection) -> Result<()> {
    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

    let latest_version = CATALOG_VERSIONED_SCHEMAS.len() - 1;
    let latest_schema = &CATALOG_VERSIONED_SCHEMAS[latest_version];

    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if table_count == 0 {
        info!("Creating catalog db schema at version {}", latest_version);
        latest_schema.create(conn)?;
        return Ok(());
    }

    if db_version < BASE_DB_VERSION as i64 {
        anyhow::bail!(
            "Catalog database has unrecognized version {}, refusing to open",
            db_version
        );
    }

    let mut current_version = (db_version - BASE_DB_VERSION as i64) as usize;
    if current_version >= latest_version {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for schema in CATALOG_VERSIONED_SCHEMAS.iter().skip(current_version + 1) {
        if let Some(migration_fn) = schema.migration {
            info!(
                "Migrating catalog db from version {} to {}",
                current_version, schema.version
            );
            migration_fn(&tx)?;
            current_version = schema.version;
        }
    }
    tx.pragma_update(None, "user_version", BASE_DB_VERSION + current_version)?;
    tx.commit()?;
    Ok(())
}

impl SqliteCatalogStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let mut conn = Connection::open_with_flags(
            db_path.as_ref(),
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open catalog database")?;

        migrate_if_needed(&mut conn)?;

        let latest_schema = &CATALOG_VERSIONED_SCHEMAS[CATALOG_VERSIONED_SCHEMAS.len() - 1];
        latest_schema
            .validate(&conn)
            .context("Catalog database schema validation failed")?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute("PRAGMA foreign_keys = ON;", params![])?;

        let topic_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM topic", [], |r| r.get(0))
            .unwrap_or(0);
        let content_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM content", [], |r| r.get(0))
            .unwrap_or(0);
        info!(
            "Opened catalog: {} topics, {} content items",
            topic_count, content_count
        );

        Ok(SqliteCatalogStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

fn db_enum<T>(idx: usize, value: String, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    parse(&value).ok_or(rusqlite::Error::InvalidColumnType(idx, value, Type::Text))
}

fn map_topic_row(row: &Row) -> rusqlite::Result<Topic> {
    Ok(Topic {
        id: row.get(0)?,
        name: row.get(1)?,
        category: db_enum(2, row.get(2)?, TopicCategory::from_db_str)?,
        difficulty: db_enum(3, row.get(3)?, Difficulty::from_db_str)?,
        estimated_minutes: row.get(4)?,
        created: timestamp(row.get(5)?),
        updated: timestamp(row.get(6)?),
    })
}

fn map_content_row(row: &Row) -> rusqlite::Result<Content> {
    let tags: String = row.get(8)?;
    let embedding: Option<String> = row.get(9)?;
    Ok(Content {
        id: row.get(0)?,
        topic_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        content_type: db_enum(4, row.get(4)?, ContentType::from_db_str)?,
        url: row.get(5)?,
        difficulty: db_enum(6, row.get(6)?, Difficulty::from_db_str)?,
        estimated_minutes: row.get(7)?,
        tags: serde_json::from_str(&tags).unwrap_or_default(),
        embedding: embedding.and_then(|e| serde_json::from_str(&e).ok()),
        view_count: row.get::<_, i64>(10)? as u64,
        rating: row.get(11)?,
        created: timestamp(row.get(12)?),
        updated: timestamp(row.get(13)?),
    })
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

impl CatalogStore for SqliteCatalogStore {
    fn get_topic(&self, topic_id: &str) -> Result<Option<Topic>> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            "SELECT id, name, category, difficulty, estimated_minutes, created, updated \
             FROM topic WHERE id = ?1",
            params![topic_id],
            map_topic_row,
        ) {
            Ok(topic) => Ok(Some(topic)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn get_all_topics(&self) -> Result<Vec<Topic>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, category, difficulty, estimated_minutes, created, updated \
             FROM topic ORDER BY name",
        )?;
        let topics = stmt
            .query_map([], map_topic_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(topics)
    }

    fn get_content(&self, content_id: &str) -> Result<Option<Content>> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            &format!("SELECT {CONTENT_COLUMNS} FROM content WHERE id = ?1"),
            params![content_id],
            map_content_row,
        ) {
            Ok(content) => Ok(Some(content)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn find_content(&self, filter: &ContentFilter, limit: usize) -> Result<Vec<Content>> {
        if filter.is_vacuous() {
            return Ok(Vec::new());
        }

        let mut sql = format!(
            "SELECT {CONTENT_COLUMNS} FROM content WHERE topic_id IN ({})",
            placeholders(filter.topic_ids.len())
        );
        let mut values: Vec<Box<dyn ToSql>> = filter
            .topic_ids
            .iter()
            .map(|id| Box::new(id.clone()) as Box<dyn ToSql>)
            .collect();

        if !filter.exclude_ids.is_empty() {
            sql.push_str(&format!(
                " AND id NOT IN ({})",
                placeholders(filter.exclude_ids.len())
            ));
            for id in &filter.exclude_ids {
                values.push(Box::new(id.clone()));
            }
        }

        if let Some(types) = &filter.types {
            sql.push_str(&format!(
                " AND content_type IN ({})",
                placeholders(types.len())
            ));
            for content_type in types {
                values.push(Box::new(content_type.as_db_str()));
            }
        }

        // Sqlite sorts NULL ratings last in descending order. A negative
        // LIMIT means unbounded, so the cast must not wrap.
        sql.push_str(" ORDER BY rating DESC LIMIT ?");
        values.push(Box::new(i64::try_from(limit).unwrap_or(i64::MAX)));

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let content = stmt
            .query_map(
                params_from_iter(values.iter().map(|v| v.as_ref())),
                map_content_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(content)
    }

    fn best_content_for_topic(&self, topic_id: &str, max_minutes: u32) -> Result<Option<Content>> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            &format!(
                "SELECT {CONTENT_COLUMNS} FROM content \
                 WHERE topic_id = ?1 AND estimated_minutes <= ?2 \
                 ORDER BY rating DESC LIMIT 1"
            ),
            params![topic_id, max_minutes],
            map_content_row,
        ) {
            Ok(content) => Ok(Some(content)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn insert_topic(&self, topic: &Topic) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO topic (id, name, category, difficulty, estimated_minutes, created, updated) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                topic.id,
                topic.name,
                topic.category.as_db_str(),
                topic.difficulty.as_db_str(),
                topic.estimated_minutes,
                topic.created.timestamp(),
                topic.updated.timestamp(),
            ],
        )?;
        Ok(())
    }

    fn insert_content(&self, content: &Content) -> Result<()> {
        let tags = serde_json::to_string(&content.tags)?;
        let embedding = content
            .embedding
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO content ({CONTENT_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
            ),
            params![
                content.id,
                content.topic_id,
                content.title,
                content.description,
                content.content_type.as_db_str(),
                content.url,
                content.difficulty.as_db_str(),
                content.estimated_minutes,
                tags,
                embedding,
                content.view_count as i64,
                content.rating,
                content.created.timestamp(),
                content.updated.timestamp(),
            ],
        )?;
        Ok(())
    }

    fn get_topics_count(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM topic", [], |r| r.get(0))?;
        Ok(count as usize)
    }

    fn get_content_count(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM content", [], |r| r.get(0))?;
        Ok(count as usize)
    }
}
