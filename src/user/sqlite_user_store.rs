use crate::catalog::{ContentType, Difficulty};
use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, BASE_DB_VERSION,
    DEFAULT_TIMESTAMP,
};
use crate::user::*;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use std::{
    path::Path,
    str::FromStr,
    sync::{Arc, Mutex},
    time::SystemTime,
};
use tracing::info;

const USER_FK: ForeignKey = ForeignKey {
    foreign_table: "user",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

/// V 0
const USER_TABLE_V_0: Table = Table {
    name: "user",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("handle", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[("idx_user_handle", "handle")],
};
const AUTH_TOKEN_TABLE_V_0: Table = Table {
    name: "auth_token",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("value", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    unique_constraints: &[],
    indices: &[("idx_auth_token_value", "value")],
};
const USER_PASSWORD_CREDENTIALS_V_0: Table = Table {
    name: "user_password_credentials",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            is_unique = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("salt", &SqlType::Text, non_null = true),
        sqlite_column!("hash", &SqlType::Text, non_null = true),
        sqlite_column!("hasher", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    unique_constraints: &[],
    indices: &[],
};

/// V 1
const USER_PREFERENCES_TABLE_V_1: Table = Table {
    name: "user_preferences",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            is_unique = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("difficulty_level", &SqlType::Text, non_null = true),
        sqlite_column!("learning_style", &SqlType::Text, non_null = true),
        sqlite_column!("daily_goal_minutes", &SqlType::Integer, non_null = true),
        sqlite_column!("morning_reminder", &SqlType::Integer, non_null = true),
        sqlite_column!("reminder_time", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[],
};
const USER_INTEREST_TABLE_V_1: Table = Table {
    name: "user_interest",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("topic_id", &SqlType::Text, non_null = true),
        sqlite_column!("strength", &SqlType::Real, non_null = true),
        sqlite_column!(
            "preferred_content_types",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'[]'")
        ),
        sqlite_column!("average_session_length", &SqlType::Integer),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[&["user_id", "topic_id"]],
    indices: &[("idx_user_interest_user_id", "user_id")],
};
const LEARNING_SESSION_TABLE_V_1: Table = Table {
    name: "learning_session",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("topic_id", &SqlType::Text, non_null = true),
        sqlite_column!("content_id", &SqlType::Text, non_null = true),
        sqlite_column!("duration_minutes", &SqlType::Integer, non_null = true),
        sqlite_column!("completed", &SqlType::Integer, non_null = true),
        sqlite_column!("score", &SqlType::Real),
        sqlite_column!("engagement_score", &SqlType::Real),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[("idx_learning_session_user_id", "user_id")],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 0,
        tables: &[
            USER_TABLE_V_0,
            AUTH_TOKEN_TABLE_V_0,
            USER_PASSWORD_CREDENTIALS_V_0,
        ],
        migration: None,
    },
    VersionedSchema {
        version: 1,
        tables: &[
            USER_TABLE_V_0,
            AUTH_TOKEN_TABLE_V_0,
            USER_PASSWORD_CREDENTIALS_V_0,
            USER_PREFERENCES_TABLE_V_1,
            USER_INTEREST_TABLE_V_1,
            LEARNING_SESSION_TABLE_V_1,
        ],
        migration: Some(|conn: &Connection| {
            USER_PREFERENCES_TABLE_V_1.create(conn)?;
            USER_INTEREST_TABLE_V_1.create(conn)?;
            LEARNING_SESSION_TABLE_V_1.create(conn)?;
            Ok(())
        }),
    },
];

#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = if db_path.as_ref().exists() {
            Connection::open_with_flags(
                db_path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?
        } else {
            let conn = Connection::open(db_path)?;
            VERSIONED_SCHEMAS.last().unwrap().create(&conn)?;
            conn
        };

        let db_version = conn
            .query_row("PRAGMA user_version;", [], |row| row.get::<usize, i64>(0))
            .context("Failed to read database version")?
            - BASE_DB_VERSION as i64;

        if db_version < 0 {
            bail!(
                "User database version {} is below base db version {}",
                db_version,
                BASE_DB_VERSION
            );
        }
        let version = db_version as usize;

        if version >= VERSIONED_SCHEMAS.len() {
            bail!("User database version {} is too new", version);
        }
        VERSIONED_SCHEMAS
            .get(version)
            .context("Failed to get schema")?
            .validate(&conn)?;

        Self::migrate_if_needed(&conn, version)?;
        conn.execute("PRAGMA foreign_keys = ON;", params![])?;

        Ok(SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn migrate_if_needed(conn: &Connection, version: usize) -> Result<()> {
        let mut latest_from = version;
        for schema in VERSIONED_SCHEMAS.iter().skip(version + 1) {
            if let Some(migration_fn) = schema.migration {
                info!(
                    "Migrating user db from version {} to {}",
                    latest_from, schema.version
                );
                migration_fn(conn)?;
                latest_from = schema.version;
            }
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + latest_from),
            [],
        )?;
        Ok(())
    }
}

fn system_time_from_column(value: i64) -> SystemTime {
    SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(value as u64)
}

fn datetime_from_column(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

fn db_enum<T>(idx: usize, value: String, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    parse(&value).ok_or(rusqlite::Error::InvalidColumnType(idx, value, Type::Text))
}

fn map_auth_token_row(row: &Row) -> rusqlite::Result<AuthToken> {
    Ok(AuthToken {
        user_id: row.get(0)?,
        value: AuthTokenValue(row.get(1)?),
        created: system_time_from_column(row.get(2)?),
        last_used: row
            .get::<usize, Option<i64>>(3)?
            .map(system_time_from_column),
    })
}

fn map_interest_row(row: &Row) -> rusqlite::Result<UserInterest> {
    let preferred: String = row.get(3)?;
    let preferred_content_types: Vec<String> =
        serde_json::from_str(&preferred).unwrap_or_default();
    Ok(UserInterest {
        user_id: row.get(0)?,
        topic_id: row.get(1)?,
        strength: row.get(2)?,
        preferred_content_types: preferred_content_types
            .iter()
            .filter_map(|s| ContentType::from_db_str(s))
            .collect(),
        average_session_length: row.get(4)?,
        created: datetime_from_column(row.get(5)?),
        updated: datetime_from_column(row.get(6)?),
    })
}

fn map_session_row(row: &Row) -> rusqlite::Result<LearningSession> {
    Ok(LearningSession {
        id: Some(row.get::<_, i64>(0)? as usize),
        user_id: row.get(1)?,
        topic_id: row.get(2)?,
        content_id: row.get(3)?,
        duration_minutes: row.get(4)?,
        completed: row.get::<_, i64>(5)? != 0,
        score: row.get(6)?,
        engagement_score: row.get(7)?,
        created: datetime_from_column(row.get(8)?),
    })
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, user_handle: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user (handle) VALUES (?1)",
            params![user_handle],
        )
        .with_context(|| format!("Failed to create user {}", user_handle))?;
        Ok(conn.last_insert_rowid() as usize)
    }

    fn get_user_handle(&self, user_id: usize) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            "SELECT handle FROM user WHERE id = ?1",
            params![user_id],
            |row| row.get(0),
        ) {
            Ok(handle) => Ok(Some(handle)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            "SELECT id FROM user WHERE handle = ?1",
            params![user_handle],
            |row| row.get::<_, i64>(0),
        ) {
            Ok(id) => Ok(Some(id as usize)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn get_all_user_handles(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT handle FROM user ORDER BY id")?;
        let handles = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(handles)
    }
}

impl UserAuthTokenStore for SqliteUserStore {
    fn get_user_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            "SELECT user_id, value, created, last_used FROM auth_token WHERE value = ?1",
            params![value.0],
            map_auth_token_row,
        ) {
            Ok(token) => Ok(Some(token)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete_user_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let Some(token) = self.get_user_auth_token(value)? else {
            return Ok(None);
        };
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM auth_token WHERE value = ?1",
            params![token.value.0],
        )?;
        Ok(Some(token))
    }

    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!("UPDATE auth_token SET last_used = {DEFAULT_TIMESTAMP} WHERE value = ?1"),
            params![token.0],
        )?;
        Ok(())
    }

    fn add_user_auth_token(&self, token: AuthToken) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO auth_token (value, user_id) VALUES (?1, ?2)",
            params![token.value.0, token.user_id],
        )?;
        Ok(())
    }

    fn prune_unused_auth_tokens(&self, unused_for_days: u64) -> Result<usize> {
        let cutoff = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)?
            .as_secs() as i64
            - (unused_for_days * 24 * 60 * 60) as i64;
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM auth_token WHERE COALESCE(last_used, created) < ?1",
            params![cutoff],
        )?;
        Ok(deleted)
    }
}

impl UserAuthCredentialsStore for SqliteUserStore {
    fn get_user_auth_credentials(&self, user_handle: &str) -> Result<Option<UserAuthCredentials>> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            "SELECT c.user_id, c.salt, c.hash, c.hasher, c.created, c.last_used \
             FROM user_password_credentials c \
             JOIN user u ON u.id = c.user_id \
             WHERE u.handle = ?1",
            params![user_handle],
            |row| {
                let hasher_name: String = row.get(3)?;
                let hasher = CredentialsHasher::from_str(&hasher_name).map_err(|_| {
                    rusqlite::Error::InvalidColumnType(3, hasher_name, Type::Text)
                })?;
                Ok(UserAuthCredentials {
                    user_id: row.get(0)?,
                    salt: row.get(1)?,
                    hash: row.get(2)?,
                    hasher,
                    created: system_time_from_column(row.get(4)?),
                    last_used: row
                        .get::<usize, Option<i64>>(5)?
                        .map(system_time_from_column),
                })
            },
        ) {
            Ok(credentials) => Ok(Some(credentials)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_user_auth_credentials(&self, credentials: &UserAuthCredentials) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user_password_credentials (user_id, salt, hash, hasher) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(user_id) DO UPDATE SET \
                salt = excluded.salt, hash = excluded.hash, hasher = excluded.hasher",
            params![
                credentials.user_id,
                credentials.salt,
                credentials.hash,
                credentials.hasher.to_string(),
            ],
        )?;
        Ok(())
    }
}

impl UserPreferencesStore for SqliteUserStore {
    fn get_user_preferences(&self, user_id: usize) -> Result<Option<UserPreferences>> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            "SELECT difficulty_level, learning_style, daily_goal_minutes, morning_reminder, \
             reminder_time FROM user_preferences WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(UserPreferences {
                    difficulty_level: db_enum(0, row.get(0)?, Difficulty::from_db_str)?,
                    learning_style: db_enum(1, row.get(1)?, LearningStyle::from_db_str)?,
                    daily_goal_minutes: row.get(2)?,
                    morning_reminder: row.get::<_, i64>(3)? != 0,
                    reminder_time: row.get(4)?,
                })
            },
        ) {
            Ok(preferences) => Ok(Some(preferences)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_user_preferences(&self, user_id: usize, preferences: &UserPreferences) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO user_preferences \
                 (user_id, difficulty_level, learning_style, daily_goal_minutes, \
                  morning_reminder, reminder_time) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
                 ON CONFLICT(user_id) DO UPDATE SET \
                    difficulty_level = excluded.difficulty_level, \
                    learning_style = excluded.learning_style, \
                    daily_goal_minutes = excluded.daily_goal_minutes, \
                    morning_reminder = excluded.morning_reminder, \
                    reminder_time = excluded.reminder_time, \
                    updated = {DEFAULT_TIMESTAMP}"
            ),
            params![
                user_id,
                preferences.difficulty_level.as_db_str(),
                preferences.learning_style.as_db_str(),
                preferences.daily_goal_minutes,
                preferences.morning_reminder as i64,
                preferences.reminder_time,
            ],
        )?;
        Ok(())
    }
}

impl UserInterestStore for SqliteUserStore {
    fn get_user_interests(&self, user_id: usize) -> Result<Vec<UserInterest>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT user_id, topic_id, strength, preferred_content_types, \
             average_session_length, created, updated \
             FROM user_interest WHERE user_id = ?1 ORDER BY strength DESC",
        )?;
        let interests = stmt
            .query_map(params![user_id], map_interest_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(interests)
    }

    fn get_user_interest(&self, user_id: usize, topic_id: &str) -> Result<Option<UserInterest>> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            "SELECT user_id, topic_id, strength, preferred_content_types, \
             average_session_length, created, updated \
             FROM user_interest WHERE user_id = ?1 AND topic_id = ?2",
            params![user_id, topic_id],
            map_interest_row,
        ) {
            Ok(interest) => Ok(Some(interest)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn upsert_user_interest(&self, interest: &UserInterest) -> Result<()> {
        let preferred: Vec<&str> = interest
            .preferred_content_types
            .iter()
            .map(|t| t.as_db_str())
            .collect();
        let preferred = serde_json::to_string(&preferred)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO user_interest \
                 (user_id, topic_id, strength, preferred_content_types, average_session_length) \
                 VALUES (?1, ?2, ?3, ?4, ?5) \
                 ON CONFLICT(user_id, topic_id) DO UPDATE SET \
                    strength = excluded.strength, \
                    preferred_content_types = excluded.preferred_content_types, \
                    average_session_length = excluded.average_session_length, \
                    updated = {DEFAULT_TIMESTAMP}"
            ),
            params![
                interest.user_id,
                interest.topic_id,
                interest.strength,
                preferred,
                interest.average_session_length,
            ],
        )?;
        Ok(())
    }

    fn delete_user_interests(&self, user_id: usize) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM user_interest WHERE user_id = ?1",
            params![user_id],
        )?;
        Ok(deleted)
    }
}

impl LearningSessionStore for SqliteUserStore {
    fn record_learning_session(&self, session: &LearningSession) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO learning_session \
             (user_id, topic_id, content_id, duration_minutes, completed, score, engagement_score) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                session.user_id,
                session.topic_id,
                session.content_id,
                session.duration_minutes,
                session.completed as i64,
                session.score,
                session.engagement_score,
            ],
        )?;
        Ok(conn.last_insert_rowid() as usize)
    }

    fn get_user_sessions(&self, user_id: usize, limit: usize) -> Result<Vec<LearningSession>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, topic_id, content_id, duration_minutes, completed, score, \
             engagement_score, created \
             FROM learning_session WHERE user_id = ?1 ORDER BY created DESC, id DESC LIMIT ?2",
        )?;
        let sessions = stmt
            .query_map(params![user_id, limit], map_session_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    fn get_completed_content_ids(&self, user_id: usize) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT content_id FROM learning_session \
             WHERE user_id = ?1 AND completed = 1",
        )?;
        let ids = stmt
            .query_map(params![user_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }
}
