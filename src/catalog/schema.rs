//! Sqlite schema for the content catalog database.
//!
//! Timestamps are unix seconds. List-valued columns (tags, embedding) are
//! stored as JSON text.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};

const TOPIC_TABLE: Table = Table {
    name: "topic",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("category", &SqlType::Text, non_null = true),
        sqlite_column!("difficulty", &SqlType::Text, non_null = true),
        sqlite_column!("estimated_minutes", &SqlType::Integer, non_null = true),
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
    indices: &[("idx_topic_category", "category")],
    unique_constraints: &[],
};

const TOPIC_FK: ForeignKey = ForeignKey {
    foreign_table: "topic",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const CONTENT_TABLE: Table = Table {
    name: "content",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!(
            "topic_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&TOPIC_FK)
        ),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("description", &SqlType::Text),
        sqlite_column!("content_type", &SqlType::Text, non_null = true),
        sqlite_column!("url", &SqlType::Text),
        sqlite_column!("difficulty", &SqlType::Text, non_null = true),
        sqlite_column!("estimated_minutes", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "tags",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'[]'")
        ),
        sqlite_column!("embedding", &SqlType::Text),
        sqlite_column!(
            "view_count",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("rating", &SqlType::Real),
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
    indices: &[
        ("idx_content_topic", "topic_id"),
        ("idx_content_type", "content_type"),
        ("idx_content_rating", "rating"),
    ],
    unique_constraints: &[],
};

pub const CATALOG_VERSIONED_SCHEMAS: [VersionedSchema; 1] = [VersionedSchema {
    version: 0,
    tables: &[TOPIC_TABLE, CONTENT_TABLE],
    migration: None,
}];
