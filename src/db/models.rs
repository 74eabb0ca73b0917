//! Diesel model definitions for database tables
//!
//! - Queryable structs: for SELECT queries (reading data)
//! - Insertable structs: for INSERT queries (writing data)
//!
//! SQLite stores booleans as INTEGER (0/1) and timestamps as ISO 8601 TEXT.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::diesel_schema::*;

// ============================================================================
// Timestamp Helpers
// ============================================================================

/// Get current UTC timestamp as ISO 8601 string for SQLite TEXT columns
///
/// Microsecond precision, so rows written back to back still sort by
/// creation time.
pub fn current_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.6fZ")
        .to_string()
}

// ============================================================================
// Chapter Models
// ============================================================================

/// Chapter row from SELECT query
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = chapters)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Chapter {
    pub id: String,
    pub name: String,
    pub order_index: i32,
}

/// Chapter with its ordered lessons attached (API response)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterWithLessons {
    #[serde(flatten)]
    pub chapter: Chapter,
    pub lessons: Vec<Lesson>,
}

// ============================================================================
// Lesson Models
// ============================================================================

/// Lesson row from SELECT query
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = lessons)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Lesson {
    pub id: String,
    pub chapter_id: String,
    pub name: String,
    pub order_index: i32,
    pub video: Option<String>,
    pub body: Option<String>,
    pub is_draft: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl Lesson {
    pub fn is_draft(&self) -> bool {
        self.is_draft != 0
    }
}

/// Lesson with its comment thread attached (API response)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonWithComments {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub comments: Vec<Comment>,
}

// ============================================================================
// Comment Models
// ============================================================================

/// Comment row from SELECT query
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = lesson_comments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Comment {
    pub id: String,
    pub lesson_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: String,
}

/// New comment for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = lesson_comments)]
pub struct NewComment<'a> {
    pub id: &'a str,
    pub lesson_id: &'a str,
    pub user_id: &'a str,
    pub content: &'a str,
    pub created_at: &'a str,
}
