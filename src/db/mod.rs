//! SQLite database module for authored content and interaction records
//!
//! ## Tables
//!
//! - `chapters` - Authored chapters (id, name, order_index)
//! - `lessons` - Lessons owned by chapters, with content fields and draft flag
//! - `lessons_completed` / `lessons_liked` / `lessons_saved` - Per-user marks,
//!   keyed by the unique (user_id, lesson_id) pair
//! - `lessons_rated` - Per-user rating in [1,5], same unique pair
//! - `lesson_comments` - Comment threads per lesson
//!
//! Structural rows (chapters, lessons) are written only by the tree
//! reconciler; interaction rows are written by individual learner actions.

pub mod diesel_schema;
pub mod models;

pub mod chapters;
pub mod comments;
pub mod interactions;
pub mod lessons;

use std::path::Path;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::SqliteConnection;
use tracing::{debug, info};

use crate::error::StorageError;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS chapters (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    order_index INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS lessons (
    id TEXT PRIMARY KEY NOT NULL,
    chapter_id TEXT NOT NULL,
    name TEXT NOT NULL,
    order_index INTEGER NOT NULL DEFAULT 0,
    video TEXT,
    body TEXT,
    is_draft INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_lessons_chapter ON lessons(chapter_id);

CREATE TABLE IF NOT EXISTS lessons_completed (
    user_id TEXT NOT NULL,
    lesson_id TEXT NOT NULL,
    PRIMARY KEY (user_id, lesson_id)
);
CREATE INDEX IF NOT EXISTS idx_completed_lesson ON lessons_completed(lesson_id);

CREATE TABLE IF NOT EXISTS lessons_liked (
    user_id TEXT NOT NULL,
    lesson_id TEXT NOT NULL,
    PRIMARY KEY (user_id, lesson_id)
);
CREATE INDEX IF NOT EXISTS idx_liked_lesson ON lessons_liked(lesson_id);

CREATE TABLE IF NOT EXISTS lessons_saved (
    user_id TEXT NOT NULL,
    lesson_id TEXT NOT NULL,
    PRIMARY KEY (user_id, lesson_id)
);
CREATE INDEX IF NOT EXISTS idx_saved_lesson ON lessons_saved(lesson_id);

CREATE TABLE IF NOT EXISTS lessons_rated (
    user_id TEXT NOT NULL,
    lesson_id TEXT NOT NULL,
    rate INTEGER NOT NULL,
    PRIMARY KEY (user_id, lesson_id)
);
CREATE INDEX IF NOT EXISTS idx_rated_lesson ON lessons_rated(lesson_id);

CREATE TABLE IF NOT EXISTS lesson_comments (
    id TEXT PRIMARY KEY NOT NULL,
    lesson_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_comments_lesson ON lesson_comments(lesson_id);
"#;

/// Pooled SQLite database handle shared by all services
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open or create the course database at the given file path
    pub fn open(db_path: &Path) -> Result<Self, StorageError> {
        info!("Opening SQLite database at {:?}", db_path);

        let manager = ConnectionManager::<SqliteConnection>::new(db_path.to_string_lossy());
        let pool = Pool::builder()
            .max_size(8)
            .build(manager)
            .map_err(|e| StorageError::Pool(format!("Failed to build pool: {}", e)))?;

        let db = Self { pool };

        // WAL mode for better concurrent read performance
        db.conn()?
            .batch_execute("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| StorageError::Database(format!("Failed to set PRAGMA: {}", e)))?;

        db.init_schema()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing)
    ///
    /// The pool is capped at a single connection; each SQLite in-memory
    /// connection is its own database, so a larger pool would hand out
    /// empty databases.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        debug!("Opening in-memory SQLite database");

        let manager = ConnectionManager::<SqliteConnection>::new(":memory:");
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| StorageError::Pool(format!("Failed to build pool: {}", e)))?;

        let db = Self { pool };
        db.init_schema()?;

        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<(), StorageError> {
        self.conn()?
            .batch_execute(SCHEMA)
            .map_err(|e| StorageError::Database(format!("Failed to create schema: {}", e)))
    }

    /// Check out a pooled connection
    pub fn conn(&self) -> Result<DbConn, StorageError> {
        self.pool
            .get()
            .map_err(|e| StorageError::Pool(format!("Failed to get connection: {}", e)))
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats, StorageError> {
        let mut conn = self.conn()?;

        Ok(DbStats {
            chapter_count: chapters::chapter_count(&mut conn)? as u64,
            lesson_count: lessons::lesson_count(&mut conn)? as u64,
            published_lesson_count: lessons::published_count(&mut conn)? as u64,
            comment_count: comments::comment_count(&mut conn)? as u64,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub chapter_count: u64,
    pub lesson_count: u64,
    pub published_lesson_count: u64,
    pub comment_count: u64,
}
