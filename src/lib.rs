//! Course Storage - content and progress storage for the course platform
//!
//! Owns the authored content tree (chapters and their lessons) and every
//! per-user interaction record (completed, liked, saved, rated, comments),
//! exposed over a JSON HTTP API.
//!
//! ## Architecture
//!
//! - **Gateway**: authenticates sessions, forwards identity headers
//! - **course-storage**: validates, authorizes, persists
//! - **SQLite**: single-file durable store
//!
//! Two write paths with different shapes:
//!
//! | Path | Writer | Shape |
//! |------|--------|-------|
//! | Tree reconciliation | admin | whole-snapshot upsert + delete batch |
//! | Point mutations | any caller | one record keyed by (user, lesson) |
//!
//! ## Storage Layout
//!
//! ```text
//! ~/.local/share/course-storage/
//! ├── course.db      # SQLite database
//! └── config.toml    # Configuration
//! ```

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod ordering;
pub mod services;

// Re-exports
pub use auth::{Caller, Role};
pub use config::Config;
pub use db::Database;
pub use error::StorageError;
pub use http::HttpServer;
pub use services::Services;
