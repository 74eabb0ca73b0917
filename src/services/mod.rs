//! Service layer orchestrating storage operations
//!
//! Architecture:
//!
//! ```text
//! HTTP handlers (http.rs)
//!        |
//!   Services container
//!    /    |      \
//! Sync  Lesson  Metadata     <- domain services
//!    \    |      /
//!     db modules             <- diesel queries
//!        |
//!      SQLite
//! ```
//!
//! Services own the permission checks and input validation; the db modules
//! below them are pure storage. The event bus crosses all services for audit
//! logging.

pub mod events;
pub mod lesson_service;
pub mod metadata_service;
pub mod response;
pub mod sync_service;

use std::sync::Arc;

use crate::db::Database;

pub use events::{EventBus, EventListener, LoggingEventListener, StorageEvent};
pub use lesson_service::{LessonService, UpdateContentInput};
pub use metadata_service::{LessonsMetadata, MetadataService};
pub use sync_service::{ChapterInput, LessonInput, SyncService};

/// Container wiring every domain service to the shared database and event bus
#[derive(Clone)]
pub struct Services {
    pub sync: Arc<SyncService>,
    pub lesson: Arc<LessonService>,
    pub metadata: Arc<MetadataService>,
    pub events: Arc<EventBus>,
}

impl Services {
    pub fn new(db: Database) -> Self {
        let events = Arc::new(EventBus::new());
        Self {
            sync: Arc::new(SyncService::new(db.clone(), events.clone())),
            lesson: Arc::new(LessonService::new(db.clone(), events.clone())),
            metadata: Arc::new(MetadataService::new(db)),
            events,
        }
    }
}
