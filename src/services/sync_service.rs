//! Content tree reconciliation - the sole writer of chapter/lesson structure
//!
//! An admin client edits the whole tree locally (using the ordering model for
//! drag gestures) and submits it as one snapshot. This service validates the
//! snapshot, then makes persisted storage match it: upsert-by-id for every
//! submitted chapter and lesson, deletes for anything no longer present, with
//! cascading cleanup of per-user records referencing deleted lessons.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::Caller;
use crate::db::models::ChapterWithLessons;
use crate::db::{chapters, lessons, Database};
use crate::error::StorageError;

use super::events::{EventBus, StorageEvent};

// ============================================================================
// Submitted Tree Types
// ============================================================================

/// Lesson node in a submitted tree
///
/// Carries structural fields only; content fields travel through the
/// explicit content-update path instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonInput {
    pub id: String,
    pub name: String,
    /// 0-based position within the owning chapter, assigned by the client
    pub order: i32,
    pub chapter_id: String,
}

/// Chapter node in a submitted tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterInput {
    pub id: String,
    pub name: String,
    /// 0-based position among chapters, assigned by the client
    pub order: i32,
    #[serde(default)]
    pub lessons: Vec<LessonInput>,
}

// ============================================================================
// Batch Operations
// ============================================================================

/// One independent storage operation within a reconciliation batch
#[derive(Debug)]
enum SyncOp {
    UpsertChapter {
        id: String,
        name: String,
        order: i32,
    },
    UpsertLesson {
        id: String,
        chapter_id: String,
        name: String,
        order: i32,
    },
    DeleteChapter {
        id: String,
    },
    DeleteLesson {
        id: String,
    },
}

impl SyncOp {
    fn apply(&self, db: &Database) -> Result<(), StorageError> {
        let mut conn = db.conn()?;
        match self {
            SyncOp::UpsertChapter { id, name, order } => {
                chapters::upsert_chapter(&mut conn, id, name, *order)
            }
            SyncOp::UpsertLesson {
                id,
                chapter_id,
                name,
                order,
            } => lessons::upsert_lesson_structure(&mut conn, id, chapter_id, name, *order),
            SyncOp::DeleteChapter { id } => chapters::delete_chapter(&mut conn, id).map(|_| ()),
            SyncOp::DeleteLesson { id } => lessons::delete_lesson(&mut conn, id).map(|_| ()),
        }
    }
}

// ============================================================================
// Service
// ============================================================================

/// Tree synchronization and chapter listing
pub struct SyncService {
    db: Database,
    events: Arc<EventBus>,
}

impl SyncService {
    pub fn new(db: Database, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    /// List chapters in display order, each with its ordered lessons
    ///
    /// Learners see only non-draft lessons; admins see everything.
    pub fn list(&self, caller: &Caller) -> Result<Vec<ChapterWithLessons>, StorageError> {
        let mut conn = self.db.conn()?;
        chapters::list_chapters(&mut conn, caller.is_admin())
    }

    /// Replace persisted structural state with the submitted tree snapshot
    ///
    /// Admin only. Validation failures and permission failures abort before
    /// any storage mutation. Within the batch, operations run concurrently
    /// and independently; a failed operation is logged and counted but does
    /// not abort its siblings. Returns the submitted tree as the
    /// acknowledgment, not a re-read of storage.
    pub async fn synchronize(
        &self,
        caller: &Caller,
        tree: Vec<ChapterInput>,
    ) -> Result<Vec<ChapterInput>, StorageError> {
        caller.require_admin()?;
        validate_tree(&tree)?;

        // Snapshot of persisted identity sets, taken before the batch.
        let (persisted_chapters, persisted_lessons) = {
            let mut conn = self.db.conn()?;
            (
                chapters::chapter_ids(&mut conn)?,
                lessons::lesson_ids(&mut conn)?,
            )
        };

        let target_chapters: HashSet<&str> = tree.iter().map(|c| c.id.as_str()).collect();
        let target_lessons: HashSet<&str> = tree
            .iter()
            .flat_map(|c| c.lessons.iter())
            .map(|l| l.id.as_str())
            .collect();

        let mut ops = Vec::new();
        let mut chapter_upserts = 0;
        let mut lesson_upserts = 0;

        for chapter in &tree {
            chapter_upserts += 1;
            ops.push(SyncOp::UpsertChapter {
                id: chapter.id.clone(),
                name: chapter.name.clone(),
                order: chapter.order,
            });

            for lesson in &chapter.lessons {
                lesson_upserts += 1;
                // Rebound to the containing chapter's id, which also covers
                // lessons nested under a chapter created in this same pass.
                ops.push(SyncOp::UpsertLesson {
                    id: lesson.id.clone(),
                    chapter_id: chapter.id.clone(),
                    name: lesson.name.clone(),
                    order: lesson.order,
                });
            }
        }

        let mut deleted_chapters = 0;
        for id in &persisted_chapters {
            if !target_chapters.contains(id.as_str()) {
                deleted_chapters += 1;
                ops.push(SyncOp::DeleteChapter { id: id.clone() });
            }
        }

        let mut deleted_lessons = 0;
        for id in &persisted_lessons {
            if !target_lessons.contains(id.as_str()) {
                deleted_lessons += 1;
                ops.push(SyncOp::DeleteLesson { id: id.clone() });
            }
        }

        // Partial-failure-tolerant batch: every operation is its own
        // blocking task against the pool.
        let handles = ops.into_iter().map(|op| {
            let db = self.db.clone();
            tokio::task::spawn_blocking(move || {
                let result = op.apply(&db);
                (op, result)
            })
        });

        let mut failed_operations = 0;
        for joined in join_all(handles).await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((op, Err(e))) => {
                    failed_operations += 1;
                    warn!(op = ?op, error = %e, "Sync operation failed");
                }
                Err(e) => {
                    failed_operations += 1;
                    warn!(error = %e, "Sync task failed to complete");
                }
            }
        }

        info!(
            chapters = chapter_upserts,
            lessons = lesson_upserts,
            deleted_chapters = deleted_chapters,
            deleted_lessons = deleted_lessons,
            failed = failed_operations,
            "Content tree synchronized"
        );

        self.events.emit(StorageEvent::TreeSynchronized {
            chapters: chapter_upserts,
            lessons: lesson_upserts,
            deleted_chapters,
            deleted_lessons,
            failed_operations,
        });

        Ok(tree)
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Validate a submitted tree before any storage mutation
///
/// Names the first offending entity; the whole submission is rejected.
fn validate_tree(tree: &[ChapterInput]) -> Result<(), StorageError> {
    for (i, chapter) in tree.iter().enumerate() {
        if chapter.id.is_empty() {
            return Err(StorageError::InvalidInput(format!(
                "chapters[{}]: id is required",
                i
            )));
        }
        if chapter.name.is_empty() {
            return Err(StorageError::InvalidInput(format!(
                "chapter \"{}\": name is required",
                chapter.id
            )));
        }

        for (j, lesson) in chapter.lessons.iter().enumerate() {
            if lesson.id.is_empty() {
                return Err(StorageError::InvalidInput(format!(
                    "chapter \"{}\" lessons[{}]: id is required",
                    chapter.id, j
                )));
            }
            if lesson.name.is_empty() {
                return Err(StorageError::InvalidInput(format!(
                    "lesson \"{}\": name is required",
                    lesson.id
                )));
            }
            if lesson.chapter_id != chapter.id {
                return Err(StorageError::InvalidInput(format!(
                    "lesson \"{}\": chapter_id \"{}\" does not match containing chapter \"{}\"",
                    lesson.id, lesson.chapter_id, chapter.id
                )));
            }
        }
    }

    Ok(())
}
