//! Lesson queries, structural upsert, content update, and cascading delete
//!
//! The structural upsert writes only name, order and chapter binding; content
//! fields (video, body, draft flag) are owned by the explicit content-update
//! path so that bulk tree reconciliation stays purely structural.

use diesel::prelude::*;

use super::diesel_schema::lessons;
use super::models::{current_timestamp, Lesson};
use super::{comments, interactions};
use crate::error::StorageError;

// ============================================================================
// Read Operations
// ============================================================================

/// Get lesson by ID
pub fn get_lesson(
    conn: &mut SqliteConnection,
    lesson_id: &str,
) -> Result<Option<Lesson>, StorageError> {
    lessons::table
        .filter(lessons::id.eq(lesson_id))
        .first(conn)
        .optional()
        .map_err(|e| StorageError::Database(format!("Query failed: {}", e)))
}

/// Get the set of all persisted lesson ids
pub fn lesson_ids(conn: &mut SqliteConnection) -> Result<Vec<String>, StorageError> {
    lessons::table
        .select(lessons::id)
        .load(conn)
        .map_err(|e| StorageError::Database(format!("Query failed: {}", e)))
}

// ============================================================================
// Write Operations
// ============================================================================

/// Create-or-update a lesson's structural fields keyed by its client-assigned id
///
/// Writes name, position and chapter binding only. A newly created row gets
/// content defaults (no video, no body, not draft); an existing row keeps its
/// content fields untouched.
pub fn upsert_lesson_structure(
    conn: &mut SqliteConnection,
    lesson_id: &str,
    chapter_id: &str,
    name: &str,
    order_index: i32,
) -> Result<(), StorageError> {
    let now = current_timestamp();

    diesel::insert_into(lessons::table)
        .values((
            lessons::id.eq(lesson_id),
            lessons::chapter_id.eq(chapter_id),
            lessons::name.eq(name),
            lessons::order_index.eq(order_index),
            lessons::created_at.eq(&now),
            lessons::updated_at.eq(&now),
        ))
        .on_conflict(lessons::id)
        .do_update()
        .set((
            lessons::chapter_id.eq(chapter_id),
            lessons::name.eq(name),
            lessons::order_index.eq(order_index),
            lessons::updated_at.eq(&now),
        ))
        .execute(conn)
        .map_err(|e| StorageError::Database(format!("Lesson upsert failed: {}", e)))?;

    Ok(())
}

/// Update a lesson's content fields (admin editing path)
///
/// Returns false when no lesson with that id exists.
pub fn update_content(
    conn: &mut SqliteConnection,
    lesson_id: &str,
    name: &str,
    video: Option<&str>,
    body: Option<&str>,
    is_draft: bool,
) -> Result<bool, StorageError> {
    let updated = diesel::update(lessons::table.filter(lessons::id.eq(lesson_id)))
        .set((
            lessons::name.eq(name),
            lessons::video.eq(video),
            lessons::body.eq(body),
            lessons::is_draft.eq(if is_draft { 1 } else { 0 }),
            lessons::updated_at.eq(current_timestamp()),
        ))
        .execute(conn)
        .map_err(|e| StorageError::Database(format!("Update failed: {}", e)))?;

    Ok(updated > 0)
}

/// Delete a lesson and every per-user record referencing it
///
/// Interaction records and comments hold weak references to the lesson and
/// must never outlive it, so the whole cascade runs in one transaction.
pub fn delete_lesson(conn: &mut SqliteConnection, lesson_id: &str) -> Result<bool, StorageError> {
    conn.transaction(|conn| {
        interactions::delete_for_lesson(conn, lesson_id)?;
        comments::delete_for_lesson(conn, lesson_id)?;

        let deleted = diesel::delete(lessons::table.filter(lessons::id.eq(lesson_id)))
            .execute(conn)
            .map_err(|e| StorageError::Database(format!("Delete failed: {}", e)))?;

        Ok(deleted > 0)
    })
}

// ============================================================================
// Stats
// ============================================================================

/// Get total lesson count (drafts included)
pub fn lesson_count(conn: &mut SqliteConnection) -> Result<i64, StorageError> {
    lessons::table
        .count()
        .get_result(conn)
        .map_err(|e| StorageError::Database(format!("Count query failed: {}", e)))
}

/// Get the count of non-draft lessons (the progress denominator)
pub fn published_count(conn: &mut SqliteConnection) -> Result<i64, StorageError> {
    lessons::table
        .filter(lessons::is_draft.eq(0))
        .count()
        .get_result(conn)
        .map_err(|e| StorageError::Database(format!("Count query failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{chapters, Database};

    fn seed_lesson(conn: &mut SqliteConnection) {
        chapters::upsert_chapter(conn, "c1", "Intro", 0).unwrap();
        upsert_lesson_structure(conn, "l1", "c1", "Welcome", 0).unwrap();
    }

    #[test]
    fn test_structural_upsert_preserves_content_fields() {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.conn().unwrap();
        seed_lesson(&mut conn);

        update_content(&mut conn, "l1", "Welcome", Some("intro.mp4"), Some("<p>hi</p>"), true)
            .unwrap();

        // A second reconciliation pass rebinds structure but must not reset content.
        upsert_lesson_structure(&mut conn, "l1", "c1", "Welcome!", 2).unwrap();

        let lesson = get_lesson(&mut conn, "l1").unwrap().unwrap();
        assert_eq!(lesson.name, "Welcome!");
        assert_eq!(lesson.order_index, 2);
        assert_eq!(lesson.video.as_deref(), Some("intro.mp4"));
        assert_eq!(lesson.body.as_deref(), Some("<p>hi</p>"));
        assert!(lesson.is_draft());
    }

    #[test]
    fn test_new_lesson_gets_content_defaults() {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.conn().unwrap();
        seed_lesson(&mut conn);

        let lesson = get_lesson(&mut conn, "l1").unwrap().unwrap();
        assert!(lesson.video.is_none());
        assert!(lesson.body.is_none());
        assert!(!lesson.is_draft());
    }

    #[test]
    fn test_delete_cascades_records_and_comments() {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.conn().unwrap();
        seed_lesson(&mut conn);

        interactions::set_completed(&mut conn, "u1", "l1").unwrap();
        interactions::set_liked(&mut conn, "u1", "l1").unwrap();
        interactions::set_saved(&mut conn, "u2", "l1").unwrap();
        interactions::set_rating(&mut conn, "u1", "l1", 4).unwrap();
        comments::add_comment(&mut conn, "l1", "u1", "first!").unwrap();

        assert!(delete_lesson(&mut conn, "l1").unwrap());

        assert!(get_lesson(&mut conn, "l1").unwrap().is_none());
        assert!(interactions::completed_lessons(&mut conn, "u1").unwrap().is_empty());
        assert!(interactions::liked_lessons(&mut conn, "u1").unwrap().is_empty());
        assert!(interactions::saved_lessons(&mut conn, "u2").unwrap().is_empty());
        assert!(interactions::ratings(&mut conn, "u1").unwrap().is_empty());
        assert!(comments::list_for_lesson(&mut conn, "l1").unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_lesson_reports_false() {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.conn().unwrap();

        assert!(!delete_lesson(&mut conn, "ghost").unwrap());
    }

    #[test]
    fn test_published_count_excludes_drafts() {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.conn().unwrap();
        seed_lesson(&mut conn);
        upsert_lesson_structure(&mut conn, "l2", "c1", "Draft lesson", 1).unwrap();
        update_content(&mut conn, "l2", "Draft lesson", None, None, true).unwrap();

        assert_eq!(lesson_count(&mut conn).unwrap(), 2);
        assert_eq!(published_count(&mut conn).unwrap(), 1);
    }
}
