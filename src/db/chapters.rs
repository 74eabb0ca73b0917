//! Chapter queries and the structural upsert used by tree synchronization

use diesel::prelude::*;

use super::diesel_schema::{chapters, lessons};
use super::models::{Chapter, ChapterWithLessons, Lesson};
use crate::error::StorageError;

// ============================================================================
// Read Operations
// ============================================================================

/// Get chapter by ID
pub fn get_chapter(
    conn: &mut SqliteConnection,
    chapter_id: &str,
) -> Result<Option<Chapter>, StorageError> {
    chapters::table
        .filter(chapters::id.eq(chapter_id))
        .first(conn)
        .optional()
        .map_err(|e| StorageError::Database(format!("Query failed: {}", e)))
}

/// Get the set of all persisted chapter ids
pub fn chapter_ids(conn: &mut SqliteConnection) -> Result<Vec<String>, StorageError> {
    chapters::table
        .select(chapters::id)
        .load(conn)
        .map_err(|e| StorageError::Database(format!("Query failed: {}", e)))
}

/// List all chapters ordered by position, each with its lessons ordered by
/// position. Draft lessons are excluded unless `include_drafts` is set.
pub fn list_chapters(
    conn: &mut SqliteConnection,
    include_drafts: bool,
) -> Result<Vec<ChapterWithLessons>, StorageError> {
    let rows: Vec<Chapter> = chapters::table
        .order(chapters::order_index.asc())
        .load(conn)
        .map_err(|e| StorageError::Database(format!("Query failed: {}", e)))?;

    let mut results = Vec::with_capacity(rows.len());
    for chapter in rows {
        let mut query = lessons::table
            .filter(lessons::chapter_id.eq(&chapter.id))
            .into_boxed();

        if !include_drafts {
            query = query.filter(lessons::is_draft.eq(0));
        }

        let chapter_lessons: Vec<Lesson> = query
            .order(lessons::order_index.asc())
            .load(conn)
            .map_err(|e| StorageError::Database(format!("Lessons query failed: {}", e)))?;

        results.push(ChapterWithLessons {
            chapter,
            lessons: chapter_lessons,
        });
    }

    Ok(results)
}

// ============================================================================
// Write Operations
// ============================================================================

/// Create-or-update a chapter keyed by its client-assigned id
///
/// A single conditional statement: the row is inserted when the id is new
/// and updated in place when it already exists. The id is primary identity
/// and is never reassigned.
pub fn upsert_chapter(
    conn: &mut SqliteConnection,
    chapter_id: &str,
    name: &str,
    order_index: i32,
) -> Result<(), StorageError> {
    diesel::insert_into(chapters::table)
        .values((
            chapters::id.eq(chapter_id),
            chapters::name.eq(name),
            chapters::order_index.eq(order_index),
        ))
        .on_conflict(chapters::id)
        .do_update()
        .set((
            chapters::name.eq(name),
            chapters::order_index.eq(order_index),
        ))
        .execute(conn)
        .map_err(|e| StorageError::Database(format!("Chapter upsert failed: {}", e)))?;

    Ok(())
}

/// Delete a chapter by ID
///
/// Lessons under the chapter are removed by their own delete operations
/// during a reconciler pass; this only drops the chapter row.
pub fn delete_chapter(
    conn: &mut SqliteConnection,
    chapter_id: &str,
) -> Result<bool, StorageError> {
    let deleted = diesel::delete(chapters::table.filter(chapters::id.eq(chapter_id)))
        .execute(conn)
        .map_err(|e| StorageError::Database(format!("Delete failed: {}", e)))?;

    Ok(deleted > 0)
}

// ============================================================================
// Stats
// ============================================================================

/// Get total chapter count
pub fn chapter_count(conn: &mut SqliteConnection) -> Result<i64, StorageError> {
    chapters::table
        .count()
        .get_result(conn)
        .map_err(|e| StorageError::Database(format!("Count query failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{lessons as lessons_db, Database};

    #[test]
    fn test_upsert_is_conditional_not_duplicating() {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.conn().unwrap();

        upsert_chapter(&mut conn, "c1", "Intro", 0).unwrap();
        upsert_chapter(&mut conn, "c1", "Introduction", 1).unwrap();

        assert_eq!(chapter_count(&mut conn).unwrap(), 1);

        let chapter = get_chapter(&mut conn, "c1").unwrap().unwrap();
        assert_eq!(chapter.name, "Introduction");
        assert_eq!(chapter.order_index, 1);
    }

    #[test]
    fn test_list_orders_by_position() {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.conn().unwrap();

        upsert_chapter(&mut conn, "c2", "Second", 1).unwrap();
        upsert_chapter(&mut conn, "c1", "First", 0).unwrap();

        let listed = list_chapters(&mut conn, false).unwrap();
        let ids: Vec<&str> = listed.iter().map(|c| c.chapter.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
    }

    #[test]
    fn test_draft_lessons_hidden_from_learners() {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.conn().unwrap();

        upsert_chapter(&mut conn, "c1", "Intro", 0).unwrap();
        lessons_db::upsert_lesson_structure(&mut conn, "l1", "c1", "Welcome", 0).unwrap();
        lessons_db::upsert_lesson_structure(&mut conn, "l2", "c1", "WIP", 1).unwrap();
        lessons_db::update_content(
            &mut conn,
            "l2",
            "WIP",
            None,
            None,
            true,
        )
        .unwrap();

        let learner_view = list_chapters(&mut conn, false).unwrap();
        assert_eq!(learner_view[0].lessons.len(), 1);
        assert_eq!(learner_view[0].lessons[0].id, "l1");

        let admin_view = list_chapters(&mut conn, true).unwrap();
        assert_eq!(admin_view[0].lessons.len(), 2);
    }
}
