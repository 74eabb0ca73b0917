//! Per-user interaction records: completed, liked, saved, rated
//!
//! Each record is keyed by the unique (user_id, lesson_id) pair. Creates are
//! insert-or-ignore and deletes tolerate already-absent rows, so a rapid
//! toggle race on the same pair resolves idempotently instead of erroring.

use diesel::prelude::*;

use super::diesel_schema::{lessons_completed, lessons_liked, lessons_rated, lessons_saved};
use crate::error::StorageError;

// ============================================================================
// Completed
// ============================================================================

/// Mark a lesson completed for a user (no-op if already marked)
pub fn set_completed(
    conn: &mut SqliteConnection,
    user_id: &str,
    lesson_id: &str,
) -> Result<(), StorageError> {
    diesel::insert_or_ignore_into(lessons_completed::table)
        .values((
            lessons_completed::user_id.eq(user_id),
            lessons_completed::lesson_id.eq(lesson_id),
        ))
        .execute(conn)
        .map_err(|e| StorageError::Database(format!("Insert failed: {}", e)))?;
    Ok(())
}

/// Unmark a lesson completed for a user (no-op if not marked)
pub fn set_incomplete(
    conn: &mut SqliteConnection,
    user_id: &str,
    lesson_id: &str,
) -> Result<(), StorageError> {
    diesel::delete(
        lessons_completed::table
            .filter(lessons_completed::user_id.eq(user_id))
            .filter(lessons_completed::lesson_id.eq(lesson_id)),
    )
    .execute(conn)
    .map_err(|e| StorageError::Database(format!("Delete failed: {}", e)))?;
    Ok(())
}

/// Lesson ids the user has completed
pub fn completed_lessons(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<String>, StorageError> {
    lessons_completed::table
        .filter(lessons_completed::user_id.eq(user_id))
        .select(lessons_completed::lesson_id)
        .load(conn)
        .map_err(|e| StorageError::Database(format!("Query failed: {}", e)))
}

// ============================================================================
// Liked
// ============================================================================

/// Like a lesson for a user (no-op if already liked)
pub fn set_liked(
    conn: &mut SqliteConnection,
    user_id: &str,
    lesson_id: &str,
) -> Result<(), StorageError> {
    diesel::insert_or_ignore_into(lessons_liked::table)
        .values((
            lessons_liked::user_id.eq(user_id),
            lessons_liked::lesson_id.eq(lesson_id),
        ))
        .execute(conn)
        .map_err(|e| StorageError::Database(format!("Insert failed: {}", e)))?;
    Ok(())
}

/// Remove a like (no-op if not liked)
pub fn set_disliked(
    conn: &mut SqliteConnection,
    user_id: &str,
    lesson_id: &str,
) -> Result<(), StorageError> {
    diesel::delete(
        lessons_liked::table
            .filter(lessons_liked::user_id.eq(user_id))
            .filter(lessons_liked::lesson_id.eq(lesson_id)),
    )
    .execute(conn)
    .map_err(|e| StorageError::Database(format!("Delete failed: {}", e)))?;
    Ok(())
}

/// Lesson ids the user has liked
pub fn liked_lessons(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<String>, StorageError> {
    lessons_liked::table
        .filter(lessons_liked::user_id.eq(user_id))
        .select(lessons_liked::lesson_id)
        .load(conn)
        .map_err(|e| StorageError::Database(format!("Query failed: {}", e)))
}

// ============================================================================
// Saved
// ============================================================================

/// Save a lesson for a user (no-op if already saved)
pub fn set_saved(
    conn: &mut SqliteConnection,
    user_id: &str,
    lesson_id: &str,
) -> Result<(), StorageError> {
    diesel::insert_or_ignore_into(lessons_saved::table)
        .values((
            lessons_saved::user_id.eq(user_id),
            lessons_saved::lesson_id.eq(lesson_id),
        ))
        .execute(conn)
        .map_err(|e| StorageError::Database(format!("Insert failed: {}", e)))?;
    Ok(())
}

/// Remove a save (no-op if not saved)
pub fn set_unsaved(
    conn: &mut SqliteConnection,
    user_id: &str,
    lesson_id: &str,
) -> Result<(), StorageError> {
    diesel::delete(
        lessons_saved::table
            .filter(lessons_saved::user_id.eq(user_id))
            .filter(lessons_saved::lesson_id.eq(lesson_id)),
    )
    .execute(conn)
    .map_err(|e| StorageError::Database(format!("Delete failed: {}", e)))?;
    Ok(())
}

/// Lesson ids the user has saved
pub fn saved_lessons(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<String>, StorageError> {
    lessons_saved::table
        .filter(lessons_saved::user_id.eq(user_id))
        .select(lessons_saved::lesson_id)
        .load(conn)
        .map_err(|e| StorageError::Database(format!("Query failed: {}", e)))
}

// ============================================================================
// Rated
// ============================================================================

/// Set the user's rating for a lesson, replacing any previous rating
///
/// One conditional statement keyed by the (user_id, lesson_id) pair, so
/// rating a lesson twice leaves exactly one row.
pub fn set_rating(
    conn: &mut SqliteConnection,
    user_id: &str,
    lesson_id: &str,
    rate: i32,
) -> Result<(), StorageError> {
    diesel::insert_into(lessons_rated::table)
        .values((
            lessons_rated::user_id.eq(user_id),
            lessons_rated::lesson_id.eq(lesson_id),
            lessons_rated::rate.eq(rate),
        ))
        .on_conflict((lessons_rated::user_id, lessons_rated::lesson_id))
        .do_update()
        .set(lessons_rated::rate.eq(rate))
        .execute(conn)
        .map_err(|e| StorageError::Database(format!("Rating upsert failed: {}", e)))?;
    Ok(())
}

/// (lesson_id, rate) pairs for the user
pub fn ratings(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<(String, i32)>, StorageError> {
    lessons_rated::table
        .filter(lessons_rated::user_id.eq(user_id))
        .select((lessons_rated::lesson_id, lessons_rated::rate))
        .load(conn)
        .map_err(|e| StorageError::Database(format!("Query failed: {}", e)))
}

// ============================================================================
// Cascade Cleanup
// ============================================================================

/// Delete every interaction record referencing a lesson, across all four kinds
///
/// Called by the lesson delete cascade; returns the total rows removed.
pub fn delete_for_lesson(
    conn: &mut SqliteConnection,
    lesson_id: &str,
) -> Result<usize, StorageError> {
    let mut removed = 0;

    removed += diesel::delete(
        lessons_completed::table.filter(lessons_completed::lesson_id.eq(lesson_id)),
    )
    .execute(conn)
    .map_err(|e| StorageError::Database(format!("Cascade delete failed: {}", e)))?;

    removed +=
        diesel::delete(lessons_liked::table.filter(lessons_liked::lesson_id.eq(lesson_id)))
            .execute(conn)
            .map_err(|e| StorageError::Database(format!("Cascade delete failed: {}", e)))?;

    removed +=
        diesel::delete(lessons_saved::table.filter(lessons_saved::lesson_id.eq(lesson_id)))
            .execute(conn)
            .map_err(|e| StorageError::Database(format!("Cascade delete failed: {}", e)))?;

    removed +=
        diesel::delete(lessons_rated::table.filter(lessons_rated::lesson_id.eq(lesson_id)))
            .execute(conn)
            .map_err(|e| StorageError::Database(format!("Cascade delete failed: {}", e)))?;

    Ok(removed)
}
