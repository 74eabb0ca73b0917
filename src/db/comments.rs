//! Lesson comment threads

use diesel::prelude::*;
use uuid::Uuid;

use super::diesel_schema::lesson_comments;
use super::models::{current_timestamp, Comment, NewComment};
use crate::error::StorageError;

/// Add a comment to a lesson's thread
///
/// Comment ids are server-assigned, unlike chapter/lesson ids which come
/// from the authoring client.
pub fn add_comment(
    conn: &mut SqliteConnection,
    lesson_id: &str,
    user_id: &str,
    content: &str,
) -> Result<Comment, StorageError> {
    let id = Uuid::new_v4().to_string();
    let now = current_timestamp();

    let new_comment = NewComment {
        id: &id,
        lesson_id,
        user_id,
        content,
        created_at: &now,
    };

    diesel::insert_into(lesson_comments::table)
        .values(&new_comment)
        .execute(conn)
        .map_err(|e| StorageError::Database(format!("Insert failed: {}", e)))?;

    Ok(Comment {
        id,
        lesson_id: lesson_id.to_string(),
        user_id: user_id.to_string(),
        content: content.to_string(),
        created_at: now,
    })
}

/// List a lesson's comments ordered by creation time ascending
///
/// The id tie-break keeps the order deterministic if two timestamps collide.
pub fn list_for_lesson(
    conn: &mut SqliteConnection,
    lesson_id: &str,
) -> Result<Vec<Comment>, StorageError> {
    lesson_comments::table
        .filter(lesson_comments::lesson_id.eq(lesson_id))
        .order((
            lesson_comments::created_at.asc(),
            lesson_comments::id.asc(),
        ))
        .load(conn)
        .map_err(|e| StorageError::Database(format!("Query failed: {}", e)))
}

/// Delete a lesson's whole comment thread (lesson delete cascade)
pub fn delete_for_lesson(
    conn: &mut SqliteConnection,
    lesson_id: &str,
) -> Result<usize, StorageError> {
    diesel::delete(lesson_comments::table.filter(lesson_comments::lesson_id.eq(lesson_id)))
        .execute(conn)
        .map_err(|e| StorageError::Database(format!("Cascade delete failed: {}", e)))
}

/// Get total comment count
pub fn comment_count(conn: &mut SqliteConnection) -> Result<i64, StorageError> {
    lesson_comments::table
        .count()
        .get_result(conn)
        .map_err(|e| StorageError::Database(format!("Count query failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_comments_listed_in_creation_order() {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.conn().unwrap();

        add_comment(&mut conn, "l1", "u1", "first").unwrap();
        add_comment(&mut conn, "l1", "u2", "second").unwrap();
        add_comment(&mut conn, "l2", "u1", "other thread").unwrap();

        let thread = list_for_lesson(&mut conn, "l1").unwrap();
        let contents: Vec<&str> = thread.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[test]
    fn test_back_to_back_comments_keep_posting_order() {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.conn().unwrap();

        // Posted in a tight loop; microsecond timestamps keep them sorted.
        for i in 0..10 {
            add_comment(&mut conn, "l1", "u1", &format!("reply {}", i)).unwrap();
        }

        let thread = list_for_lesson(&mut conn, "l1").unwrap();
        let contents: Vec<String> = thread.iter().map(|c| c.content.clone()).collect();
        let expected: Vec<String> = (0..10).map(|i| format!("reply {}", i)).collect();
        assert_eq!(contents, expected);
    }

    #[test]
    fn test_delete_for_lesson_clears_thread() {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.conn().unwrap();

        add_comment(&mut conn, "l1", "u1", "a").unwrap();
        add_comment(&mut conn, "l1", "u1", "b").unwrap();

        assert_eq!(delete_for_lesson(&mut conn, "l1").unwrap(), 2);
        assert_eq!(comment_count(&mut conn).unwrap(), 0);
    }
}
