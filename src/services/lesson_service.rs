//! Per-lesson operations: reads, interaction toggles, comments, content edits
//!
//! Interaction toggles are keyed by the caller's identity plus the lesson id;
//! every mutation acknowledges with a bare success rather than echoing state,
//! so handlers stay thin.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::auth::Caller;
use crate::db::models::{Comment, Lesson, LessonWithComments};
use crate::db::{comments, interactions, lessons, Database, DbConn};
use crate::error::StorageError;

use super::events::{EventBus, StorageEvent};

/// Content fields for the admin editing path
///
/// The form submits the full field set; omitted optional fields clear the
/// stored value.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateContentInput {
    pub name: String,
    pub video: Option<String>,
    pub body: Option<String>,
    #[serde(default)]
    pub is_draft: bool,
}

pub struct LessonService {
    db: Database,
    events: Arc<EventBus>,
}

impl LessonService {
    pub fn new(db: Database, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    fn require_lesson(&self, conn: &mut DbConn, lesson_id: &str) -> Result<Lesson, StorageError> {
        lessons::get_lesson(conn, lesson_id)?
            .ok_or_else(|| StorageError::NotFound(format!("Lesson not found: {}", lesson_id)))
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Get a lesson with its comment thread
    ///
    /// Draft lessons are visible to admins only.
    pub fn get(
        &self,
        caller: &Caller,
        lesson_id: &str,
    ) -> Result<Option<LessonWithComments>, StorageError> {
        let mut conn = self.db.conn()?;
        let lesson = match lessons::get_lesson(&mut conn, lesson_id)? {
            Some(lesson) => lesson,
            None => return Ok(None),
        };
        if lesson.is_draft() && !caller.is_admin() {
            return Ok(None);
        }
        let comments = comments::list_for_lesson(&mut conn, lesson_id)?;
        Ok(Some(LessonWithComments { lesson, comments }))
    }

    // ========================================================================
    // Interaction Toggles
    // ========================================================================

    /// Mark a lesson completed for the caller
    pub fn set_completed(&self, caller: &Caller, lesson_id: &str) -> Result<(), StorageError> {
        let mut conn = self.db.conn()?;
        self.require_lesson(&mut conn, lesson_id)?;
        interactions::set_completed(&mut conn, &caller.user_id, lesson_id)
    }

    /// Unmark a lesson completed for the caller
    ///
    /// Record removals tolerate a missing lesson; the outcome (no record) is
    /// the same either way.
    pub fn set_incomplete(&self, caller: &Caller, lesson_id: &str) -> Result<(), StorageError> {
        let mut conn = self.db.conn()?;
        interactions::set_incomplete(&mut conn, &caller.user_id, lesson_id)
    }

    /// Like a lesson for the caller
    pub fn set_liked(&self, caller: &Caller, lesson_id: &str) -> Result<(), StorageError> {
        let mut conn = self.db.conn()?;
        self.require_lesson(&mut conn, lesson_id)?;
        interactions::set_liked(&mut conn, &caller.user_id, lesson_id)
    }

    /// Remove the caller's like
    pub fn set_disliked(&self, caller: &Caller, lesson_id: &str) -> Result<(), StorageError> {
        let mut conn = self.db.conn()?;
        interactions::set_disliked(&mut conn, &caller.user_id, lesson_id)
    }

    /// Save a lesson for the caller
    pub fn set_saved(&self, caller: &Caller, lesson_id: &str) -> Result<(), StorageError> {
        let mut conn = self.db.conn()?;
        self.require_lesson(&mut conn, lesson_id)?;
        interactions::set_saved(&mut conn, &caller.user_id, lesson_id)
    }

    /// Remove the caller's save
    pub fn set_unsaved(&self, caller: &Caller, lesson_id: &str) -> Result<(), StorageError> {
        let mut conn = self.db.conn()?;
        interactions::set_unsaved(&mut conn, &caller.user_id, lesson_id)
    }

    /// Set the caller's rating for a lesson, replacing any previous value
    pub fn set_rated(
        &self,
        caller: &Caller,
        lesson_id: &str,
        rate: i32,
    ) -> Result<(), StorageError> {
        if !(1..=5).contains(&rate) {
            return Err(StorageError::InvalidInput(format!(
                "rate must be between 1 and 5, got {}",
                rate
            )));
        }
        let mut conn = self.db.conn()?;
        self.require_lesson(&mut conn, lesson_id)?;
        interactions::set_rating(&mut conn, &caller.user_id, lesson_id, rate)
    }

    // ========================================================================
    // Comments
    // ========================================================================

    /// Append a comment to a lesson's thread
    pub fn add_comment(
        &self,
        caller: &Caller,
        lesson_id: &str,
        content: &str,
    ) -> Result<Comment, StorageError> {
        if content.trim().is_empty() {
            return Err(StorageError::InvalidInput(
                "comment content must not be empty".to_string(),
            ));
        }

        let comment = {
            let mut conn = self.db.conn()?;
            self.require_lesson(&mut conn, lesson_id)?;
            comments::add_comment(&mut conn, lesson_id, &caller.user_id, content)?
        };

        self.events.emit(StorageEvent::CommentAdded {
            lesson_id: lesson_id.to_string(),
            user_id: caller.user_id.clone(),
        });

        Ok(comment)
    }

    // ========================================================================
    // Content Editing
    // ========================================================================

    /// Replace a lesson's content fields (admin only)
    pub fn update_content(
        &self,
        caller: &Caller,
        lesson_id: &str,
        input: UpdateContentInput,
    ) -> Result<(), StorageError> {
        caller.require_admin()?;

        if input.name.trim().is_empty() {
            return Err(StorageError::InvalidInput(
                "lesson name must not be empty".to_string(),
            ));
        }

        let updated = {
            let mut conn = self.db.conn()?;
            lessons::update_content(
                &mut conn,
                lesson_id,
                &input.name,
                input.video.as_deref(),
                input.body.as_deref(),
                input.is_draft,
            )?
        };
        if !updated {
            return Err(StorageError::NotFound(format!(
                "Lesson not found: {}",
                lesson_id
            )));
        }

        info!(lesson = %lesson_id, draft = input.is_draft, "Lesson content updated");
        self.events.emit(StorageEvent::LessonContentUpdated {
            id: lesson_id.to_string(),
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::db::chapters;

    fn admin() -> Caller {
        Caller::new("admin-1", Role::Admin)
    }

    fn learner() -> Caller {
        Caller::new("user-1", Role::Learner)
    }

    fn service() -> (LessonService, Database) {
        let db = Database::open_in_memory().unwrap();
        {
            let mut conn = db.conn().unwrap();
            chapters::upsert_chapter(&mut conn, "c1", "Intro", 0).unwrap();
            lessons::upsert_lesson_structure(&mut conn, "l1", "c1", "Welcome", 0).unwrap();
        }
        let events = Arc::new(EventBus::new());
        (LessonService::new(db.clone(), events), db)
    }

    #[test]
    fn test_complete_then_incomplete_round_trip() {
        let (service, db) = service();
        let caller = learner();

        service.set_completed(&caller, "l1").unwrap();
        {
            let mut conn = db.conn().unwrap();
            assert_eq!(
                interactions::completed_lessons(&mut conn, "user-1").unwrap(),
                vec!["l1"]
            );
        }

        service.set_incomplete(&caller, "l1").unwrap();
        let mut conn = db.conn().unwrap();
        assert!(interactions::completed_lessons(&mut conn, "user-1")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_marking_missing_lesson_is_not_found() {
        let (service, _db) = service();

        let err = service.set_completed(&learner(), "ghost").unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));

        let err = service.set_liked(&learner(), "ghost").unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn test_unmarking_missing_lesson_is_tolerated() {
        let (service, _db) = service();

        service.set_incomplete(&learner(), "ghost").unwrap();
        service.set_disliked(&learner(), "ghost").unwrap();
        service.set_unsaved(&learner(), "ghost").unwrap();
    }

    #[test]
    fn test_rating_bounds_are_enforced() {
        let (service, _db) = service();

        assert!(matches!(
            service.set_rated(&learner(), "l1", 0).unwrap_err(),
            StorageError::InvalidInput(_)
        ));
        assert!(matches!(
            service.set_rated(&learner(), "l1", 6).unwrap_err(),
            StorageError::InvalidInput(_)
        ));
        service.set_rated(&learner(), "l1", 1).unwrap();
        service.set_rated(&learner(), "l1", 5).unwrap();
    }

    #[test]
    fn test_rating_replaces_previous_value() {
        let (service, db) = service();

        service.set_rated(&learner(), "l1", 3).unwrap();
        service.set_rated(&learner(), "l1", 5).unwrap();

        let mut conn = db.conn().unwrap();
        assert_eq!(
            interactions::ratings(&mut conn, "user-1").unwrap(),
            vec![("l1".to_string(), 5)]
        );
    }

    #[test]
    fn test_empty_comment_is_rejected() {
        let (service, _db) = service();

        let err = service.add_comment(&learner(), "l1", "   ").unwrap_err();
        assert!(matches!(err, StorageError::InvalidInput(_)));
    }

    #[test]
    fn test_comment_appears_in_lesson_thread() {
        let (service, _db) = service();

        service.add_comment(&learner(), "l1", "great intro").unwrap();

        let fetched = service.get(&learner(), "l1").unwrap().unwrap();
        assert_eq!(fetched.comments.len(), 1);
        assert_eq!(fetched.comments[0].content, "great intro");
        assert_eq!(fetched.comments[0].user_id, "user-1");
    }

    #[test]
    fn test_update_content_requires_admin() {
        let (service, _db) = service();

        let input = UpdateContentInput {
            name: "Welcome".into(),
            video: None,
            body: None,
            is_draft: false,
        };
        let err = service
            .update_content(&learner(), "l1", input)
            .unwrap_err();
        assert!(matches!(err, StorageError::Forbidden(_)));
    }

    #[test]
    fn test_update_content_missing_lesson_is_not_found() {
        let (service, _db) = service();

        let input = UpdateContentInput {
            name: "Ghost".into(),
            video: None,
            body: None,
            is_draft: false,
        };
        let err = service.update_content(&admin(), "ghost", input).unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn test_draft_lesson_hidden_from_learners() {
        let (service, _db) = service();

        let input = UpdateContentInput {
            name: "Welcome".into(),
            video: Some("intro.mp4".into()),
            body: Some("<p>hi</p>".into()),
            is_draft: true,
        };
        service.update_content(&admin(), "l1", input).unwrap();

        assert!(service.get(&learner(), "l1").unwrap().is_none());
        let for_admin = service.get(&admin(), "l1").unwrap().unwrap();
        assert!(for_admin.lesson.is_draft());
        assert_eq!(for_admin.lesson.video.as_deref(), Some("intro.mp4"));
    }
}
