//! Per-user progress aggregation
//!
//! Merges the four interaction record sets with the published lesson count
//! into a single metadata snapshot, computed fresh on every call.

use std::collections::HashMap;

use serde::Serialize;
use tokio::task::JoinError;

use crate::db::{interactions, lessons, Database};
use crate::error::StorageError;

/// Snapshot of one user's interaction state across the whole course
///
/// The maps are keyed by lesson id; absence of a key means the lesson has no
/// record of that kind for the user.
#[derive(Debug, Clone, Serialize)]
pub struct LessonsMetadata {
    pub completed: HashMap<String, bool>,
    pub liked: HashMap<String, bool>,
    pub saved: HashMap<String, bool>,
    /// Lesson id to rating value (1 to 5)
    pub rated: HashMap<String, u8>,
    /// Number of non-draft lessons in the course
    pub count: i64,
    /// Completion percentage over non-draft lessons, rounded to one decimal
    pub progress: f64,
}

/// Computes user metadata snapshots
pub struct MetadataService {
    db: Database,
}

impl MetadataService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Compute the user's metadata snapshot
    ///
    /// The five reads run as concurrent blocking tasks against the pool and
    /// are merged once all have returned.
    pub async fn compute(&self, user_id: &str) -> Result<LessonsMetadata, StorageError> {
        let completed = self.fetch(user_id, |conn, uid| {
            interactions::completed_lessons(conn, uid)
        });
        let liked = self.fetch(user_id, |conn, uid| interactions::liked_lessons(conn, uid));
        let saved = self.fetch(user_id, |conn, uid| interactions::saved_lessons(conn, uid));
        let rated = self.fetch(user_id, |conn, uid| interactions::ratings(conn, uid));
        let count = self.fetch(user_id, |conn, _| lessons::published_count(conn));

        let (completed, liked, saved, rated, count) =
            tokio::join!(completed, liked, saved, rated, count);

        let completed = flatten(completed)?;
        let liked = flatten(liked)?;
        let saved = flatten(saved)?;
        let rated = flatten(rated)?;
        let count = flatten(count)?;

        // Completion records survive a lesson being drafted, so the raw
        // ratio can exceed 1 while the draft lowers the denominator.
        let progress = if count > 0 {
            ((completed.len() as f64 / count as f64 * 1000.0).round() / 10.0).min(100.0)
        } else {
            0.0
        };

        Ok(LessonsMetadata {
            completed: completed.into_iter().map(|id| (id, true)).collect(),
            liked: liked.into_iter().map(|id| (id, true)).collect(),
            saved: saved.into_iter().map(|id| (id, true)).collect(),
            rated: rated
                .into_iter()
                .map(|(id, rate)| (id, rate as u8))
                .collect(),
            count,
            progress,
        })
    }

    fn fetch<T, F>(&self, user_id: &str, query: F) -> tokio::task::JoinHandle<Result<T, StorageError>>
    where
        T: Send + 'static,
        F: FnOnce(&mut diesel::SqliteConnection, &str) -> Result<T, StorageError> + Send + 'static,
    {
        let db = self.db.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = db.conn()?;
            query(&mut conn, &user_id)
        })
    }
}

fn flatten<T>(joined: Result<Result<T, StorageError>, JoinError>) -> Result<T, StorageError> {
    joined.map_err(|e| StorageError::Internal(format!("Metadata task failed: {}", e)))?
}
