//! Event system for storage operations
//!
//! Provides an event bus for notifying listeners about storage operations.
//! Useful for:
//! - Audit logging
//! - Cache invalidation by callers after mutating calls

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Storage events emitted by services
#[derive(Debug, Clone)]
pub enum StorageEvent {
    /// A full content-tree reconciliation pass finished
    TreeSynchronized {
        chapters: usize,
        lessons: usize,
        deleted_chapters: usize,
        deleted_lessons: usize,
        failed_operations: usize,
    },
    LessonContentUpdated {
        id: String,
    },
    CommentAdded {
        lesson_id: String,
        user_id: String,
    },
}

/// Trait for event listeners
pub trait EventListener: Send + Sync {
    /// Handle an event
    fn on_event(&self, event: &StorageEvent);
}

/// Event bus for broadcasting storage events
pub struct EventBus {
    sender: broadcast::Sender<StorageEvent>,
}

impl EventBus {
    /// Create a new event bus with default capacity
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create a new event bus with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers
    pub fn emit(&self, event: StorageEvent) {
        trace!(event = ?event, "Emitting storage event");
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Logging event listener for audit trails
pub struct LoggingEventListener;

impl EventListener for LoggingEventListener {
    fn on_event(&self, event: &StorageEvent) {
        match event {
            StorageEvent::TreeSynchronized {
                chapters,
                lessons,
                deleted_chapters,
                deleted_lessons,
                failed_operations,
            } => {
                debug!(
                    chapters = chapters,
                    lessons = lessons,
                    deleted_chapters = deleted_chapters,
                    deleted_lessons = deleted_lessons,
                    failed = failed_operations,
                    "Content tree synchronized"
                );
            }
            StorageEvent::LessonContentUpdated { id } => {
                debug!(id = %id, "Lesson content updated");
            }
            StorageEvent::CommentAdded { lesson_id, user_id } => {
                trace!(lesson = %lesson_id, user = %user_id, "Comment added");
            }
        }
    }
}

/// Spawn a background task that logs all events
pub fn spawn_logging_listener(event_bus: Arc<EventBus>) -> tokio::task::JoinHandle<()> {
    let mut receiver = event_bus.subscribe();
    let listener = LoggingEventListener;

    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => listener.on_event(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    debug!(skipped = n, "Event listener lagged, skipped events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed, stopping listener");
                    break;
                }
            }
        }
    })
}
