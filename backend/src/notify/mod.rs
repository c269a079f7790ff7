//! Best-effort notifications about changed teacher schedules.
//!
//! Scheduling mutations hand a [`TeacherScheduleChanged`] event to the
//! [`NotificationDispatcher`] after the write has committed. Delivery happens
//! on a background task with bounded retry; a failed delivery is logged and
//! never reaches the caller of the scheduling operation.

mod dispatcher;
mod publisher;

pub use dispatcher::{DispatchStats, NotificationDispatcher, RetryPolicy};
pub use publisher::{LoggingPublisher, RecordingPublisher};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::TeacherId;

pub use crate::db::repo_config::DEFAULT_TOPIC;

/// Transport used to tell downstream systems about schedule changes.
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    /// Publish `payload` on `topic`. Returns `false` when delivery failed.
    async fn publish(&self, topic: &str, payload: &serde_json::Value) -> bool;
}

/// What happened to the teachers' schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    Assigned,
    Updated,
    Cleared,
}

/// Event payload published on the teacher topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherScheduleChanged {
    pub teacher_ids: Vec<TeacherId>,
    pub reason: ChangeReason,
    pub occurred_at: DateTime<Utc>,
}

impl TeacherScheduleChanged {
    /// Build an event with sorted, de-duplicated teacher ids.
    pub fn new(teacher_ids: impl IntoIterator<Item = TeacherId>, reason: ChangeReason) -> Self {
        let mut teacher_ids: Vec<TeacherId> = teacher_ids.into_iter().collect();
        teacher_ids.sort();
        teacher_ids.dedup();
        Self {
            teacher_ids,
            reason,
            occurred_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.teacher_ids.is_empty()
    }
}

/// Delivery failure. Only ever logged.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("publisher rejected event on topic {topic} after {attempts} attempt(s)")]
    Rejected { topic: String, attempts: u32 },
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("dispatcher is shut down")]
    Closed,
}
