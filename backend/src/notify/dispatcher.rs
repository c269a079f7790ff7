//! Background delivery of schedule notifications.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::{NotificationError, NotificationPublisher, TeacherScheduleChanged};
use crate::db::repo_config::NotificationSettings;

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total publish attempts per event, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each failure.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&NotificationSettings::default())
    }
}

impl From<&NotificationSettings> for RetryPolicy {
    fn from(settings: &NotificationSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
        }
    }
}

/// Delivery counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStats {
    pub delivered: u64,
    pub failed: u64,
    pub retried: u64,
}

#[derive(Default)]
struct Counters {
    delivered: AtomicU64,
    failed: AtomicU64,
    retried: AtomicU64,
}

/// Owns the notification queue and its worker task.
///
/// Created once at start-up and shared by clone. `dispatch` enqueues and
/// returns immediately; `shutdown` closes the queue, lets the worker drain it
/// and waits for it to finish.
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: Arc<Mutex<Option<mpsc::UnboundedSender<TeacherScheduleChanged>>>>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
    counters: Arc<Counters>,
}

impl NotificationDispatcher {
    /// Spawn the worker on the current tokio runtime.
    pub fn start(
        publisher: Arc<dyn NotificationPublisher>,
        topic: impl Into<String>,
        policy: RetryPolicy,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());
        let worker = tokio::spawn(run_worker(
            rx,
            publisher,
            topic.into(),
            policy,
            counters.clone(),
        ));

        Self {
            sender: Arc::new(Mutex::new(Some(tx))),
            worker: Arc::new(Mutex::new(Some(worker))),
            counters,
        }
    }

    /// Queue an event. Empty events are dropped. Never fails the caller.
    pub fn dispatch(&self, event: TeacherScheduleChanged) {
        if event.is_empty() {
            return;
        }
        let sent = match self.sender.lock().as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        };
        if !sent {
            warn!(error = %NotificationError::Closed, "notification dropped");
        }
    }

    /// Close the queue and wait until every queued event has been handled.
    pub async fn shutdown(&self) {
        drop(self.sender.lock().take());
        let worker = self.worker.lock().take();
        if let Some(handle) = worker {
            if let Err(e) = handle.await {
                error!("notification worker ended abnormally: {}", e);
            }
        }
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            retried: self.counters.retried.load(Ordering::Relaxed),
        }
    }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<TeacherScheduleChanged>,
    publisher: Arc<dyn NotificationPublisher>,
    topic: String,
    policy: RetryPolicy,
    counters: Arc<Counters>,
) {
    while let Some(event) = rx.recv().await {
        match deliver(publisher.as_ref(), &topic, &event, policy, &counters).await {
            Ok(()) => {
                counters.delivered.fetch_add(1, Ordering::Relaxed);
                debug!(topic = %topic, teachers = event.teacher_ids.len(), "notification delivered");
            }
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, teachers = ?event.teacher_ids, "notification not delivered");
            }
        }
    }
    debug!("notification worker stopped");
}

async fn deliver(
    publisher: &dyn NotificationPublisher,
    topic: &str,
    event: &TeacherScheduleChanged,
    policy: RetryPolicy,
    counters: &Counters,
) -> Result<(), NotificationError> {
    let payload = serde_json::to_value(event)?;
    let mut backoff = policy.initial_backoff;

    for attempt in 1..=policy.max_attempts {
        if attempt > 1 {
            counters.retried.fetch_add(1, Ordering::Relaxed);
            tokio::time::sleep(backoff).await;
            backoff = next_backoff(backoff);
        }
        if publisher.publish(topic, &payload).await {
            return Ok(());
        }
        warn!(topic, attempt, "notification publish failed");
    }

    Err(NotificationError::Rejected {
        topic: topic.to_string(),
        attempts: policy.max_attempts,
    })
}

/// Exponential backoff step, saturating at `Duration::MAX`.
fn next_backoff(current: Duration) -> Duration {
    current.saturating_mul(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TeacherId;
    use crate::notify::{ChangeReason, RecordingPublisher};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
        }
    }

    fn event() -> TeacherScheduleChanged {
        TeacherScheduleChanged::new([TeacherId::new(1)], ChangeReason::Assigned)
    }

    #[tokio::test]
    async fn test_retries_until_delivered() {
        let publisher = RecordingPublisher::new();
        publisher.fail_next(2);
        let dispatcher =
            NotificationDispatcher::start(Arc::new(publisher.clone()), "t", fast_policy(3));

        dispatcher.dispatch(event());
        dispatcher.shutdown().await;

        assert_eq!(publisher.attempts(), 3);
        assert_eq!(publisher.messages().len(), 1);
        assert_eq!(
            dispatcher.stats(),
            DispatchStats {
                delivered: 1,
                failed: 0,
                retried: 2
            }
        );
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let publisher = RecordingPublisher::new();
        publisher.fail_next(10);
        let dispatcher =
            NotificationDispatcher::start(Arc::new(publisher.clone()), "t", fast_policy(2));

        dispatcher.dispatch(event());
        dispatcher.shutdown().await;

        assert_eq!(publisher.attempts(), 2);
        assert!(publisher.messages().is_empty());
        assert_eq!(dispatcher.stats().failed, 1);
    }

    #[tokio::test]
    async fn test_dispatch_after_shutdown_is_dropped() {
        let publisher = RecordingPublisher::new();
        let dispatcher =
            NotificationDispatcher::start(Arc::new(publisher.clone()), "t", fast_policy(1));
        dispatcher.shutdown().await;

        dispatcher.dispatch(event());
        assert_eq!(publisher.attempts(), 0);
    }

    #[tokio::test]
    async fn test_empty_events_are_skipped() {
        let publisher = RecordingPublisher::new();
        let dispatcher =
            NotificationDispatcher::start(Arc::new(publisher.clone()), "t", fast_policy(1));

        dispatcher.dispatch(TeacherScheduleChanged::new(Vec::new(), ChangeReason::Cleared));
        dispatcher.shutdown().await;

        assert_eq!(publisher.attempts(), 0);
    }

    #[test]
    fn test_backoff_doubles_and_saturates() {
        assert_eq!(
            next_backoff(Duration::from_millis(50)),
            Duration::from_millis(100)
        );
        assert_eq!(next_backoff(Duration::MAX), Duration::MAX);

        let mut backoff = Duration::from_millis(1);
        for _ in 0..200 {
            backoff = next_backoff(backoff);
        }
        assert_eq!(backoff, Duration::MAX);
    }
}
