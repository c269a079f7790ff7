use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

use super::NotificationPublisher;

/// Publisher that only writes the event to the log.
#[derive(Debug, Clone, Default)]
pub struct LoggingPublisher;

#[async_trait]
impl NotificationPublisher for LoggingPublisher {
    async fn publish(&self, topic: &str, payload: &serde_json::Value) -> bool {
        info!(topic, %payload, "schedule notification");
        true
    }
}

#[derive(Default)]
struct Recorded {
    messages: Vec<(String, serde_json::Value)>,
    failures_left: usize,
    attempts: usize,
}

/// In-memory publisher for tests.
///
/// Clones share the same recording. [`RecordingPublisher::fail_next`] makes
/// the next `n` publish attempts fail.
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, count: usize) {
        self.inner.lock().failures_left = count;
    }

    /// Successfully delivered messages in delivery order.
    pub fn messages(&self) -> Vec<(String, serde_json::Value)> {
        self.inner.lock().messages.clone()
    }

    /// Every publish call, failed or not.
    pub fn attempts(&self) -> usize {
        self.inner.lock().attempts
    }
}

#[async_trait]
impl NotificationPublisher for RecordingPublisher {
    async fn publish(&self, topic: &str, payload: &serde_json::Value) -> bool {
        let mut inner = self.inner.lock();
        inner.attempts += 1;
        if inner.failures_left > 0 {
            inner.failures_left -= 1;
            return false;
        }
        inner.messages.push((topic.to_string(), payload.clone()));
        true
    }
}
