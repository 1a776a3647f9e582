//! Delayed reminders requested by the model through `schedule_request`.
//!
//! Delivery is best effort. A reminder that comes due while a turn is running
//! is injected at the next iteration boundary; one that comes due after the
//! turn ended waits in the queue until the owner drains it and starts a new
//! turn with it.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A reminder that has come due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub message: String,
    pub scheduled_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
}

impl Reminder {
    /// Text injected into the transcript as a user message.
    pub fn as_user_message(&self) -> String {
        format!(
            "[Scheduled reminder, requested at {}] {}",
            self.scheduled_at.format("%H:%M:%S UTC"),
            self.message
        )
    }
}

/// Cloneable handle; clones share one queue.
#[derive(Debug, Clone)]
pub struct ReminderScheduler {
    tx: mpsc::UnboundedSender<Reminder>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Reminder>>>,
    shutdown: Arc<Mutex<CancellationToken>>,
}

impl Default for ReminderScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ReminderScheduler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
            shutdown: Arc::new(Mutex::new(CancellationToken::new())),
        }
    }

    /// Queue `message` to come due after `delay`. Must be called inside a
    /// tokio runtime.
    pub fn schedule(&self, delay: Duration, message: impl Into<String>) -> DateTime<Utc> {
        let message = message.into();
        let scheduled_at = Utc::now();
        let due_at = scheduled_at
            + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
        let tx = self.tx.clone();
        let shutdown = self
            .shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        tracing::debug!(delay_ms = delay.as_millis() as u64, "reminder scheduled");
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = tx.send(Reminder { message, scheduled_at, due_at });
                }
            }
        });
        due_at
    }

    /// Take every reminder that has come due, oldest first.
    pub fn drain_due(&self) -> Vec<Reminder> {
        let mut rx = self.rx.lock().unwrap_or_else(PoisonError::into_inner);
        let mut due = Vec::new();
        while let Ok(reminder) = rx.try_recv() {
            due.push(reminder);
        }
        due.sort_by_key(|r| r.due_at);
        due
    }

    /// Put already-due reminders back so the next drain returns them again.
    pub fn requeue(&self, reminders: impl IntoIterator<Item = Reminder>) {
        for reminder in reminders {
            let _ = self.tx.send(reminder);
        }
    }

    /// Drop all pending timers. Reminders already due stay queued, and
    /// reminders scheduled afterwards run normally.
    pub fn cancel_pending(&self) {
        let mut shutdown = self.shutdown.lock().unwrap_or_else(PoisonError::into_inner);
        shutdown.cancel();
        *shutdown = CancellationToken::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn reminders_come_due_in_order() {
        let scheduler = ReminderScheduler::new();
        scheduler.schedule(Duration::from_secs(20), "second");
        scheduler.schedule(Duration::from_secs(10), "first");

        assert!(scheduler.drain_due().is_empty());

        tokio::time::sleep(Duration::from_secs(15)).await;
        let due = scheduler.drain_due();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].message, "first");

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(scheduler.drain_due()[0].message, "second");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_pending_drops_timers() {
        let scheduler = ReminderScheduler::new();
        scheduler.schedule(Duration::from_secs(1), "never");
        scheduler.cancel_pending();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(scheduler.drain_due().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn scheduling_after_cancel_still_delivers() {
        let scheduler = ReminderScheduler::new();
        scheduler.schedule(Duration::from_secs(1), "dropped");
        scheduler.cancel_pending();
        scheduler.clone().schedule(Duration::from_secs(1), "later");

        tokio::time::sleep(Duration::from_secs(5)).await;
        let due = scheduler.drain_due();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].message, "later");
    }

    #[tokio::test(start_paused = true)]
    async fn requeued_reminders_keep_due_order() {
        let scheduler = ReminderScheduler::new();
        scheduler.schedule(Duration::from_secs(1), "early");
        tokio::time::sleep(Duration::from_secs(2)).await;
        let taken = scheduler.drain_due();

        scheduler.schedule(Duration::from_secs(1), "late");
        tokio::time::sleep(Duration::from_secs(2)).await;
        scheduler.requeue(taken);

        let messages: Vec<String> = scheduler.drain_due().into_iter().map(|r| r.message).collect();
        assert_eq!(messages, vec!["early", "late"]);
    }

    #[test]
    fn user_message_carries_text() {
        let now = Utc::now();
        let reminder = Reminder {
            message: "check the build".into(),
            scheduled_at: now,
            due_at: now,
        };
        assert!(reminder.as_user_message().ends_with("check the build"));
    }
}
