//! Bounded FIFO between the webhook handlers and the bot.
//!
//! Producers wait when the queue is full: a slow IRC connection slows down webhook responses
//! instead of losing notifications at the HTTP boundary.

use thiserror::Error;
use tokio::sync::mpsc;

/// One formatted line, ready to be posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Name of the repository the event came from, used to pick channels
    pub repo: String,
    pub text: String,
}

#[derive(Debug, Error)]
#[error("notification queue was closed")]
pub struct QueueClosed;

/// Creates a queue holding at most `capacity` notifications.
///
/// # Panics
///
/// Panics if `capacity` is zero.
pub fn notification_queue(capacity: usize) -> (NotificationSender, NotificationReceiver) {
    let (sender, receiver) = mpsc::channel(capacity);
    (NotificationSender(sender), NotificationReceiver(receiver))
}

#[derive(Debug, Clone)]
pub struct NotificationSender(mpsc::Sender<Notification>);

impl NotificationSender {
    pub async fn enqueue(&self, notification: Notification) -> Result<(), QueueClosed> {
        self.0.send(notification).await.map_err(|_| QueueClosed)
    }
}

#[derive(Debug)]
pub struct NotificationReceiver(mpsc::Receiver<Notification>);

impl NotificationReceiver {
    /// Returns `None` once every sender is gone and the queue is drained.
    pub async fn dequeue(&mut self) -> Option<Notification> {
        self.0.recv().await
    }

    #[cfg(test)]
    pub fn try_dequeue(&mut self) -> Option<Notification> {
        self.0.try_recv().ok()
    }
}
