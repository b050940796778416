use std::io;

use rocket::{figment::Figment, routes, Build, Rocket};
use thiserror::Error;
use tracing::trace;

use crate::{
    format::Formatter,
    queue::{NotificationSender, QueueClosed},
};

pub mod github;
pub use github::{GitHubEvent, GitHubSecret};

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("request needs exactly one event type header")]
    MissingEventType,
    #[error("request needs exactly one signature header")]
    MissingSignature,
    #[error("couldn't verify signature")]
    BadSignature,
    #[error("data limit exceeded")]
    PayloadTooLarge,
    #[error("couldn't read payload: {0}")]
    Io(#[from] io::Error),
    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Queue(#[from] QueueClosed),
}

/// Turns decoded events into notifications and hands them over to the bot.
pub struct WebhookRelay {
    sender: NotificationSender,
    formatter: Formatter,
}

impl WebhookRelay {
    pub fn new(sender: NotificationSender, formatter: Formatter) -> Self {
        Self { sender, formatter }
    }

    /// Formats `event` and queues the result, waiting for room in the queue if it is full.
    pub async fn relay(&self, event: &GitHubEvent) -> Result<(), WebhookError> {
        let notification = match self.formatter.format(event).await {
            Some(notification) => notification,
            // event doesn't need a message from the bot
            None => {
                trace!("event didn't need to be announced");
                return Ok(());
            }
        };

        trace!("queueing notification `{}`", notification.text);
        self.sender.enqueue(notification).await?;

        Ok(())
    }
}

pub fn build_rocket(figment: Figment, relay: WebhookRelay, secret: GitHubSecret) -> Rocket<Build> {
    rocket::custom(figment)
        .mount(
            "/",
            routes![
                github::github_webhook,
                github::github_webhook_put,
                github::github_webhook_patch,
                github::github_webhook_delete
            ],
        )
        .manage(relay)
        .manage(secret)
}
