use tracing::trace;

use crate::{queue::Notification, shortener::LinkShortener, webhooks::GitHubEvent};

pub(crate) mod colors;
pub use colors::ColorTheme;

mod github;
use github::announcement;

mod message_builder;

pub(crate) mod utils;

/// Turns GitHub events into IRC notifications.
pub struct Formatter {
    theme: ColorTheme,
    shortener: Option<LinkShortener>,
}

impl Formatter {
    pub fn new(theme: ColorTheme, shortener: Option<LinkShortener>) -> Self {
        Self { theme, shortener }
    }

    /// Returns `None` when the event isn't worth announcing.
    pub async fn format(&self, event: &GitHubEvent) -> Option<Notification> {
        let announcement = announcement(event)?;

        let url = match &self.shortener {
            Some(shortener) => shortener.shorten_or_original(announcement.url).await,
            None => announcement.url.to_string(),
        };

        let text = announcement.render(&self.theme, &url);
        trace!("formatted notification: {:?}", text);

        Some(Notification {
            repo: announcement.repo.to_owned(),
            text,
        })
    }
}
