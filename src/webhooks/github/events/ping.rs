use serde::Deserialize;

use crate::webhooks::github::events::{GitHubUser, Repository};

/// Sent once by GitHub when a webhook is set up.
#[derive(Debug, PartialEq, Deserialize)]
pub struct PingEvent {
    pub zen: String,
    pub hook_id: Option<u64>,
    pub repository: Option<Repository>,
    pub sender: Option<GitHubUser>,
}
