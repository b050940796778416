use serde::Deserialize;

use crate::webhooks::github::events::{GitHubUser, Repository};

#[derive(Debug, PartialEq, Deserialize)]
pub struct RepositoryEvent {
    pub action: String,
    pub repository: Repository,
    pub sender: GitHubUser,
}
