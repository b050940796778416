use serde::Deserialize;
use url::Url;

mod issues;
mod ping;
mod pull_request;
mod repository;

pub use issues::*;
pub use ping::*;
pub use pull_request::*;
pub use repository::*;

#[derive(Debug, PartialEq)]
pub enum GitHubEvent {
    Issues(IssuesEvent),
    Ping(PingEvent),
    PullRequest(PullRequestEvent),
    Repository(RepositoryEvent),
}

impl GitHubEvent {
    /// Decodes a payload according to the `X-GitHub-Event` header value.
    ///
    /// Event types we don't announce aren't an error, they decode to `None`.
    pub fn from_payload(event_type: &str, payload: &[u8]) -> serde_json::Result<Option<Self>> {
        let event = match event_type {
            "issues" => Self::Issues(serde_json::from_slice(payload)?),
            "ping" => Self::Ping(serde_json::from_slice(payload)?),
            "pull_request" => Self::PullRequest(serde_json::from_slice(payload)?),
            "repository" => Self::Repository(serde_json::from_slice(payload)?),
            _ => return Ok(None),
        };

        Ok(Some(event))
    }
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    pub id: u64,
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub html_url: Url,
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub html_url: Url,
    pub title: String,
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: Url,
    pub title: String,
    pub merged: Option<bool>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const PULL_REQUEST_CLOSED: &str = r#"{
        "action": "closed",
        "number": 7,
        "pull_request": {
            "number": 7,
            "html_url": "https://github.com/prologin/foo/pull/7",
            "title": "Fix bug",
            "merged": true,
            "state": "closed"
        },
        "repository": {
            "id": 42,
            "name": "foo",
            "full_name": "prologin/foo",
            "html_url": "https://github.com/prologin/foo"
        },
        "sender": { "login": "bob", "id": 1 }
    }"#;

    pub(crate) const ISSUE_LABELED: &str = r#"{
        "action": "labeled",
        "issue": {
            "number": 3,
            "html_url": "https://github.com/prologin/foo/issues/3",
            "title": "Crash on start"
        },
        "label": { "name": "bug" },
        "repository": {
            "name": "foo",
            "full_name": "prologin/foo",
            "html_url": "https://github.com/prologin/foo"
        },
        "sender": { "login": "alice", "id": 2 }
    }"#;

    #[test]
    fn decode_pull_request() {
        let event = GitHubEvent::from_payload("pull_request", PULL_REQUEST_CLOSED.as_bytes())
            .unwrap()
            .expect("pull_request is a known event type");

        match event {
            GitHubEvent::PullRequest(event) => {
                assert_eq!(event.action, "closed");
                assert_eq!(event.sender.login, "bob");
                assert_eq!(event.repository.name, "foo");
                assert_eq!(event.pull_request.number, 7);
                assert_eq!(event.pull_request.merged, Some(true));
            }
            other => panic!("decoded as the wrong variant: {:?}", other),
        }
    }

    #[test]
    fn decoding_is_idempotent() {
        let first = GitHubEvent::from_payload("issues", ISSUE_LABELED.as_bytes()).unwrap();
        let second = GitHubEvent::from_payload("issues", ISSUE_LABELED.as_bytes()).unwrap();

        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_event_type_is_ignored() {
        let event = GitHubEvent::from_payload("watch", b"{\"action\": \"started\"}").unwrap();
        assert!(event.is_none());

        // markers are matched exactly
        let event = GitHubEvent::from_payload("Issues", ISSUE_LABELED.as_bytes()).unwrap();
        assert!(event.is_none());
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(GitHubEvent::from_payload("issues", b"{\"action\": ").is_err());
        // well-formed JSON, but not an issues event
        assert!(GitHubEvent::from_payload("issues", PULL_REQUEST_CLOSED.as_bytes()).is_err());
    }

    #[test]
    fn decode_ping() {
        let payload = br#"{"zen": "Keep it logically awesome.", "hook_id": 12}"#;
        let event = GitHubEvent::from_payload("ping", payload).unwrap();

        assert_eq!(
            event,
            Some(GitHubEvent::Ping(PingEvent {
                zen: "Keep it logically awesome.".to_owned(),
                hook_id: Some(12),
                repository: None,
                sender: None,
            }))
        );
    }
}
