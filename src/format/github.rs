use std::fmt::{self, Write};

use url::Url;

use crate::{
    format::{
        colors::{Color, ColorTheme},
        message_builder::MessageBuilder,
        utils::shorten_content,
    },
    webhooks::github::{GitHubEvent, IssuesEvent, PullRequestEvent, RepositoryEvent},
};

/// Label and color replacing `closed` for pull requests that were merged.
const MERGED_LABEL: &str = "merged";
const MERGED_COLOR: Color = Color::Purple;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    PullRequest,
    Issue,
    Repository,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::PullRequest => "Pull request",
            Self::Issue => "Issue",
            Self::Repository => "Repository",
        };
        f.write_str(label)
    }
}

/// The parts of an event that end up in a notification.
#[derive(Debug)]
pub struct Announcement<'a> {
    pub repo: &'a str,
    pub kind: Kind,
    pub number: Option<u64>,
    pub action: &'a str,
    pub merged: bool,
    pub actor: &'a str,
    pub title: &'a str,
    pub url: &'a Url,
}

/// Picks what to say about `event`, if anything.
pub fn announcement(event: &GitHubEvent) -> Option<Announcement<'_>> {
    match event {
        GitHubEvent::PullRequest(event) => pull_request(event),
        GitHubEvent::Issues(event) => issues(event),
        GitHubEvent::Repository(event) => repository(event),
        GitHubEvent::Ping(_) => None,
    }
}

fn pull_request(event: &PullRequestEvent) -> Option<Announcement<'_>> {
    match event.action.as_str() {
        "opened" | "closed" | "reopened" => {}
        // the other actions are too verbose to announce
        _ => return None,
    }

    let pr = &event.pull_request;
    Some(Announcement {
        repo: &event.repository.name,
        kind: Kind::PullRequest,
        number: Some(pr.number),
        action: &event.action,
        merged: pr.merged.unwrap_or(false),
        actor: &event.sender.login,
        title: &pr.title,
        url: &pr.html_url,
    })
}

fn issues(event: &IssuesEvent) -> Option<Announcement<'_>> {
    match event.action.as_str() {
        "opened" | "closed" | "reopened" => {}
        _ => return None,
    }

    let issue = &event.issue;
    Some(Announcement {
        repo: &event.repository.name,
        kind: Kind::Issue,
        number: Some(issue.number),
        action: &event.action,
        merged: false,
        actor: &event.sender.login,
        title: &issue.title,
        url: &issue.html_url,
    })
}

fn repository(event: &RepositoryEvent) -> Option<Announcement<'_>> {
    if event.action != "created" {
        return None;
    }

    let repo = &event.repository;
    Some(Announcement {
        repo: &repo.name,
        kind: Kind::Repository,
        number: None,
        action: &event.action,
        merged: false,
        actor: &event.sender.login,
        title: &repo.full_name,
        url: &repo.html_url,
    })
}

impl Announcement<'_> {
    /// Renders `[<repo>] <Kind> #<number> <action> by <actor>: <title>. <url>`.
    ///
    /// `url` is taken separately so a shortened link can be used instead of [`Self::url`].
    pub fn render(&self, theme: &ColorTheme, url: &str) -> String {
        let mut message = MessageBuilder::new();

        message.tag(self.repo, theme.repository);
        write!(message, " {}", self.kind).unwrap();
        if let Some(number) = self.number {
            write!(message, " #{}", number).unwrap();
        }

        write!(message, " ").unwrap();
        if self.merged {
            message.color(MERGED_LABEL, Some(MERGED_COLOR));
        } else {
            message.color(self.action, theme.action(self.action));
        }

        write!(
            message,
            " by {}: {}. {}",
            self.actor,
            shorten_content(self.title),
            url
        )
        .unwrap();

        message.build()
    }
}

#[cfg(test)]
mod tests {
    use crate::webhooks::github::{
        events::tests::{ISSUE_LABELED, PULL_REQUEST_CLOSED},
        GitHubUser, Issue, PullRequest, Repository,
    };

    use super::*;

    fn repo() -> Repository {
        Repository {
            name: "foo".to_owned(),
            full_name: "prologin/foo".to_owned(),
            html_url: Url::parse("https://github.com/prologin/foo").unwrap(),
        }
    }

    fn user(login: &str) -> GitHubUser {
        GitHubUser {
            login: login.to_owned(),
            id: 1,
        }
    }

    fn pull_request_event(action: &str, merged: Option<bool>) -> GitHubEvent {
        GitHubEvent::PullRequest(PullRequestEvent {
            repository: repo(),
            sender: user("bob"),
            pull_request: PullRequest {
                number: 7,
                html_url: Url::parse("https://github.com/prologin/foo/pull/7").unwrap(),
                title: "Fix bug".to_owned(),
                merged,
            },
            action: action.to_owned(),
        })
    }

    fn issues_event(action: &str) -> GitHubEvent {
        GitHubEvent::Issues(IssuesEvent {
            repository: repo(),
            sender: user("alice"),
            issue: Issue {
                number: 3,
                html_url: Url::parse("https://github.com/prologin/foo/issues/3").unwrap(),
                title: "Crash on start".to_owned(),
            },
            action: action.to_owned(),
        })
    }

    fn render(event: &GitHubEvent, url: &str) -> Option<String> {
        announcement(event).map(|a| a.render(&ColorTheme::default(), url))
    }

    #[test]
    fn merged_pull_request() {
        let event = pull_request_event("closed", Some(true));

        assert_eq!(
            render(&event, "http://git.io/x").unwrap(),
            "[\x0302foo\x03] Pull request #7 \x0306merged\x03 by bob: Fix bug. http://git.io/x"
        );
    }

    #[test]
    fn closed_unmerged_pull_request() {
        let event = pull_request_event("closed", Some(false));

        assert_eq!(
            render(&event, "http://git.io/x").unwrap(),
            "[\x0302foo\x03] Pull request #7 \x0304closed\x03 by bob: Fix bug. http://git.io/x"
        );
    }

    #[test]
    fn opened_issue() {
        let event = issues_event("opened");

        assert_eq!(
            render(&event, "https://github.com/prologin/foo/issues/3").unwrap(),
            "[\x0302foo\x03] Issue #3 \x0303opened\x03 by alice: Crash on start. https://github.com/prologin/foo/issues/3"
        );
    }

    #[test]
    fn created_repository_has_no_number() {
        let event = GitHubEvent::Repository(RepositoryEvent {
            action: "created".to_owned(),
            repository: repo(),
            sender: user("bob"),
        });

        assert_eq!(
            render(&event, "https://github.com/prologin/foo").unwrap(),
            "[\x0302foo\x03] Repository \x0309created\x03 by bob: prologin/foo. https://github.com/prologin/foo"
        );
    }

    #[test]
    fn unthemed_parts_are_plain() {
        let event = issues_event("reopened");
        let theme = ColorTheme {
            repository: None,
            actions: Default::default(),
        };

        let message = announcement(&event).unwrap().render(&theme, "u");
        assert_eq!(message, "[foo] Issue #3 reopened by alice: Crash on start. u");
    }

    #[test]
    fn other_actions_are_not_announced() {
        assert!(render(&pull_request_event("synchronize", None), "u").is_none());
        assert!(render(&pull_request_event("created", None), "u").is_none());
        assert!(render(&issues_event("labeled"), "u").is_none());
        assert!(render(&issues_event("created"), "u").is_none());

        let event = GitHubEvent::Repository(RepositoryEvent {
            action: "deleted".to_owned(),
            repository: repo(),
            sender: user("bob"),
        });
        assert!(render(&event, "u").is_none());
    }

    #[test]
    fn decoded_payloads() {
        let event = GitHubEvent::from_payload("pull_request", PULL_REQUEST_CLOSED.as_bytes())
            .unwrap()
            .unwrap();
        let message = render(&event, "http://git.io/x").unwrap();
        assert!(message.contains("\x0306merged\x03"));
        assert!(!message.contains("closed"));

        let event = GitHubEvent::from_payload("issues", ISSUE_LABELED.as_bytes())
            .unwrap()
            .unwrap();
        assert!(render(&event, "u").is_none());
    }

    #[test]
    fn title_cannot_inject_lines() {
        let mut event = issues_event("opened");
        if let GitHubEvent::Issues(issue) = &mut event {
            issue.issue.title = "oops\r\nQUIT :bye".to_owned();
        }

        let message = render(&event, "u").unwrap();
        assert!(!message.contains(['\r', '\n']));
        assert!(message.contains("oops  QUIT :bye"));
    }
}
