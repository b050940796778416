use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request, State,
};
use tracing::{debug, info, trace, warn};

pub(crate) mod events;
pub use events::*;

mod signing;
use signing::SignedGitHubPayload;

use crate::webhooks::{WebhookError, WebhookRelay};

const X_GITHUB_EVENT: &str = "X-GitHub-Event";

pub struct GitHubSecret(pub String);

/// Value of the `X-GitHub-Event` header, e.g. `pull_request`.
#[derive(Debug)]
pub struct GitHubEventType(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for GitHubEventType {
    type Error = WebhookError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let event_types = request.headers().get(X_GITHUB_EVENT).collect::<Vec<_>>();
        if event_types.len() != 1 {
            warn!("request header needs exactly one event type");
            return Outcome::Error((Status::BadRequest, WebhookError::MissingEventType));
        }

        Outcome::Success(GitHubEventType(event_types[0].to_owned()))
    }
}

// GitHub only ever POSTs, but any method that may carry a body is handled the same way.

#[rocket::post("/", data = "<payload>")]
pub(crate) async fn github_webhook(
    event: GitHubEventType,
    payload: SignedGitHubPayload,
    relay: &State<WebhookRelay>,
) -> Result<&'static str, Status> {
    handle_github_webhook(event, payload, relay).await
}

#[rocket::put("/", data = "<payload>")]
pub(crate) async fn github_webhook_put(
    event: GitHubEventType,
    payload: SignedGitHubPayload,
    relay: &State<WebhookRelay>,
) -> Result<&'static str, Status> {
    handle_github_webhook(event, payload, relay).await
}

#[rocket::patch("/", data = "<payload>")]
pub(crate) async fn github_webhook_patch(
    event: GitHubEventType,
    payload: SignedGitHubPayload,
    relay: &State<WebhookRelay>,
) -> Result<&'static str, Status> {
    handle_github_webhook(event, payload, relay).await
}

#[rocket::delete("/", data = "<payload>")]
pub(crate) async fn github_webhook_delete(
    event: GitHubEventType,
    payload: SignedGitHubPayload,
    relay: &State<WebhookRelay>,
) -> Result<&'static str, Status> {
    handle_github_webhook(event, payload, relay).await
}

async fn handle_github_webhook(
    GitHubEventType(event_type): GitHubEventType,
    SignedGitHubPayload(payload): SignedGitHubPayload,
    relay: &WebhookRelay,
) -> Result<&'static str, Status> {
    debug!("received `{}` event", event_type);
    trace!("payload: {}", String::from_utf8_lossy(&payload));

    let event = match GitHubEvent::from_payload(&event_type, &payload) {
        Ok(Some(event)) => event,
        Ok(None) => {
            debug!("ignoring unsupported event type `{}`", event_type);
            return Ok("OK");
        }
        Err(e) => {
            let err = WebhookError::Decode(e);
            warn!("couldn't decode `{}` event: {}", event_type, err);
            return Err(Status::BadRequest);
        }
    };

    if let GitHubEvent::Ping(ping) = &event {
        info!(
            "webhook {} is set up: {}",
            ping.hook_id.unwrap_or_default(),
            ping.zen
        );
    }

    relay.relay(&event).await.map_err(|e| {
        warn!("couldn't queue notification: {}", e);
        Status::ServiceUnavailable
    })?;

    Ok("OK")
}
