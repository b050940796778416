use std::io;

use hmac::{Hmac, Mac};
use rocket::{
    data::{ByteUnit, FromData, Outcome},
    http::Status,
    Data, Request,
};
use sha1::Sha1;
use sha2::Sha256;
use tracing::{trace, warn};

use crate::webhooks::{github::GitHubSecret, WebhookError};

const X_HUB_SIGNATURE: &str = "X-Hub-Signature";
const X_HUB_SIGNATURE_256: &str = "X-Hub-Signature-256";

/// Checks a GitHub signature header (`sha1=<hex>` or `sha256=<hex>`) against the raw payload.
///
/// Anything that doesn't look like a signature we know how to check fails validation.
pub fn validate_signature(secret: &[u8], signature: &str, data: &[u8]) -> bool {
    trace!("validating signature...");

    // GitHub puts the algorithm in front of its hex digest
    let (algorithm, digest) = match signature.split_once('=') {
        Some(parts) => parts,
        None => {
            trace!("couldn't strip prefix from signature `{}`", signature);
            return false;
        }
    };

    let digest = match hex::decode(digest) {
        Ok(bytes) => bytes,
        Err(_) => {
            trace!("couldn't decode hex-encoded signature {}", digest);
            return false;
        }
    };

    match algorithm {
        "sha1" => verify::<Hmac<Sha1>>(secret, data, &digest),
        "sha256" => verify::<Hmac<Sha256>>(secret, data, &digest),
        _ => {
            trace!("unsupported signature algorithm `{}`", algorithm);
            false
        }
    }
}

fn verify<M: Mac + hmac::digest::KeyInit>(secret: &[u8], data: &[u8], digest: &[u8]) -> bool {
    // HMAC accepts keys of any length
    let mut mac = match <M as hmac::digest::KeyInit>::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(data);
    // constant time comparison
    mac.verify_slice(digest).is_ok()
}

/// Raw request body whose signature has been checked against the configured secret.
pub struct SignedGitHubPayload(pub Vec<u8>);

const LIMIT: ByteUnit = ByteUnit::Mebibyte(1);

// Tracking issue for chaining Data guards to avoid reimplementing all this:
// https://github.com/SergioBenitez/Rocket/issues/775
#[rocket::async_trait]
impl<'r> FromData<'r> for SignedGitHubPayload {
    type Error = WebhookError;

    async fn from_data(request: &'r Request<'_>, data: Data<'r>) -> Outcome<'r, Self> {
        trace!("received payload on GitHub webhook endpoint: {:?}", request);

        // prefer the SHA-256 signature when GitHub sends both
        let header = [X_HUB_SIGNATURE_256, X_HUB_SIGNATURE]
            .into_iter()
            .find(|name| request.headers().contains(*name));
        let signature = match header {
            Some(name) => {
                let signatures = request.headers().get(name).collect::<Vec<_>>();
                if signatures.len() != 1 {
                    warn!("request needs exactly one {} header", name);
                    return Outcome::Error((Status::BadRequest, WebhookError::MissingSignature));
                }
                signatures[0]
            }
            None => {
                warn!(
                    "request needs a {} or {} header",
                    X_HUB_SIGNATURE_256, X_HUB_SIGNATURE
                );
                return Outcome::Error((Status::BadRequest, WebhookError::MissingSignature));
            }
        };

        let size_limit = request.limits().get("json").unwrap_or(LIMIT);
        let content = match data.open(size_limit).into_bytes().await {
            Ok(bytes) if bytes.is_complete() => bytes.into_inner(),
            Ok(_) => {
                trace!("payload was too big");
                return Outcome::Error((Status::PayloadTooLarge, WebhookError::PayloadTooLarge));
            }
            Err(e) => return Outcome::Error((Status::BadRequest, WebhookError::Io(e))),
        };

        let secret = match request.rocket().state::<GitHubSecret>() {
            Some(secret) => secret,
            None => {
                let err = io::Error::new(io::ErrorKind::Other, "GitHub secret isn't managed");
                return Outcome::Error((Status::InternalServerError, WebhookError::Io(err)));
            }
        };

        if !validate_signature(secret.0.as_bytes(), signature, &content) {
            warn!("signature validation failed, dropping request");
            return Outcome::Error((Status::BadRequest, WebhookError::BadSignature));
        }

        trace!("validated GitHub payload");
        Outcome::Success(SignedGitHubPayload(content))
    }
}
