use std::time::Duration;

use reqwest::{header::LOCATION, redirect, StatusCode};
use thiserror::Error;
use tracing::{trace, warn};
use url::Url;

const TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ShortenError {
    #[error("request to link shortener failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("link shortener answered with status {0}")]
    UnexpectedStatus(StatusCode),
    #[error("link shortener didn't send a Location header")]
    MissingLocation,
    #[error("link shortener sent an invalid Location: {0}")]
    InvalidLocation(String),
}

/// Client for a git.io-like service: the long URL is POSTed as the `url` form field, and the
/// short one comes back in the `Location` header of a `201 Created` response.
#[derive(Debug, Clone)]
pub struct LinkShortener {
    client: reqwest::Client,
    endpoint: Url,
}

impl LinkShortener {
    pub fn new(endpoint: Url) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(TIMEOUT)
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub async fn shorten(&self, url: &Url) -> Result<Url, ShortenError> {
        trace!("shortening {}", url);

        let response = self
            .client
            .post(self.endpoint.clone())
            .form(&[("url", url.as_str())])
            .send()
            .await?;

        if response.status() != StatusCode::CREATED {
            return Err(ShortenError::UnexpectedStatus(response.status()));
        }

        let location = response
            .headers()
            .get(LOCATION)
            .ok_or(ShortenError::MissingLocation)?;
        let location = location
            .to_str()
            .map_err(|_| ShortenError::InvalidLocation(format!("{:?}", location)))?;

        Url::parse(location).map_err(|_| ShortenError::InvalidLocation(location.to_owned()))
    }

    /// Shortens `url`, falling back to the original link if anything goes wrong.
    pub async fn shorten_or_original(&self, url: &Url) -> String {
        match self.shorten(url).await {
            Ok(short) => short.into(),
            Err(e) => {
                warn!("couldn't shorten {}: {}", url, e);
                url.to_string()
            }
        }
    }
}
