use anyhow::Context;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{Instrument, info_span};

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("error fetching {url}")]
    HttpRequestError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with {status}")]
    BadStatus { url: String, status: StatusCode },

    #[error("error parsing the response of {url} \n{body}")]
    ParsingError {
        url: String,
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("invalid url {0}")]
    InvalidUrl(String),
}

/// Thin wrapper over a shared [`Client`] that GETs JSON documents
#[derive(Clone, Debug)]
pub struct JsonClient {
    client: Client,
}

impl JsonClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Couldn't build the http client")?;

        Ok(JsonClient { client })
    }

    #[tracing::instrument(err, skip(self, url), fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .instrument(info_span!("Sending request"))
            .await
            .map_err(|source| FetchError::HttpRequestError {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus {
                url: url.to_string(),
                status,
            });
        }

        let body = response
            .text()
            .instrument(info_span!("Reading body of response"))
            .await
            .map_err(|source| FetchError::HttpRequestError {
                url: url.to_string(),
                source,
            })?;

        serde_json::from_str(&body).map_err(|source| FetchError::ParsingError {
            url: url.to_string(),
            source,
            body,
        })
    }
}

/// Parses a configured url, naming it in the error
pub fn parse_url(url: &str) -> Result<Url, FetchError> {
    Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))
}
