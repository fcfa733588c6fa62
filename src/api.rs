// Movie lookup client: a small blocking HTTP client that asks the OMDb API
// for the year, rating and poster of a title. The menu only sees the
// `MovieLookup` trait, so tests and other front ends can plug in their own.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::catalog::Record;

/// Errors that can occur while looking a movie up.
#[derive(Debug, Error)]
pub enum LookupError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service has no movie with that title.
    #[error("movie not found: {0}")]
    NotFound(String),

    /// The service answered with an unexpected status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Missing or rejected API key.
    #[error("lookup not configured: {0}")]
    NotConfigured(String),
}

/// Anything that can turn a title into a `Record`.
pub trait MovieLookup {
    fn lookup(&self, title: &str) -> Result<Record, LookupError>;
}

/// OMDb client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OmdbConfig {
    /// OMDb API key; lookups fail with `NotConfigured` while it is empty.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OmdbConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://www.omdbapi.com/".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// Shape of the OMDb "by title" response. Only the fields we keep are read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OmdbResponse {
    response: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    year: String,
    #[serde(rename = "imdbRating", default)]
    imdb_rating: String,
    #[serde(default)]
    poster: String,
}

impl OmdbResponse {
    fn into_record(self, title: &str) -> Result<Record, LookupError> {
        if !self.response.eq_ignore_ascii_case("true") {
            let reason = self.error.unwrap_or_else(|| title.to_string());
            return Err(LookupError::NotFound(reason));
        }
        Ok(Record::new(self.year, self.imdb_rating, self.poster))
    }
}

/// Blocking OMDb API client.
#[derive(Clone)]
pub struct OmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OmdbClient {
    /// Build a client. An empty API key is accepted here so the rest of the
    /// menu still works; each lookup then reports `NotConfigured`.
    pub fn new(config: &OmdbConfig) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

impl MovieLookup for OmdbClient {
    fn lookup(&self, title: &str) -> Result<Record, LookupError> {
        if self.api_key.is_empty() {
            return Err(LookupError::NotConfigured(
                "OMDb API key is required (set omdb.api_key or MOVIES_OMDB__API_KEY)".to_string(),
            ));
        }

        debug!("OMDb lookup: title='{}'", title);

        let res = self
            .client
            .get(&self.base_url)
            .query(&[("apikey", self.api_key.as_str()), ("t", title)])
            .send()?;

        let status = res.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(LookupError::NotConfigured(
                "OMDb rejected the API key".to_string(),
            ));
        }
        if !status.is_success() {
            let message = res.text().unwrap_or_default();
            return Err(LookupError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: OmdbResponse = res.json()?;
        body.into_record(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn successful_response_maps_to_record() {
        let raw = r#"{
            "Title": "Inception",
            "Year": "2010",
            "imdbRating": "8.8",
            "Poster": "https://example.test/inception.jpg",
            "Response": "True"
        }"#;
        let body: OmdbResponse = serde_json::from_str(raw).unwrap();
        let record = body.into_record("inception").unwrap();
        assert_eq!(
            record,
            Record::new("2010", "8.8", "https://example.test/inception.jpg")
        );
    }

    #[test]
    fn false_response_is_not_found() {
        let raw = r#"{"Response": "False", "Error": "Movie not found!"}"#;
        let body: OmdbResponse = serde_json::from_str(raw).unwrap();
        let err = body.into_record("zzzz").unwrap_err();
        assert!(matches!(err, LookupError::NotFound(msg) if msg == "Movie not found!"));
    }

    #[test]
    fn lookup_without_api_key_fails_before_any_request() {
        let client = OmdbClient::new(&OmdbConfig::default()).unwrap();
        let err = client.lookup("Heat").unwrap_err();
        assert!(matches!(err, LookupError::NotConfigured(_)));
    }
}
