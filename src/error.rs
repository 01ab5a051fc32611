//! Error taxonomy for the search and enrichment pipeline.
//!
//! Each failure class lives in its own enum so callers can tell them apart:
//!
//! - [`ConfigError`]: fatal at startup, nothing has been sent yet
//! - [`RequestError`]: the user's search parameters are unusable
//! - [`ProviderError`]: the news search call failed; no partial results
//! - [`FetchFailureReason`]: one article's full-text enrichment failed; it is
//!   rendered inline and never aborts its siblings

use serde::Serialize;
use thiserror::Error;

/// Startup configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration `{key}` (set it with --{flag} or ${env})")]
    Missing {
        key: &'static str,
        flag: &'static str,
        env: &'static str,
    },

    #[error("invalid configuration `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("could not build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Unusable search parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("a topic is required to search for news")]
    EmptyTopic,

    #[error("start date {start} is after end date {end}")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
}

/// The news search call failed as a whole.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("news search request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("news search returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("news search response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("news search provider reported an error: {0}")]
    Api(String),
}

/// The request URL carries the API key as a query parameter, so it never
/// reaches the error text.
impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Transport(e.without_url())
    }
}

/// Why one article's full text could not be retrieved.
///
/// The `Display` text is what gets rendered in place of the article body.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchFailureReason {
    #[error("Timed out waiting for the rendering service to load the page.")]
    Timeout,

    #[error("Rendering service returned HTTP {status}: {body_excerpt}")]
    HttpError { status: u16, body_excerpt: String },

    #[error("Rendering service returned an empty response.")]
    EmptyResponse,

    #[error(
        "Could not parse the rendering service response. The site likely blocked scraping or returned non-HTML content."
    )]
    MalformedResponse,

    #[error("No readable text content was found on the page.")]
    NoContentFound,

    #[error("Unexpected error while fetching full text: {message}")]
    UnexpectedError { message: String },
}
