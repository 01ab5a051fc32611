//! News search provider client (SerpAPI-compatible).
//!
//! One GET per run. The provider answers with a `news_results` list; each
//! item is normalized into an [`ArticleSummary`] here so nothing downstream
//! sees the provider's loose field shapes.
//!
//! # Zero results
//!
//! An absent or empty `news_results` list, or the provider's "hasn't returned
//! any results" error message, is a normal empty outcome and not a
//! [`ProviderError`].

use crate::config::SearchConfig;
use crate::error::{ConfigError, ProviderError};
use crate::models::{ArticleSummary, DateRange, NOT_AVAILABLE, SearchRequest};
use crate::utils::truncate_for_log;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use url::Url;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Provider message that means "nothing matched" rather than a failure.
const NO_RESULTS_MARKER: &str = "hasn't returned any results";

/// The `source` field arrives either as a bare string or as an object.
/// Any other shape is kept as-is and treated as unknown.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SourceField {
    Name(String),
    Structured { name: Option<String> },
    Other(serde_json::Value),
}

impl SourceField {
    fn into_name(self) -> Option<String> {
        match self {
            SourceField::Name(name) => Some(name),
            SourceField::Structured { name } => name,
            SourceField::Other(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawNewsResult {
    title: Option<String>,
    link: Option<String>,
    date: Option<String>,
    source: Option<SourceField>,
    snippet: Option<String>,
}

/// Items stay undecoded until [`parse_search_response`] so one bad item
/// cannot sink the whole page.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news_results: Option<Vec<serde_json::Value>>,
    error: Option<String>,
}

/// Client for the news search provider.
#[derive(Debug, Clone)]
pub struct SearchClient {
    http: reqwest::Client,
    config: SearchConfig,
}

impl SearchClient {
    pub fn new(config: SearchConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder().timeout(SEARCH_TIMEOUT).build()?;
        Ok(Self { http, config })
    }

    /// Run the search and return at most `max_results` summaries in provider order.
    #[instrument(level = "info", skip_all, fields(query = %request.composed_query()))]
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<ArticleSummary>, ProviderError> {
        let t0 = Instant::now();
        let params = self.query_params(request);
        debug!(
            params = ?params.iter().filter(|(k, _)| *k != "api_key").collect::<Vec<_>>(),
            "Issuing news search"
        );

        let resp = self
            .http
            .get(self.config.endpoint.clone())
            .query(&params)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), body = %truncate_for_log(&body, 300), "News search failed");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: truncate_for_log(&body, 500),
            });
        }

        let articles = parse_search_response(&body, self.config.max_results)?;
        info!(
            count = articles.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "News search completed"
        );
        Ok(articles)
    }

    fn query_params(&self, request: &SearchRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("engine", self.config.engine.clone()),
            ("q", request.composed_query()),
            ("api_key", self.config.api_key.clone()),
            ("hl", self.config.language.clone()),
            ("gl", self.config.country.clone()),
            ("num", self.config.max_results.to_string()),
        ];
        if self.config.engine == "google" {
            params.push(("tbm", "nws".to_string()));
        }
        if self.config.apply_date_filter {
            if let Some(range) = &request.date_range {
                params.push(("tbs", date_filter(range)));
            }
        }
        params
    }
}

/// Provider custom-date-range filter: `cdr:1,cd_min:MM/DD/YYYY,cd_max:MM/DD/YYYY`.
pub fn date_filter(range: &DateRange) -> String {
    format!(
        "cdr:1,cd_min:{},cd_max:{}",
        range.start.format("%m/%d/%Y"),
        range.end.format("%m/%d/%Y")
    )
}

/// Decode a provider payload into summaries, dropping unusable items.
pub fn parse_search_response(
    body: &str,
    max_results: usize,
) -> Result<Vec<ArticleSummary>, ProviderError> {
    let response: SearchResponse = serde_json::from_str(body)?;

    if let Some(message) = response.error {
        if message.contains(NO_RESULTS_MARKER) {
            info!(%message, "Provider reported no results");
            return Ok(Vec::new());
        }
        return Err(ProviderError::Api(message));
    }

    let articles = response
        .news_results
        .unwrap_or_default()
        .into_iter()
        .filter_map(decode_item)
        .filter_map(into_summary)
        .take(max_results)
        .collect();
    Ok(articles)
}

fn decode_item(item: serde_json::Value) -> Option<RawNewsResult> {
    match serde_json::from_value(item) {
        Ok(raw) => Some(raw),
        Err(e) => {
            warn!(error = %e, "Dropping search result with unexpected field types");
            None
        }
    }
}

fn into_summary(raw: RawNewsResult) -> Option<ArticleSummary> {
    let title = raw.title.map(|t| t.trim().to_string()).unwrap_or_default();
    let link = raw.link.map(|l| l.trim().to_string()).unwrap_or_default();

    if title.is_empty() {
        warn!(%link, "Dropping search result without a title");
        return None;
    }
    if Url::parse(&link).is_err() {
        warn!(%title, %link, "Dropping search result without an absolute link");
        return None;
    }

    Some(ArticleSummary {
        title,
        link,
        published_label: non_blank_or_na(raw.date),
        source_name: non_blank_or_na(raw.source.and_then(SourceField::into_name)),
        snippet: raw
            .snippet
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    })
}

fn non_blank_or_na(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
