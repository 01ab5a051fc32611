//! Full-text enrichment through a headless rendering service.
//!
//! Each article link is sent to the rendering service, which loads the page in
//! a browser, waits for it to settle, and returns the text of the selected
//! element. Every outcome is classified into a [`FetchFailureReason`] so the
//! caller can render it inline; nothing here is retried.
//!
//! # Architecture
//!
//! - [`FullTextFetcher`]: the seam the pipeline depends on
//! - [`RenderClient`]: the HTTP implementation (Browserless-style `/scrape`)
//! - [`classify_response`]: pure status/body classification, shared by the
//!   client and its tests

use crate::config::RenderConfig;
use crate::error::{ConfigError, FetchFailureReason};
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Characters of an error body kept for diagnosis.
const BODY_EXCERPT_CHARS: usize = 500;

static EXCESS_BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("static regex"));

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Retrieves the readable text of an article given only its link.
pub trait FullTextFetcher {
    /// Fetch and normalize the body text of `url`.
    ///
    /// Implementations must report every failure through the returned reason
    /// and never abort the caller.
    async fn fetch_full_text(&self, url: &str) -> Result<String, FetchFailureReason>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderRequest<'a> {
    url: &'a str,
    elements: [ElementSelector<'a>; 1],
    goto_options: GotoOptions<'a>,
}

#[derive(Debug, Serialize)]
struct ElementSelector<'a> {
    selector: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GotoOptions<'a> {
    wait_until: &'a str,
}

#[derive(Debug, Deserialize)]
struct RenderResponse {
    data: RenderData,
}

/// `data` is either plain text or one entry per requested selector.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RenderData {
    Text(String),
    Elements(Vec<ElementResult>),
}

#[derive(Debug, Deserialize)]
struct ElementResult {
    #[serde(default)]
    results: Vec<ElementContent>,
}

#[derive(Debug, Deserialize)]
struct ElementContent {
    text: Option<String>,
    html: Option<String>,
}

impl ElementContent {
    fn into_text(self) -> String {
        match (self.text, self.html) {
            (Some(text), _) if !text.trim().is_empty() => text,
            (_, Some(html)) => html_to_text(&html),
            (text, None) => text.unwrap_or_default(),
        }
    }
}

impl RenderData {
    fn into_text(self) -> String {
        match self {
            RenderData::Text(text) => text,
            RenderData::Elements(elements) => elements
                .into_iter()
                .flat_map(|e| e.results)
                .map(ElementContent::into_text)
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let raw: String = fragment.root_element().text().collect();
    WHITESPACE_RUN.replace_all(raw.trim(), " ").into_owned()
}

fn normalize_text(text: &str) -> String {
    EXCESS_BLANK_LINES
        .replace_all(text.trim(), "\n\n")
        .into_owned()
}

/// Classify a completed rendering-service response.
///
/// Applied in order: error status, empty body, undecodable body, empty text.
pub fn classify_response(status: u16, body: &str) -> Result<String, FetchFailureReason> {
    if !(200..300).contains(&status) {
        return Err(FetchFailureReason::HttpError {
            status,
            body_excerpt: truncate_for_log(body, BODY_EXCERPT_CHARS),
        });
    }
    if body.trim().is_empty() {
        return Err(FetchFailureReason::EmptyResponse);
    }
    let parsed: RenderResponse =
        serde_json::from_str(body).map_err(|_| FetchFailureReason::MalformedResponse)?;

    let text = normalize_text(&parsed.data.into_text());
    if text.is_empty() {
        return Err(FetchFailureReason::NoContentFound);
    }
    Ok(text)
}

/// The request URL carries the service token, so it is stripped first.
fn transport_failure(e: reqwest::Error) -> FetchFailureReason {
    if e.is_timeout() {
        FetchFailureReason::Timeout
    } else {
        FetchFailureReason::UnexpectedError {
            message: e.without_url().to_string(),
        }
    }
}

/// HTTP client for the rendering service.
#[derive(Debug, Clone)]
pub struct RenderClient {
    http: reqwest::Client,
    config: RenderConfig,
}

impl RenderClient {
    pub fn new(config: RenderConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }
}

impl FullTextFetcher for RenderClient {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch_full_text(&self, url: &str) -> Result<String, FetchFailureReason> {
        let t0 = Instant::now();
        let request = RenderRequest {
            url,
            elements: [ElementSelector {
                selector: &self.config.selector,
            }],
            goto_options: GotoOptions {
                wait_until: &self.config.wait_until,
            },
        };

        let resp = self
            .http
            .post(self.config.request_url())
            .json(&request)
            .send()
            .await
            .map_err(transport_failure)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(transport_failure)?;
        debug!(status, bytes = body.len(), "Rendering service responded");

        let outcome = classify_response(status, &body);
        let elapsed_ms = t0.elapsed().as_millis() as u64;
        match &outcome {
            Ok(text) => info!(chars = text.chars().count(), elapsed_ms, "Extracted full text"),
            Err(reason) => warn!(
                elapsed_ms,
                %reason,
                body_preview = %truncate_for_log(&body, 200),
                "Full-text extraction failed"
            ),
        }
        outcome
    }
}
