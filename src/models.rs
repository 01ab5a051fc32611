//! Data models for search requests, article records and the rendered report.
//!
//! - [`SearchRequest`]: normalized user input (topic, region, date range)
//! - [`ArticleSummary`]: one news search result before enrichment
//! - [`EnrichedArticle`]: a summary plus its full-text outcome
//! - [`Report`]: everything produced by one run, in provider order
//!
//! Nothing here outlives a single run; a repeated query rebuilds all of it.

use crate::error::{FetchFailureReason, RequestError};
use crate::utils::truncate_for_display;
use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;

/// Placeholder shown when the provider leaves a display field empty.
pub const NOT_AVAILABLE: &str = "N/A";

/// Number of body characters shown before the ellipsis marker.
pub const BODY_DISPLAY_LIMIT: usize = 1000;

/// Inclusive calendar window for the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RequestError> {
        if start > end {
            return Err(RequestError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }
}

/// Normalized search input.
///
/// Topic and region are trimmed on construction; a blank region becomes `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub topic: String,
    pub region: Option<String>,
    pub date_range: Option<DateRange>,
}

impl SearchRequest {
    pub fn new(
        topic: &str,
        region: Option<&str>,
        date_range: Option<DateRange>,
    ) -> Result<Self, RequestError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(RequestError::EmptyTopic);
        }
        let region = region
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        Ok(Self {
            topic: topic.to_string(),
            region,
            date_range,
        })
    }

    /// Query string sent to the provider.
    ///
    /// The region is appended only when the topic does not already mention it
    /// (case-insensitively), so "Oncology India" + "india" stays as-is.
    pub fn composed_query(&self) -> String {
        compose_query(&self.topic, self.region.as_deref().unwrap_or(""))
    }

    /// Region shown in headers; "Global" when none was given.
    pub fn region_label(&self) -> &str {
        self.region.as_deref().unwrap_or("Global")
    }
}

/// Join topic and region into a single query without repeating the region.
pub fn compose_query(topic: &str, region: &str) -> String {
    let topic = topic.trim();
    let region = region.trim();
    if region.is_empty() || topic.to_lowercase().contains(&region.to_lowercase()) {
        topic.to_string()
    } else {
        format!("{topic} {region}")
    }
}

/// One news search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleSummary {
    pub title: String,
    /// Absolute article URL; the key used for enrichment.
    pub link: String,
    /// Provider recency text such as "3 hours ago"; never parsed.
    pub published_label: String,
    pub source_name: String,
    pub snippet: Option<String>,
}

/// A search result together with the outcome of fetching its full text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedArticle {
    #[serde(flatten)]
    pub summary: ArticleSummary,
    pub body: Result<String, FetchFailureReason>,
}

impl EnrichedArticle {
    /// Body as shown to the reader: truncated text, or the failure message.
    pub fn display_body(&self) -> String {
        match &self.body {
            Ok(text) => truncate_for_display(text, BODY_DISPLAY_LIMIT),
            Err(reason) => reason.to_string(),
        }
    }
}

/// The page produced by one run.
#[derive(Debug, Serialize)]
pub struct Report {
    pub query: String,
    pub region: String,
    pub date_range: Option<DateRange>,
    pub generated_at: DateTime<Local>,
    pub articles: Vec<EnrichedArticle>,
}

impl Report {
    pub fn new(request: &SearchRequest, articles: Vec<EnrichedArticle>) -> Self {
        Self {
            query: request.composed_query(),
            region: request.region_label().to_string(),
            date_range: request.date_range,
            generated_at: Local::now(),
            articles,
        }
    }

    pub fn failed_count(&self) -> usize {
        self.articles.iter().filter(|a| a.body.is_err()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn summary(link: &str) -> ArticleSummary {
        ArticleSummary {
            title: "Test".to_string(),
            link: link.to_string(),
            published_label: "1 day ago".to_string(),
            source_name: "Example News".to_string(),
            snippet: None,
        }
    }

    #[test]
    fn test_region_already_in_topic_is_not_repeated() {
        assert_eq!(compose_query("India India", "India"), "India India");
        assert_eq!(
            compose_query("Oncology Diagnostics India", "india"),
            "Oncology Diagnostics India"
        );
    }

    #[test]
    fn test_region_appended_when_missing() {
        assert_eq!(
            compose_query("  Oncology Diagnostics ", " India "),
            "Oncology Diagnostics India"
        );
    }

    #[test]
    fn test_blank_region_uses_topic_alone() {
        assert_eq!(compose_query("Fintech", "   "), "Fintech");
    }

    #[test]
    fn test_search_request_rejects_blank_topic() {
        assert_eq!(
            SearchRequest::new("   ", Some("US"), None),
            Err(RequestError::EmptyTopic)
        );
    }

    #[test]
    fn test_search_request_normalizes_region() {
        let req = SearchRequest::new(" Solar ", Some("  "), None).unwrap();
        assert_eq!(req.topic, "Solar");
        assert_eq!(req.region, None);
        assert_eq!(req.region_label(), "Global");
    }

    #[test]
    fn test_date_range_rejects_inverted_bounds() {
        let start = NaiveDate::from_ymd_opt(2024, 7, 15).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        assert!(matches!(
            DateRange::new(start, end),
            Err(RequestError::InvalidDateRange { .. })
        ));
        assert!(DateRange::new(end, start).is_ok());
        assert!(DateRange::new(start, start).is_ok());
    }

    #[test]
    fn test_display_body_truncates_long_text() {
        let article = EnrichedArticle {
            summary: summary("https://example.com/a"),
            body: Ok("x".repeat(1500)),
        };
        let shown = article.display_body();
        assert_eq!(shown, format!("{}...", "x".repeat(1000)));
    }

    #[test]
    fn test_display_body_renders_failure_message() {
        let article = EnrichedArticle {
            summary: summary("https://example.com/a"),
            body: Err(FetchFailureReason::Timeout),
        };
        assert_eq!(article.display_body(), FetchFailureReason::Timeout.to_string());
    }

    #[test]
    fn test_enriched_article_serializes_flat_summary() {
        let article = EnrichedArticle {
            summary: summary("https://example.com/a"),
            body: Err(FetchFailureReason::NoContentFound),
        };
        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["link"], "https://example.com/a");
        assert_eq!(json["body"]["Err"]["kind"], "no_content_found");
    }

    proptest! {
        #[test]
        fn prop_contained_region_is_dropped(
            prefix in "[a-zA-Z ]{0,12}",
            region in "[a-zA-Z]{1,10}",
            suffix in "[a-zA-Z ]{0,12}",
            upper in any::<bool>(),
        ) {
            let topic = format!("{prefix}{region}{suffix}");
            let region_arg = if upper { region.to_uppercase() } else { region.to_lowercase() };
            prop_assert_eq!(compose_query(&topic, &region_arg), topic.trim().to_string());
        }

        #[test]
        fn prop_disjoint_region_is_appended(
            topic in "[a-m]{1,12}",
            region in "[n-z]{1,10}",
            pad in " {0,3}",
        ) {
            let padded_topic = format!("{pad}{topic}{pad}");
            let padded_region = format!("{pad}{region}{pad}");
            prop_assert_eq!(
                compose_query(&padded_topic, &padded_region),
                format!("{topic} {region}")
            );
        }
    }
}
