//! The article enrichment pipeline.
//!
//! 1. **Search**: one provider call yields ordered [`ArticleSummary`] records
//! 2. **Enrich**: each link goes through a [`FullTextFetcher`], at most
//!    `concurrency` at a time
//! 3. **Assemble**: results are collected into a [`Report`] in search order
//!
//! A failed or panicking fetch becomes that article's [`FetchFailureReason`];
//! it never removes the article or stops its siblings. A failed search stops
//! the run with a [`ProviderError`].

use crate::enrich::FullTextFetcher;
use crate::error::{FetchFailureReason, ProviderError};
use crate::models::{ArticleSummary, EnrichedArticle, Report, SearchRequest};
use crate::search::SearchClient;
use futures::FutureExt;
use futures::stream::{self, StreamExt};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{error, info, instrument};

/// Search, then enrich every result.
#[instrument(level = "info", skip_all, fields(query = %request.composed_query(), concurrency = concurrency))]
pub async fn run<F: FullTextFetcher>(
    search: &SearchClient,
    fetcher: &F,
    request: &SearchRequest,
    concurrency: usize,
) -> Result<Report, ProviderError> {
    let summaries = search.search(request).await?;
    if summaries.is_empty() {
        info!("No articles found; skipping enrichment");
        return Ok(Report::new(request, Vec::new()));
    }

    let articles = enrich_articles(fetcher, summaries, concurrency).await;
    let report = Report::new(request, articles);
    info!(
        total = report.articles.len(),
        failed = report.failed_count(),
        "Enrichment pipeline completed"
    );
    Ok(report)
}

/// Fetch the full text of every summary, preserving input order.
///
/// `buffered` keeps up to `concurrency` fetches in flight but yields them in
/// the order they were submitted.
#[instrument(level = "info", skip_all, fields(count = summaries.len(), concurrency = concurrency))]
pub async fn enrich_articles<F: FullTextFetcher>(
    fetcher: &F,
    summaries: Vec<ArticleSummary>,
    concurrency: usize,
) -> Vec<EnrichedArticle> {
    stream::iter(summaries.into_iter().enumerate())
        .map(|(index, summary)| async move {
            let body = AssertUnwindSafe(fetcher.fetch_full_text(&summary.link))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    let message = panic_message(panic.as_ref());
                    error!(index, link = %summary.link, %message, "Full-text fetch panicked");
                    Err(FetchFailureReason::UnexpectedError { message })
                });
            EnrichedArticle { summary, body }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "fetch task panicked".to_string()
    }
}
