//! Markdown rendering of a [`Report`].
//!
//! Every article keeps its headline, link, source and recency line whatever
//! happened during enrichment. Bodies go through
//! [`EnrichedArticle::display_body`](crate::models::EnrichedArticle::display_body),
//! so long text is cut and failures show their message in its place.

use super::report_stem;
use crate::models::{EnrichedArticle, Report};
use std::error::Error;
use std::fmt::Write;
use tokio::fs;
use tracing::{info, instrument};

/// Render the whole report as one Markdown page.
pub fn report_to_markdown(report: &Report) -> String {
    let mut md = String::new();

    writeln!(md, "# News results: {}\n", report.query).unwrap();
    writeln!(md, "- **Region:** {}", report.region).unwrap();
    match &report.date_range {
        Some(range) => writeln!(md, "- **Date range:** {} to {}", range.start, range.end).unwrap(),
        None => writeln!(md, "- **Date range:** any time").unwrap(),
    }
    writeln!(
        md,
        "- **Generated:** {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S")
    )
    .unwrap();
    writeln!(
        md,
        "- **Articles:** {} ({} without full text)\n",
        report.articles.len(),
        report.failed_count()
    )
    .unwrap();

    if report.articles.is_empty() {
        writeln!(md, "_No articles found for this query._").unwrap();
        return md;
    }

    for (i, article) in report.articles.iter().enumerate() {
        write_article(&mut md, i + 1, article);
    }
    md
}

fn write_article(md: &mut String, number: usize, article: &EnrichedArticle) {
    let summary = &article.summary;
    writeln!(md, "## {}. [{}]({})\n", number, summary.title, summary.link).unwrap();
    writeln!(
        md,
        "*Source:* {} · *Published:* {}\n",
        summary.source_name, summary.published_label
    )
    .unwrap();
    if let Some(snippet) = &summary.snippet {
        writeln!(md, "> {}\n", snippet).unwrap();
    }

    match &article.body {
        Ok(_) => {
            writeln!(md, "**Full text:**\n").unwrap();
            writeln!(md, "{}\n", article.display_body()).unwrap();
        }
        Err(_) => {
            writeln!(md, "**Full text unavailable:** {}\n", article.display_body()).unwrap();
        }
    }
    writeln!(md, "---\n").unwrap();
}

/// Write the page to `{markdown_output_dir}/{date}_{query-slug}.md`.
#[instrument(level = "info", skip_all, fields(%markdown_output_dir))]
pub async fn write_markdown(
    report: &Report,
    markdown_output_dir: &str,
) -> Result<String, Box<dyn Error>> {
    let path = format!(
        "{}/{}_{}.md",
        markdown_output_dir.trim_end_matches('/'),
        report.generated_at.date_naive(),
        report_stem(report)
    );
    fs::write(&path, report_to_markdown(report)).await?;
    info!(%path, "Wrote Markdown report");
    Ok(path)
}
