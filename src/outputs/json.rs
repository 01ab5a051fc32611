//! JSON output of the full report.
//!
//! Bodies are written untruncated; the display limit only applies to the
//! Markdown page. Failed enrichments are kept as tagged `Err` objects.
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2024-07-15/
//!     └── oncology-diagnostics-india.json
//! ```

use super::report_stem;
use crate::models::Report;
use std::error::Error;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a [`Report`] to `{json_output_dir}/{date}/{query-slug}.json`.
///
/// The date is the local date the report was generated on. Returns the path
/// written.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_report(report: &Report, json_output_dir: &str) -> Result<String, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(report)?;

    let full_json_dir = format!(
        "{}/{}",
        json_output_dir.trim_end_matches('/'),
        report.generated_at.date_naive()
    );
    info!(%full_json_dir, "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(%full_json_dir, error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let output_json_filename = format!("{}/{}.json", full_json_dir, report_stem(report));
    fs::write(&output_json_filename, json).await?;
    info!(path = %output_json_filename, articles = report.articles.len(), "Wrote JSON report");

    Ok(output_json_filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchFailureReason;
    use crate::models::{ArticleSummary, EnrichedArticle, SearchRequest};

    #[tokio::test]
    async fn test_write_report_layout_and_content() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_str().unwrap().to_string();
        let request = SearchRequest::new("Oncology Diagnostics", Some("India"), None).unwrap();
        let report = Report::new(
            &request,
            vec![EnrichedArticle {
                summary: ArticleSummary {
                    title: "Lab opens".to_string(),
                    link: "https://health.example.in/lab".to_string(),
                    published_label: "1 day ago".to_string(),
                    source_name: "Health Times".to_string(),
                    snippet: Some("A new lab".to_string()),
                },
                body: Err(FetchFailureReason::Timeout),
            }],
        );

        let path = write_report(&report, &dir).await.unwrap();

        let expected = format!(
            "{}/{}/oncology-diagnostics-india.json",
            dir,
            report.generated_at.date_naive()
        );
        assert_eq!(path, expected);

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["query"], "Oncology Diagnostics India");
        assert_eq!(written["region"], "India");
        assert_eq!(written["articles"][0]["title"], "Lab opens");
        assert_eq!(written["articles"][0]["body"]["Err"]["kind"], "timeout");
    }
}
