//! Command-line interface definitions for News Insight.
//!
//! The flags mirror the original search form: topic, optional region and a
//! date window. Credentials can be passed as flags or environment variables,
//! and any setting can also come from a YAML file given with `--config`.

use crate::config::ConfigLayer;
use crate::error::{ConfigError, RequestError};
use crate::models::{DateRange, SearchRequest};
use chrono::{Days, NaiveDate};
use clap::Parser;

/// Length of the window used when no start date is given.
pub const DEFAULT_WINDOW_DAYS: u64 = 14;

/// Command-line arguments for the News Insight application.
///
/// # Examples
///
/// ```sh
/// # Last two weeks of news about a topic in a region
/// news_insight -t "Oncology Diagnostics" -r India
///
/// # Explicit window, saving JSON and Markdown reports
/// news_insight -t "Green Hydrogen" --start-date 2024-07-01 --end-date 2024-07-15 \
///     -j ./json -m ./markdown
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Topic, company or industry to search for
    #[arg(short, long)]
    pub topic: String,

    /// Geography to narrow the search, e.g. India, US, Southeast Asia
    #[arg(short, long)]
    pub region: Option<String>,

    /// First day of the search window (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Last day of the search window (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Do not send the date window to the search provider
    #[arg(long)]
    pub no_date_filter: bool,

    /// Maximum number of full-text fetches in flight (1-8)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Number of search results to request (10-20)
    #[arg(long)]
    pub max_results: Option<usize>,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output directory for the JSON report
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// Output directory for the Markdown report
    #[arg(short, long)]
    pub markdown_output_dir: Option<String>,

    /// SerpAPI key for the news search
    #[arg(long, env = "SERPAPI_API_KEY", hide_env_values = true)]
    pub serpapi_api_key: Option<String>,

    /// Rendering service endpoint, e.g. https://production-sfo.browserless.io/scrape
    #[arg(long, env = "RENDER_ENDPOINT")]
    pub render_endpoint: Option<String>,

    /// Rendering service token (may instead be embedded in the endpoint URL)
    #[arg(long, env = "RENDER_TOKEN", hide_env_values = true)]
    pub render_token: Option<String>,
}

impl Cli {
    /// Settings given on the command line or through the environment.
    pub fn config_layer(&self) -> ConfigLayer {
        ConfigLayer {
            serpapi_api_key: self.serpapi_api_key.clone(),
            render_endpoint: self.render_endpoint.clone(),
            render_token: self.render_token.clone(),
            max_results: self.max_results,
            concurrency: self.concurrency,
            apply_date_filter: self.no_date_filter.then_some(false),
            ..Default::default()
        }
    }

    /// File layer (if any) with the command-line layer on top.
    pub fn load_config_layer(&self) -> Result<ConfigLayer, ConfigError> {
        let base = match &self.config {
            Some(path) => ConfigLayer::from_file(path)?,
            None => ConfigLayer::default(),
        };
        Ok(base.merge(self.config_layer()))
    }

    /// Resolve the search window against `today`.
    ///
    /// A missing end date means today; a missing start date means
    /// [`DEFAULT_WINDOW_DAYS`] before the end date.
    pub fn date_range(&self, today: NaiveDate) -> Result<DateRange, RequestError> {
        let end = self.end_date.unwrap_or(today);
        let start = self.start_date.unwrap_or_else(|| {
            end.checked_sub_days(Days::new(DEFAULT_WINDOW_DAYS))
                .unwrap_or(NaiveDate::MIN)
        });
        DateRange::new(start, end)
    }

    /// Validated search parameters for this invocation.
    pub fn search_request(&self, today: NaiveDate) -> Result<SearchRequest, RequestError> {
        let date_range = self.date_range(today)?;
        SearchRequest::new(&self.topic, self.region.as_deref(), Some(date_range))
    }
}
