//! # News Insight
//!
//! Searches a news provider for a topic (optionally narrowed to a region and
//! a date window), then fetches the full text of every result through a
//! headless rendering service and prints the lot as a Markdown page.
//!
//! ## Usage
//!
//! ```sh
//! export SERPAPI_API_KEY=... RENDER_ENDPOINT=https://.../scrape RENDER_TOKEN=...
//! news_insight -t "Oncology Diagnostics" -r India
//! ```
//!
//! ## Architecture
//!
//! 1. **Configuration**: CLI, environment and YAML merged and validated once
//! 2. **Search**: one provider call returns up to 10-20 article summaries
//! 3. **Enrichment**: full text fetched per article, a few at a time;
//!    failures are recorded per article and never stop the batch
//! 4. **Output**: Markdown to stdout, plus optional JSON and Markdown files

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod enrich;
mod error;
mod models;
mod outputs;
mod pipeline;
mod search;
mod utils;

use cli::Cli;
use config::Config;
use enrich::RenderClient;
use outputs::{json, markdown};
use search::SearchClient;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_insight starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.json_output_dir, ?args.markdown_output_dir, "Parsed CLI arguments");

    // --- Configuration: fail before any request is sent ---
    let config = match args.load_config_layer().and_then(Config::from_layer) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    let request = match args.search_request(Local::now().date_naive()) {
        Ok(request) => request,
        Err(e) => {
            error!(error = %e, "Invalid search parameters");
            return Err(e.into());
        }
    };

    for dir in [&args.json_output_dir, &args.markdown_output_dir]
        .into_iter()
        .flatten()
    {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir,
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    info!(
        query = %request.composed_query(),
        region = %request.region_label(),
        window = ?request.date_range,
        date_filter = config.search.apply_date_filter,
        "Searching news"
    );

    let clients = SearchClient::new(config.search.clone())
        .and_then(|search| Ok((search, RenderClient::new(config.render.clone())?)));
    let (search, fetcher) = match clients {
        Ok(clients) => clients,
        Err(e) => {
            error!(error = %e, "Could not build HTTP clients");
            return Err(e.into());
        }
    };

    let report = match pipeline::run(&search, &fetcher, &request, config.concurrency).await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "News search failed; no results to show");
            eprintln!("Warning: news search failed: {e}");
            return Err(e.into());
        }
    };

    // ---- Output ----
    print!("{}", markdown::report_to_markdown(&report));

    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = json::write_report(&report, dir).await {
            error!(error = %e, "Failed to write JSON report");
        }
    }
    if let Some(dir) = &args.markdown_output_dir {
        if let Err(e) = markdown::write_markdown(&report, dir).await {
            error!(error = %e, "Failed to write Markdown report");
        }
    }

    if report.articles.is_empty() {
        warn!(query = %report.query, "Search returned no articles");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        articles = report.articles.len(),
        without_full_text = report.failed_count(),
        "Execution complete"
    );

    Ok(())
}
