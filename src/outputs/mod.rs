//! Output generation for the rendered report.
//!
//! # Submodules
//!
//! - [`markdown`]: Renders a [`Report`](crate::models::Report) as a Markdown
//!   page (printed to stdout, optionally saved)
//! - [`json`]: Writes the full report, untruncated, for other tools
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2024-07-15/
//!     └── oncology-diagnostics-india.json
//!
//! markdown_output_dir/
//! └── 2024-07-15_oncology-diagnostics-india.md
//! ```

pub mod json;
pub mod markdown;

use crate::models::Report;
use crate::utils::slugify_title;

/// File stem shared by both outputs: the slugified query.
pub fn report_stem(report: &Report) -> String {
    let slug = slugify_title(&report.query);
    if slug.is_empty() {
        "news".to_string()
    } else {
        slug
    }
}
