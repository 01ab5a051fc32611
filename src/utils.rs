//! Utility functions for text shortening, slugs and output directories.
//!
//! - Display and log truncation that never splits a UTF-8 character
//! - Slugification for report file names
//! - File system validation for output directories

use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Marker appended to text cut by [`truncate_for_display`].
pub const ELLIPSIS: &str = "...";

/// Shorten text for the reader.
///
/// Text longer than `max` characters is cut to its first `max` characters and
/// followed by [`ELLIPSIS`]. Shorter text is returned unchanged.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_display("short", 10), "short");
/// assert_eq!(truncate_for_display("abcdef", 3), "abc...");
/// ```
pub fn truncate_for_display(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}{}", &s[..cut], ELLIPSIS),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Returns
///
/// The original string if shorter than `max`, otherwise a truncated version
/// with `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Convert a title or query to a URL-friendly slug.
///
/// Lowercases the text, removes special characters, and replaces spaces
/// with hyphens.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify_title("Hello World"), "hello-world");
/// assert_eq!(slugify_title("Test-Article!"), "test-article");
/// ```
pub fn slugify_title(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .replace(|c: char| !c.is_alphanumeric() && c != ' ' && c != '-', "")
        .replace(' ', "-")
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a marker file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Sync write through std fs keeps the error surface simple
    let marker_path = format!("{}/..__write_check__", path.trim_end_matches('/'));
    stdfs::File::create(&marker_path)?;
    let _ = stdfs::remove_file(&marker_path);
    info!("Output directory is writable");
    Ok(())
}
