//! Centralized filename parsing for the `YYYY-MM-DD-name` post convention.
//!
//! Post sources are conventionally named with an ISO date prefix followed by
//! a slug (`2019-05-04-deploy-ml-api.md`). Pages and other sources carry no
//! date. This module extracts both parts consistently, and provides the
//! slug normalisation used for collection URLs.
//!
//! ## Display Titles
//!
//! Dashes in the name portion are converted to spaces for display:
//! - `2019-05-04-deploy-ml-api` → "deploy ml api"
//! - `about-me` → "about me"

use chrono::NaiveDate;

/// Result of parsing a source file stem like `2019-05-04-deploy-ml-api`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Date prefix if present and valid.
    pub date: Option<NaiveDate>,
    /// Name part after the date prefix, dashes preserved.
    /// For undated entries, this is the full input.
    pub slug: String,
    /// Display title: slug with dashes converted to spaces.
    pub display_title: String,
}

/// Parse a file stem following the `YYYY-MM-DD-name` convention.
///
/// - `"2019-05-04-deploy-ml-api"` → date=2019-05-04, slug="deploy-ml-api"
/// - `"2019-05-04"` → date=2019-05-04, slug=""
/// - `"2019-13-45-broken"` → date=None, slug="2019-13-45-broken" (not a real date)
/// - `"about-me"` → date=None, slug="about-me"
pub fn parse_entry_name(stem: &str) -> ParsedName {
    if let Some(prefix) = stem.get(..10)
        && let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
    {
        let rest = &stem[10..];
        if rest.is_empty() || rest.starts_with('-') {
            let slug = rest.trim_start_matches('-');
            return ParsedName {
                date: Some(date),
                slug: slug.to_string(),
                display_title: slug.replace('-', " "),
            };
        }
    }
    ParsedName {
        date: None,
        slug: stem.to_string(),
        display_title: stem.replace('-', " "),
    }
}

/// Normalise a free-form name (e.g. a collection title) into a URL segment.
///
/// Alphanumerics are lowercased and kept; every other run of characters
/// becomes a single dash. Leading and trailing dashes are dropped.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
