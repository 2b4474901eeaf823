//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Configuration is
//! layered: stock defaults, then the user's `config.toml` at the content
//! root, then command-line overrides (`--url`, `--baseurl`).
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! url = ""                  # Scheme + host, no trailing slash
//! baseurl = ""              # Path prefix, "" or "/something"
//! title = "Posts"           # Site title (also available as {{ site.title }})
//!
//! [build]
//! drafts = false            # Include documents with `published: false`
//! duplicates = "keep"       # keep | first
//!
//! [processing]
//! max_processes = 4         # Max parallel render workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown top-level keys are ignored so that an existing blog config with
//! extra settings still loads. Unknown keys inside `[build]` and
//! `[processing]` are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Absolute site URL without a trailing slash (e.g. `https://example.github.io`).
    pub url: String,
    /// Path prefix the site is served under (e.g. `/blog`), or empty.
    pub baseurl: String,
    /// Site title shown on the global index and in page titles.
    pub title: String,
    /// Content selection settings.
    pub build: BuildConfig,
    /// Parallel rendering settings.
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            baseurl: String::new(),
            title: "Posts".to_string(),
            build: BuildConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.baseurl.is_empty() && !self.baseurl.starts_with('/') {
            return Err(ConfigError::Validation(
                "baseurl must be empty or start with '/'".into(),
            ));
        }
        if self.baseurl.ends_with('/') {
            return Err(ConfigError::Validation(
                "baseurl must not end with '/'".into(),
            ));
        }
        if self.url.ends_with('/') {
            return Err(ConfigError::Validation("url must not end with '/'".into()));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The read-only substitution mapping handed to the renderer.
    pub fn vars(&self) -> SiteVars {
        SiteVars {
            url: self.url.clone(),
            baseurl: self.baseurl.clone(),
            title: self.title.clone(),
        }
    }
}

/// Values that `{{ site.* }}` directives resolve against.
///
/// Built once per build from [`SiteConfig`] and shared immutably across
/// render workers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteVars {
    pub url: String,
    pub baseurl: String,
    pub title: String,
}

impl SiteVars {
    /// Look up a `site.*` variable by its dotted name.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "site.url" => Some(&self.url),
            "site.baseurl" => Some(&self.baseurl),
            "site.title" => Some(&self.title),
            _ => None,
        }
    }

    /// `path` prefixed with the baseurl (Jekyll's `relative_url`).
    pub fn relative_url(&self, path: &str) -> String {
        join_url(&self.baseurl, path)
    }

    /// `path` prefixed with url + baseurl (Jekyll's `absolute_url`).
    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{}", self.url, self.relative_url(path))
    }
}

fn join_url(prefix: &str, path: &str) -> String {
    if path.is_empty() {
        return prefix.to_string();
    }
    if path.starts_with('/') {
        format!("{prefix}{path}")
    } else {
        format!("{prefix}/{path}")
    }
}

/// How to treat near-duplicate documents (same collection, same title).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Keep every document as an independent page.
    #[default]
    Keep,
    /// Keep the document with the smallest identity, drop the rest.
    First,
}

/// Content selection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Include documents whose front matter says `published: false`.
    pub drafts: bool,
    /// Near-duplicate handling.
    pub duplicates: DuplicatePolicy,
}

/// Parallel rendering settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel render workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory on top of stock defaults.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    load_config_with_overrides(root, None)
}

/// Load config with a final overlay (command-line overrides) applied last.
pub fn load_config_with_overrides(
    root: &Path,
    overrides: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let mut base = stock_defaults_value()?;
    if let Some(user) = load_raw_config(root)? {
        base = merge_toml(base, user);
    }
    resolve_config(base, overrides)
}

/// Build the command-line overlay table from optional `--url` / `--baseurl` flags.
pub fn cli_overrides(url: Option<&str>, baseurl: Option<&str>) -> Option<toml::Value> {
    let mut table = toml::Table::new();
    if let Some(url) = url {
        table.insert("url".into(), toml::Value::String(url.to_string()));
    }
    if let Some(baseurl) = baseurl {
        table.insert("baseurl".into(), toml::Value::String(baseurl.to_string()));
    }
    (!table.is_empty()).then_some(toml::Value::Table(table))
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Posts Configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file at the root of the content directory.

# Scheme and host of the published site, without a trailing slash.
# Substituted for {{ site.url }} and used by the absolute_url filter.
url = ""

# Path prefix the site is served under, e.g. "/blog". Empty for the root.
# Substituted for {{ site.baseurl }} and used by the relative_url filter.
baseurl = ""

# Site title, shown on the home page. Available as {{ site.title }}.
title = "Posts"

# ---------------------------------------------------------------------------
# Content selection
# ---------------------------------------------------------------------------
[build]
# Include documents whose front matter has `published: false`.
drafts = false

# Documents in the same collection with the same title:
#   "keep"  - publish all of them as independent pages
#   "first" - publish only the one with the smallest source path
duplicates = "keep"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel render workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = SiteConfig::default();
        assert_eq!(config.url, "");
        assert_eq!(config.baseurl, "");
        assert_eq!(config.title, "Posts");
        assert!(!config.build.drafts);
        assert_eq!(config.build.duplicates, DuplicatePolicy::Keep);
    }

    #[test]
    fn parse_partial_config() {
        let config: SiteConfig = toml::from_str(r#"baseurl = "/blog""#).unwrap();
        assert_eq!(config.baseurl, "/blog");
        // Defaults preserved
        assert_eq!(config.title, "Posts");
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn unknown_top_level_keys_ignored() {
        let config: SiteConfig = toml::from_str(
            r#"
url = "https://example.org"
markdown = "kramdown"
theme = "minima"
"#,
        )
        .unwrap();
        assert_eq!(config.url, "https://example.org");
    }

    #[test]
    fn unknown_build_key_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str(
            r#"
[build]
draft = true
"#,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn parse_duplicate_policy() {
        let config: SiteConfig = toml::from_str(
            r#"
[build]
duplicates = "first"
"#,
        )
        .unwrap();
        assert_eq!(config.build.duplicates, DuplicatePolicy::First);
    }

    #[test]
    fn invalid_duplicate_policy_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str(
            r#"
[build]
duplicates = "merge"
"#,
        );
        assert!(result.is_err());
    }

    // =========================================================================
    // SiteVars tests
    // =========================================================================

    fn vars() -> SiteVars {
        SiteVars {
            url: "https://example.github.io".to_string(),
            baseurl: "/blog".to_string(),
            title: "Notes".to_string(),
        }
    }

    #[test]
    fn vars_lookup_known_names() {
        let v = vars();
        assert_eq!(v.lookup("site.url"), Some("https://example.github.io"));
        assert_eq!(v.lookup("site.baseurl"), Some("/blog"));
        assert_eq!(v.lookup("site.title"), Some("Notes"));
    }

    #[test]
    fn vars_lookup_unknown_name() {
        assert_eq!(vars().lookup("site.author"), None);
        assert_eq!(vars().lookup("page.title"), None);
    }

    #[test]
    fn relative_url_joins_slashes() {
        let v = vars();
        assert_eq!(v.relative_url("/assets/a.png"), "/blog/assets/a.png");
        assert_eq!(v.relative_url("assets/a.png"), "/blog/assets/a.png");
        assert_eq!(v.relative_url(""), "/blog");
    }

    #[test]
    fn absolute_url_includes_host() {
        assert_eq!(
            vars().absolute_url("/assets/a.png"),
            "https://example.github.io/blog/assets/a.png"
        );
    }

    #[test]
    fn relative_url_with_empty_baseurl() {
        let v = SiteVars::default();
        assert_eq!(v.relative_url("/x.png"), "/x.png");
    }

    #[test]
    fn vars_built_from_config() {
        let mut config = SiteConfig::default();
        config.url = "https://a.b".to_string();
        config.baseurl = "/c".to_string();
        let v = config.vars();
        assert_eq!(v.url, "https://a.b");
        assert_eq!(v.baseurl, "/c");
        assert_eq!(v.title, "Posts");
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.title, "Posts");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
url = "https://example.github.io"
baseurl = "/ml-api"
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.url, "https://example.github.io");
        assert_eq!(config.baseurl, "/ml-api");
        assert_eq!(config.title, "Posts");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "this is not valid toml [[[").unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn cli_overrides_win_over_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), r#"baseurl = "/from-file""#).unwrap();

        let overrides = cli_overrides(None, Some("/from-cli"));
        let config = load_config_with_overrides(tmp.path(), overrides).unwrap();
        assert_eq!(config.baseurl, "/from-cli");
    }

    #[test]
    fn cli_overrides_empty_is_none() {
        assert!(cli_overrides(None, None).is_none());
    }

    #[test]
    fn cli_overrides_builds_table() {
        let value = cli_overrides(Some("https://x.y"), None).unwrap();
        assert_eq!(value.get("url").unwrap().as_str(), Some("https://x.y"));
        assert!(value.get("baseurl").is_none());
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"title = "a""#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"title = "b""#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("title").unwrap().as_str(), Some("b"));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[build]
drafts = false
duplicates = "keep"
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[build]
drafts = true
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let build = merged.get("build").unwrap();
        assert_eq!(build.get("drafts").unwrap().as_bool(), Some(true));
        assert_eq!(build.get("duplicates").unwrap().as_str(), Some("keep"));
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_baseurl_needs_leading_slash() {
        let mut config = SiteConfig::default();
        config.baseurl = "blog".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("baseurl"));
    }

    #[test]
    fn validate_baseurl_trailing_slash() {
        let mut config = SiteConfig::default();
        config.baseurl = "/blog/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_url_trailing_slash() {
        let mut config = SiteConfig::default();
        config.url = "https://example.org/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_zero_processes() {
        let mut config = SiteConfig::default();
        config.processing.max_processes = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), r#"baseurl = "nope""#).unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // Processing config tests
    // =========================================================================

    #[test]
    fn effective_threads_clamped_to_cores() {
        let config = ProcessingConfig {
            max_processes: Some(99999),
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    // =========================================================================
    // stock config tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config.title, "Posts");
        assert_eq!(config.build.duplicates, DuplicatePolicy::Keep);
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value().unwrap();
        assert!(val.is_table());
        assert!(val.get("build").is_some());
        assert!(val.get("processing").is_some());
        assert!(val.get("title").is_some());
    }
}
