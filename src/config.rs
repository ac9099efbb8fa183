//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file is sparse:
//! stock defaults are the base layer and the user file overrides any subset
//! of keys.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "spacetraveling"
//! lang = "pt-BR"
//! logo = "/images/logo.svg"
//! assets_dir = "assets"     # Copied to the output root when present
//!
//! [cms]
//! endpoint = "https://spacetraveling.cdn.prismic.io/api/v2"
//! document_type = "posts"
//! page_size = 1             # Posts per listing page (1-100)
//! revalidate_secs = 86400   # Reuse cached CMS responses younger than this
//!
//! [dates]
//! locale = "pt_BR"
//! pattern = "%d %b %Y"
//! edited_pattern = "* editado em %d %b %Y, às %H:%M"
//! utc_offset = "+00:00"
//!
//! [comments]
//! enabled = true
//! repo = "hitaloalvess/spacetraveling-blog-comments"
//! issue_term = "pathname"
//! theme = "github-dark"
//!
//! [colors]
//! background = "#1a1d23"
//! heading = "#f8f8f8"
//! body = "#d7d7d7"
//! info = "#bbbbbb"
//! highlight = "#ff57b2"
//! border = "#2c2f36"
//! ```
//!
//! The Prismic access token is a secret and is read from the
//! `PRISMIC_ACCESS_TOKEN` environment variable, never from this file.
//!
//! Unknown keys are rejected to catch typos early.

use chrono::format::{Item, StrftimeItems};
use chrono::{FixedOffset, Locale, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Longest accepted revalidation interval.
const MAX_REVALIDATE_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site identity and static assets.
    pub site: SiteSection,
    /// Where posts come from.
    pub cms: CmsConfig,
    /// How dates are displayed.
    pub dates: DatesConfig,
    /// Comment widget on post pages.
    pub comments: CommentsConfig,
    /// Color scheme.
    pub colors: ColorScheme,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = &self.cms.endpoint;
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(ConfigError::Validation(format!(
                "cms.endpoint must be an http(s) URL, got '{endpoint}'"
            )));
        }
        if self.cms.document_type.is_empty() {
            return Err(ConfigError::Validation(
                "cms.document_type must not be empty".into(),
            ));
        }
        if !(1..=100).contains(&self.cms.page_size) {
            return Err(ConfigError::Validation(
                "cms.page_size must be 1-100".into(),
            ));
        }
        if !(1..=MAX_REVALIDATE_SECS).contains(&self.cms.revalidate_secs) {
            return Err(ConfigError::Validation(
                "cms.revalidate_secs must be between 1 and 31536000 (one year)".into(),
            ));
        }
        self.dates.locale()?;
        self.dates.offset()?;
        for (key, pattern) in [
            ("dates.pattern", &self.dates.pattern),
            ("dates.edited_pattern", &self.dates.edited_pattern),
        ] {
            if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
                return Err(ConfigError::Validation(format!(
                    "{key} is not a valid date pattern: '{pattern}'"
                )));
            }
        }
        if self.comments.enabled {
            let valid_repo = matches!(
                self.comments.repo.split_once('/'),
                Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/')
            );
            if !valid_repo {
                return Err(ConfigError::Validation(format!(
                    "comments.repo must look like 'owner/name', got '{}'",
                    self.comments.repo
                )));
            }
        }
        Ok(())
    }
}

/// Site identity settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    /// Title of the listing page and suffix of post titles.
    pub title: String,
    /// `lang` attribute of every page.
    pub lang: String,
    /// Logo shown in the header, linking home.
    pub logo: String,
    /// Directory of static files copied verbatim to the output root.
    pub assets_dir: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            lang: "pt-BR".to_string(),
            logo: "/images/logo.svg".to_string(),
            assets_dir: "assets".to_string(),
        }
    }
}

/// Content repository settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CmsConfig {
    /// Prismic API root.
    pub endpoint: String,
    /// Custom type holding blog posts.
    pub document_type: String,
    /// Posts per listing page.
    pub page_size: u32,
    /// Cached responses younger than this many seconds are reused.
    pub revalidate_secs: u64,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://spacetraveling.cdn.prismic.io/api/v2".to_string(),
            document_type: "posts".to_string(),
            page_size: 1,
            revalidate_secs: 60 * 60 * 24,
        }
    }
}

impl CmsConfig {
    /// Age after which a cached CMS response is fetched again.
    pub fn revalidate(&self) -> TimeDelta {
        let secs = self.revalidate_secs.min(MAX_REVALIDATE_SECS);
        TimeDelta::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
    }
}

/// Date display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatesConfig {
    /// Locale for month names, e.g. `pt_BR`, `en_US`.
    pub locale: String,
    /// strftime pattern for publication dates.
    pub pattern: String,
    /// strftime pattern for the "edited" note on post pages.
    pub edited_pattern: String,
    /// Offset dates are displayed in, e.g. `-03:00`.
    pub utc_offset: String,
}

impl Default for DatesConfig {
    fn default() -> Self {
        Self {
            locale: "pt_BR".to_string(),
            pattern: "%d %b %Y".to_string(),
            edited_pattern: "* editado em %d %b %Y, às %H:%M".to_string(),
            utc_offset: "+00:00".to_string(),
        }
    }
}

impl DatesConfig {
    pub fn locale(&self) -> Result<Locale, ConfigError> {
        Locale::try_from(self.locale.as_str()).map_err(|_| {
            ConfigError::Validation(format!("dates.locale '{}' is not a known locale", self.locale))
        })
    }

    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        self.utc_offset.parse::<FixedOffset>().map_err(|_| {
            ConfigError::Validation(format!(
                "dates.utc_offset must look like '+00:00', got '{}'",
                self.utc_offset
            ))
        })
    }
}

/// utterances comment widget settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommentsConfig {
    pub enabled: bool,
    /// GitHub repository holding the comment issues, `owner/name`.
    pub repo: String,
    /// How a page is mapped to an issue (`pathname`, `url`, `title`, ...).
    pub issue_term: String,
    pub theme: String,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            repo: "hitaloalvess/spacetraveling-blog-comments".to_string(),
            issue_term: "pathname".to_string(),
            theme: "github-dark".to_string(),
        }
    }
}

/// Color scheme.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    /// Page background.
    pub background: String,
    /// Titles.
    pub heading: String,
    /// Body text.
    pub body: String,
    /// Dates, authors, reading time.
    pub info: String,
    /// Links and the load-more control.
    pub highlight: String,
    /// Separators.
    pub border: String,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            background: "#1a1d23".to_string(),
            heading: "#f8f8f8".to_string(),
            body: "#d7d7d7".to_string(),
            info: "#bbbbbb".to_string(),
            highlight: "#ff57b2".to_string(),
            border: "#2c2f36".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
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

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
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

/// Load config from the given file.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the stock defaults.
pub fn load_config(config_path: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(config_path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# spacetraveling Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# The Prismic access token is read from the PRISMIC_ACCESS_TOKEN
# environment variable. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
title = "spacetraveling"

# lang attribute of every generated page.
lang = "pt-BR"

# Header logo, linking back to the listing.
logo = "/images/logo.svg"

# Directory copied verbatim to the output root (logo, favicon, fonts).
assets_dir = "assets"

# ---------------------------------------------------------------------------
# Content repository (Prismic)
# ---------------------------------------------------------------------------
[cms]
endpoint = "https://spacetraveling.cdn.prismic.io/api/v2"

# Custom type holding the blog posts.
document_type = "posts"

# Posts per listing page; "Carregar mais posts" loads the next page.
page_size = 1

# CMS responses fetched less than this many seconds ago are reused by the
# next build (one day).
revalidate_secs = 86400

# ---------------------------------------------------------------------------
# Dates
# ---------------------------------------------------------------------------
[dates]
# Locale used for month names.
locale = "pt_BR"

# strftime patterns. %b is the abbreviated month name in the locale above.
pattern = "%d %b %Y"
edited_pattern = "* editado em %d %b %Y, às %H:%M"

# Offset from UTC that dates and times are shown in.
utc_offset = "+00:00"

# ---------------------------------------------------------------------------
# Comments (utterances)
# ---------------------------------------------------------------------------
[comments]
enabled = true

# GitHub repository where comment issues are opened.
repo = "hitaloalvess/spacetraveling-blog-comments"

# Post pages are matched to issues by their path.
issue_term = "pathname"
theme = "github-dark"

# ---------------------------------------------------------------------------
# Colors
# ---------------------------------------------------------------------------
[colors]
background = "#1a1d23"
heading = "#f8f8f8"
body = "#d7d7d7"
info = "#bbbbbb"        # Dates, authors, reading time
highlight = "#ff57b2"   # Links, load-more control
border = "#2c2f36"
"##
}

/// Generate CSS custom properties from the color scheme.
pub fn generate_color_css(colors: &ColorScheme) -> String {
    format!(
        r#":root {{
    --color-bg: {background};
    --color-heading: {heading};
    --color-body: {body};
    --color-info: {info};
    --color-highlight: {highlight};
    --color-border: {border};
}}"#,
        background = colors.background,
        heading = colors.heading,
        body = colors.body,
        info = colors.info,
        highlight = colors.highlight,
        border = colors.border,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_colors() {
        let config = SiteConfig::default();
        assert_eq!(config.colors.background, "#1a1d23");
        assert_eq!(config.colors.highlight, "#ff57b2");
    }

    #[test]
    fn default_config_has_cms_settings() {
        let config = SiteConfig::default();
        assert_eq!(config.cms.document_type, "posts");
        assert_eq!(config.cms.page_size, 1);
        assert_eq!(config.cms.revalidate_secs, 86400);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[colors]
background = "#000000"
"##;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        // Overridden value
        assert_eq!(config.colors.background, "#000000");
        // Default values preserved
        assert_eq!(config.colors.heading, "#f8f8f8");
        assert_eq!(config.cms.page_size, 1);
    }

    #[test]
    fn parse_cms_settings() {
        let toml = r#"
[cms]
endpoint = "https://myblog.cdn.prismic.io/api/v2"
page_size = 5
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.cms.endpoint, "https://myblog.cdn.prismic.io/api/v2");
        assert_eq!(config.cms.page_size, 5);
        // Unspecified defaults preserved
        assert_eq!(config.cms.document_type, "posts");
    }

    #[test]
    fn generate_css_uses_config_colors() {
        let colors = ColorScheme {
            background: "#f0f0f0".to_string(),
            ..ColorScheme::default()
        };
        let css = generate_color_css(&colors);
        assert!(css.contains("--color-bg: #f0f0f0"));
        assert!(css.contains("--color-highlight: #ff57b2"));
    }

    #[test]
    fn generate_css_includes_all_variables() {
        let css = generate_color_css(&ColorScheme::default());
        for var in [
            "--color-bg",
            "--color-heading",
            "--color-body",
            "--color-info",
            "--color-highlight",
            "--color-border",
        ] {
            assert!(css.contains(var), "missing {var}");
        }
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config.site.title, "spacetraveling");
        assert_eq!(config.dates.locale, "pt_BR");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
[site]
title = "my blog"

[dates]
locale = "en_US"
"#,
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.site.title, "my blog");
        assert_eq!(config.dates.locale, "en_US");
        // Unspecified values should be defaults
        assert_eq!(config.site.lang, "pt-BR");
        assert_eq!(config.dates.pattern, "%d %b %Y");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        fs::write(&config_path, "this is not valid toml [[[").unwrap();

        let result = load_config(&config_path);
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        fs::write(&config_path, "[cms]\npage_size = 0\n").unwrap();

        let result = load_config(&config_path);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn stock_config_parses_and_matches_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = SiteConfig::default();
        assert_eq!(config.cms.endpoint, defaults.cms.endpoint);
        assert_eq!(config.dates.edited_pattern, defaults.dates.edited_pattern);
        assert_eq!(config.comments.repo, defaults.comments.repo);
        assert_eq!(config.colors.border, defaults.colors.border);
        config.validate().unwrap();
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("page_size = 1").unwrap();
        let overlay: toml::Value = toml::from_str("page_size = 10").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("page_size").unwrap().as_integer(), Some(10));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[cms]
page_size = 1
document_type = "posts"
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[cms]
page_size = 3
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let cms = merged.get("cms").unwrap();
        assert_eq!(cms.get("page_size").unwrap().as_integer(), Some(3));
        // document_type preserved from base
        assert_eq!(cms.get("document_type").unwrap().as_str(), Some("posts"));
    }

    #[test]
    fn merge_toml_preserves_base_keys() {
        let base: toml::Value = toml::from_str(
            r#"
a = 1
b = 2
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(r#"a = 10"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("a").unwrap().as_integer(), Some(10));
        assert_eq!(merged.get("b").unwrap().as_integer(), Some(2));
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let toml_str = r#"
[cms]
pagesize = 2
"#;
        let result: Result<SiteConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("[cmz]\npage_size = 2\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        SiteConfig::default().validate().unwrap();
    }

    #[test]
    fn validate_page_size_bounds() {
        let mut config = SiteConfig::default();
        config.cms.page_size = 100;
        assert!(config.validate().is_ok());
        config.cms.page_size = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_revalidate_bounds() {
        let mut config = SiteConfig::default();
        config.cms.revalidate_secs = 0;
        assert!(config.validate().is_err());
        config.cms.revalidate_secs = MAX_REVALIDATE_SECS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn revalidate_interval_is_one_day_by_default() {
        assert_eq!(CmsConfig::default().revalidate(), TimeDelta::days(1));
    }

    #[test]
    fn validate_endpoint_scheme() {
        let mut config = SiteConfig::default();
        config.cms.endpoint = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_unknown_locale() {
        let mut config = SiteConfig::default();
        config.dates.locale = "xx_YY".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_bad_date_pattern() {
        let mut config = SiteConfig::default();
        config.dates.pattern = "%Q %d".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_bad_offset() {
        let mut config = SiteConfig::default();
        config.dates.utc_offset = "Brasilia".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn offset_parses() {
        let dates = DatesConfig {
            utc_offset: "-03:00".to_string(),
            ..DatesConfig::default()
        };
        assert_eq!(dates.offset().unwrap().local_minus_utc(), -3 * 3600);
    }

    #[test]
    fn validate_comment_repo_shape() {
        let mut config = SiteConfig::default();
        config.comments.repo = "no-slash".to_string();
        assert!(config.validate().is_err());
        config.comments.enabled = false;
        assert!(config.validate().is_ok());
    }
}
