//! Reader configuration

use std::env;
use std::time::Duration;

use url::Url;

use crate::defaults;
use crate::reader::ObservationBand;
use crate::utils::{ReaderError, Result};

/// Tunables for the reading session controller and its API adapter
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Base URL of the REST backend (trailing slash significant)
    pub api_base_url: Url,
    /// Chrome auto-hide delay
    pub hide_delay: Duration,
    /// Scroll distance that hides chrome immediately
    pub scroll_hide_threshold_px: f64,
    /// Layout settle delay before deep-link restoration
    pub deep_link_settle: Duration,
    /// Viewport band used for visibility tracking
    pub band: ObservationBand,
    /// Session storage key prefix for external chapter context
    pub context_storage_prefix: String,
}

impl ReaderConfig {
    /// Built-in defaults
    pub fn new() -> Result<Self> {
        let api_base_url = Url::parse(defaults::API_BASE_URL)
            .map_err(|e| ReaderError::Config(format!("default API URL: {}", e)))?;
        Ok(Self {
            api_base_url,
            hide_delay: Duration::from_millis(defaults::HIDE_DELAY_MS),
            scroll_hide_threshold_px: defaults::SCROLL_HIDE_THRESHOLD_PX,
            deep_link_settle: Duration::from_millis(defaults::DEEP_LINK_SETTLE_MS),
            band: ObservationBand::default(),
            context_storage_prefix: defaults::CONTEXT_STORAGE_PREFIX.to_string(),
        })
    }

    /// Defaults overridden by `READER_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::new()?;

        if let Some(raw) = lookup("READER_API_URL") {
            let mut url = Url::parse(raw.trim())
                .map_err(|e| ReaderError::Config(format!("READER_API_URL: {}", e)))?;
            if !url.path().ends_with('/') {
                let path = format!("{}/", url.path());
                url.set_path(&path);
            }
            config.api_base_url = url;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "READER_HIDE_DELAY_MS")? {
            config.hide_delay = Duration::from_millis(ms);
        }
        if let Some(px) = parse_var::<f64>(&lookup, "READER_SCROLL_THRESHOLD_PX")? {
            if !px.is_finite() || px < 0.0 {
                return Err(ReaderError::Config(format!(
                    "READER_SCROLL_THRESHOLD_PX must be a non-negative number, got {}",
                    px
                )));
            }
            config.scroll_hide_threshold_px = px;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "READER_SETTLE_MS")? {
            config.deep_link_settle = Duration::from_millis(ms);
        }
        if let Some(prefix) = lookup("READER_CONTEXT_PREFIX") {
            let prefix = prefix.trim();
            if prefix.is_empty() {
                return Err(ReaderError::Config("READER_CONTEXT_PREFIX is empty".into()));
            }
            config.context_storage_prefix = prefix.to_string();
        }

        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ReaderError::Config(format!("{}: {}", key, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ReaderConfig::new().unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://localhost:8080/api/");
        assert_eq!(config.hide_delay, Duration::from_millis(2000));
        assert_eq!(config.deep_link_settle, Duration::from_millis(100));
        assert_eq!(config.scroll_hide_threshold_px, 5.0);
        assert_eq!(config.context_storage_prefix, "external-chapter");
        assert!(config.api_base_url.path().ends_with('/'));
    }

    #[test]
    fn test_overrides() {
        let config = ReaderConfig::from_lookup(lookup(&[
            ("READER_API_URL", "https://api.example.com/v2"),
            ("READER_HIDE_DELAY_MS", "3500"),
            ("READER_SCROLL_THRESHOLD_PX", "12.5"),
            ("READER_SETTLE_MS", "250"),
            ("READER_CONTEXT_PREFIX", "ctx"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url.as_str(), "https://api.example.com/v2/");
        assert_eq!(config.hide_delay, Duration::from_millis(3500));
        assert_eq!(config.scroll_hide_threshold_px, 12.5);
        assert_eq!(config.deep_link_settle, Duration::from_millis(250));
        assert_eq!(config.context_storage_prefix, "ctx");
    }

    #[test]
    fn test_malformed_values() {
        for pairs in [
            [("READER_HIDE_DELAY_MS", "soon")],
            [("READER_API_URL", "not a url")],
            [("READER_SCROLL_THRESHOLD_PX", "-1")],
            [("READER_CONTEXT_PREFIX", "  ")],
        ] {
            assert!(matches!(
                ReaderConfig::from_lookup(lookup(&pairs)),
                Err(ReaderError::Config(_))
            ));
        }
    }
}
