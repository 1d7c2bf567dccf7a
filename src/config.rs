//! Runtime settings read from the environment (and `.env`).

use crate::error::{PriceHubError, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_STORE_PATH: &str = "pricehub.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub naver_client_id: Option<String>,
    pub naver_client_secret: Option<String>,
    pub store_path: PathBuf,
    /// Delay between two cards of a collection run.
    pub pacing: Duration,
    /// Delay between two storefront pages (one page per expansion).
    pub expansion_pacing: Duration,
    pub request_timeout: Duration,
    pub naver_display: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            naver_client_id: None,
            naver_client_secret: None,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            pacing: Duration::from_millis(300),
            expansion_pacing: Duration::from_millis(2000),
            request_timeout: Duration::from_secs(30),
            naver_display: 20,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        let defaults = Config::default();

        Ok(Config {
            naver_client_id: non_empty_var("NAVER_CLIENT_ID"),
            naver_client_secret: non_empty_var("NAVER_CLIENT_SECRET"),
            store_path: non_empty_var("PRICEHUB_STORE")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            pacing: parse_var("PRICEHUB_PACING_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.pacing),
            expansion_pacing: parse_var("PRICEHUB_EXPANSION_PACING_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.expansion_pacing),
            request_timeout: parse_var("PRICEHUB_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            naver_display: match parse_var("NAVER_DISPLAY")? {
                Some(n) => narrow("NAVER_DISPLAY", n)?,
                None => defaults.naver_display,
            },
        })
    }

    /// Naver credentials, required only by the shopping-search collection runs.
    pub fn naver_credentials(&self) -> Result<(&str, &str)> {
        match (&self.naver_client_id, &self.naver_client_secret) {
            (Some(id), Some(secret)) => Ok((id.as_str(), secret.as_str())),
            _ => Err(PriceHubError::Config(
                "NAVER_CLIENT_ID and NAVER_CLIENT_SECRET must be set".to_string(),
            )),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var(key: &str) -> Result<Option<u64>> {
    match non_empty_var(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| PriceHubError::Config(format!("{} must be a number, got {:?}", key, raw))),
        None => Ok(None),
    }
}

fn narrow(key: &str, value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| PriceHubError::Config(format!("{} is out of range: {}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_collection_pacing() {
        let config = Config::default();
        assert_eq!(config.pacing, Duration::from_millis(300));
        assert_eq!(config.expansion_pacing, Duration::from_secs(2));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.naver_display, 20);
    }

    #[test]
    fn credentials_missing_is_config_error() {
        let config = Config::default();
        match config.naver_credentials() {
            Err(PriceHubError::Config(_)) => {}
            other => panic!("Expected PriceHubError::Config, got: {other:?}"),
        }
    }

    #[test]
    fn oversized_display_is_config_error() {
        assert_eq!(narrow("NAVER_DISPLAY", 100).unwrap(), 100);
        match narrow("NAVER_DISPLAY", u64::from(u32::MAX) + 1) {
            Err(PriceHubError::Config(message)) => assert!(message.contains("NAVER_DISPLAY")),
            other => panic!("Expected PriceHubError::Config, got: {other:?}"),
        }
    }

    #[test]
    fn credentials_present() {
        let config = Config {
            naver_client_id: Some("id".to_string()),
            naver_client_secret: Some("secret".to_string()),
            ..Config::default()
        };
        assert_eq!(config.naver_credentials().unwrap(), ("id", "secret"));
    }
}
