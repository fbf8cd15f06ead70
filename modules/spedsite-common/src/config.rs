use std::env;
use std::time::Duration;

use tracing::info;

use crate::error::SiteError;

pub const DEFAULT_ENRICHMENT_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_ENRICHMENT_MODEL: &str = "gemini-1.5-flash";

/// Service configuration loaded from environment variables.
/// Input and output paths come from the command line instead.
#[derive(Debug, Clone)]
pub struct Config {
    // Enrichment service
    pub enrichment_api_key: Option<String>,
    pub enrichment_base_url: String,
    pub enrichment_model: String,
    pub enrichment_timeout: Duration,
    pub enrichment_max_attempts: u32,

    // Pacing between districts
    pub inter_record_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enrichment_api_key: None,
            enrichment_base_url: DEFAULT_ENRICHMENT_BASE_URL.to_string(),
            enrichment_model: DEFAULT_ENRICHMENT_MODEL.to_string(),
            enrichment_timeout: Duration::from_secs(60),
            enrichment_max_attempts: 2,
            inter_record_delay: Duration::from_millis(1000),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, SiteError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SiteError> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout_secs: u64 = parse_or(&get, "ENRICHMENT_TIMEOUT_SECS", 60, NON_NEGATIVE)?;
        let max_attempts: u32 = parse_or(&get, "ENRICHMENT_MAX_ATTEMPTS", 2, POSITIVE)?;
        if max_attempts == 0 {
            return Err(SiteError::Config(format!(
                "ENRICHMENT_MAX_ATTEMPTS must be {POSITIVE}, got \"0\""
            )));
        }
        let delay_ms: u64 = parse_or(&get, "SPEDSITE_DELAY_MS", 1000, NON_NEGATIVE)?;

        Ok(Self {
            enrichment_api_key: get("ENRICHMENT_API_KEY"),
            enrichment_base_url: get("ENRICHMENT_BASE_URL")
                .unwrap_or(defaults.enrichment_base_url),
            enrichment_model: get("ENRICHMENT_MODEL").unwrap_or(defaults.enrichment_model),
            enrichment_timeout: Duration::from_secs(timeout_secs),
            enrichment_max_attempts: max_attempts,
            inter_record_delay: Duration::from_millis(delay_ms),
        })
    }

    /// Log the effective configuration with the API key masked.
    pub fn log_redacted(&self) {
        info!(
            enrichment_api_key = %redact(self.enrichment_api_key.as_deref()),
            enrichment_base_url = %self.enrichment_base_url,
            enrichment_model = %self.enrichment_model,
            enrichment_timeout_secs = self.enrichment_timeout.as_secs(),
            enrichment_max_attempts = self.enrichment_max_attempts,
            inter_record_delay_ms = self.inter_record_delay.as_millis() as u64,
            "Config loaded"
        );
    }
}

const NON_NEGATIVE: &str = "a non-negative integer";
const POSITIVE: &str = "an integer of at least 1";

fn parse_or<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
    expected: &str,
) -> Result<T, SiteError> {
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| SiteError::Config(format!("{key} must be {expected}, got {raw:?}"))),
        None => Ok(default),
    }
}

fn redact(secret: Option<&str>) -> String {
    match secret {
        None => "(unset)".to_string(),
        Some(s) if s.len() <= 8 => "****".to_string(),
        Some(s) => format!("{}****", s.chars().take(4).collect::<String>()),
    }
}
