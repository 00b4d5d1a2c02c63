use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use url::Url;

use crate::errors::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
/// en-US short date, e.g. `1/31/2024`.
pub const DEFAULT_DATE_FORMAT: &str = "%-m/%-d/%Y";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub token: Option<String>,
    pub timeout: Duration,
    pub page_limit: u32,
    pub date_format: String,
}

impl ClientConfig {
    /// Config for `base_url` with every other setting at its default.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            token: None,
            timeout: Duration::from_secs(30),
            page_limit: 100,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source. Unset variables fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_base_url = lookup("API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&raw_base_url).map_err(|e| ConfigError::Invalid {
            name: "API_BASE_URL",
            reason: e.to_string(),
        })?;
        let defaults = Self::new(base_url);

        let token = lookup("API_TOKEN").filter(|t| !t.trim().is_empty());

        let timeout = match lookup("API_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number("API_TIMEOUT_SECS", &raw)?),
            None => defaults.timeout,
        };

        let page_limit = match lookup("STOCKS_PAGE_LIMIT") {
            Some(raw) => parse_number("STOCKS_PAGE_LIMIT", &raw)?,
            None => defaults.page_limit,
        };
        if page_limit == 0 {
            return Err(ConfigError::Invalid {
                name: "STOCKS_PAGE_LIMIT",
                reason: "must be at least 1".to_string(),
            });
        }

        let date_format = lookup("DATE_DISPLAY_FORMAT").unwrap_or(defaults.date_format);
        validate_date_format(&date_format)?;

        Ok(Self {
            base_url: defaults.base_url,
            token,
            timeout,
            page_limit,
            date_format,
        })
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

// chrono panics when displaying a format with a bad specifier, so reject it up front.
fn validate_date_format(format: &str) -> Result<(), ConfigError> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::Invalid {
            name: "DATE_DISPLAY_FORMAT",
            reason: format!("unsupported format string '{}'", format),
        });
    }
    Ok(())
}
