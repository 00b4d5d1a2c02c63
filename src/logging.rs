use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

use crate::errors::ConfigError;

/// Where events go besides stderr.
#[derive(Debug, Clone, PartialEq)]
pub enum LogSink {
    Console,
    Loki(Url),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub sink: LogSink,
    pub service_name: String,
    pub environment: String,
    pub log_level: String,
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let loki_enabled = lookup("LOKI_ENABLED")
            .map(|raw| raw.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let sink = match (loki_enabled, lookup("LOKI_URL")) {
            (false, _) => LogSink::Console,
            (true, None) => {
                return Err(ConfigError::Invalid {
                    name: "LOKI_URL",
                    reason: "must be set when LOKI_ENABLED is true".to_string(),
                })
            }
            (true, Some(raw)) => LogSink::Loki(Url::parse(&raw).map_err(|e| {
                ConfigError::Invalid {
                    name: "LOKI_URL",
                    reason: e.to_string(),
                }
            })?),
        };

        Ok(Self {
            sink,
            service_name: lookup("SERVICE_NAME").unwrap_or_else(|| "stock-admin".to_string()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // stdout carries the rendered table, logs go to stderr.
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::new(&config.log_level))
        .with(fmt_layer);

    match config.sink {
        LogSink::Console => registry.try_init()?,
        #[cfg(feature = "loki")]
        LogSink::Loki(url) => {
            let (loki_layer, task) = tracing_loki::builder()
                .label("service", &config.service_name)?
                .label("environment", &config.environment)?
                .build_url(url.clone())?;
            tokio::spawn(task);
            registry.with(loki_layer).try_init()?;
            tracing::info!("Shipping logs to Loki at {}", url);
        }
        #[cfg(not(feature = "loki"))]
        LogSink::Loki(url) => {
            registry.try_init()?;
            tracing::warn!("Built without the loki feature, not shipping logs to {}", url);
        }
    }
    Ok(())
}
